use anyhow::{Context, Result, anyhow, bail};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is checked for exit
const POLL_STEP: Duration = Duration::from_millis(1);

/// Run a clipboard tool and collect its stdout, killing it after `timeout`
/// A non-zero exit status is an error (the tool found nothing to paste)
pub fn read_output(mut command: Command, timeout: Duration) -> Result<Vec<u8>> {
    let program = program_name(&command);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("{} has no stdout pipe", program))?;

    // Drain stdout on a helper thread so a large payload can't fill the pipe
    // while we wait for the child to exit
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = stdout.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send(result);
    });

    let deadline = Instant::now() + timeout;
    let status = wait_until(&mut child, deadline)
        .with_context(|| format!("{} did not answer within {:?}", program, timeout))?;

    let remaining = deadline.saturating_duration_since(Instant::now()).max(POLL_STEP);
    let output = rx
        .recv_timeout(remaining)
        .map_err(|_| anyhow!("{} output was not closed within {:?}", program, timeout))?
        .with_context(|| format!("Failed to read output of {}", program))?;

    if !status.success() {
        bail!("{} failed with status: {}", program, status);
    }

    Ok(output)
}

/// Run a clipboard tool, writing `input` to its stdin
pub fn write_input(mut command: Command, input: &[u8], timeout: Duration) -> Result<()> {
    let program = program_name(&command);

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input)
            .with_context(|| format!("Failed to write to {} stdin", program))?;
    }

    let status = wait_until(&mut child, Instant::now() + timeout)
        .with_context(|| format!("{} did not finish within {:?}", program, timeout))?;

    if !status.success() {
        bail!("{} failed with status: {}", program, status);
    }

    Ok(())
}

/// Check that a tool can be executed at all
pub fn probe_tool(program: &str, arg: &str) -> Result<()> {
    Command::new(program)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("{} not found", program))?;
    Ok(())
}

fn wait_until(child: &mut Child, deadline: Instant) -> Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("timed out");
        }

        thread::sleep(POLL_STEP);
    }
}

fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}
