use anyhow::{Context, Result, anyhow};
use std::env;
use std::process::Command;
use std::time::Duration;

use super::backend::{ClipboardBackend, WatchMode, Wakeup, poll_tick};
use super::process;
use crate::models::{FormatAttempt, x11_formats};
use crate::monitor::StopSignal;

/// Owning the selection with empty input must not take long, xclip forks
/// into the background right after reading stdin
const CLEAR_TIMEOUT: Duration = Duration::from_secs(2);

/// X11 clipboard backend using xclip
/// Polls the CLIPBOARD selection; X11 has no change notification without
/// the XFixes extension
pub struct X11Backend {
    display: String,
}

impl X11Backend {
    /// Create a new X11 clipboard backend
    /// Fails when no display is configured or xclip is missing
    pub fn new() -> Result<Self> {
        let display = env::var("DISPLAY")
            .ok()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| anyhow!("DISPLAY is not set, no X11 session available"))?;

        process::probe_tool("xclip", "-version")
            .context("xclip not found. Install the xclip package")?;

        log::debug!("X11Backend initialized for display {}", display);
        Ok(X11Backend { display })
    }

    fn xclip(&self) -> Command {
        let mut command = Command::new("xclip");
        command.env("DISPLAY", &self.display).arg("-selection").arg("clipboard");
        command
    }
}

impl ClipboardBackend for X11Backend {
    fn name(&self) -> &'static str {
        "X11"
    }

    fn mode(&self) -> WatchMode {
        WatchMode::Polling
    }

    fn default_formats(&self) -> Vec<FormatAttempt> {
        x11_formats()
    }

    fn attempt_read(&mut self, format: &FormatAttempt, timeout: Duration) -> Result<Vec<u8>> {
        let mut command = self.xclip();
        command.arg("-target").arg(&format.id).arg("-out");
        process::read_output(command, timeout)
    }

    fn offered_formats(&mut self, timeout: Duration) -> Result<Vec<String>> {
        let mut command = self.xclip();
        command.arg("-target").arg("TARGETS").arg("-out");
        let output = process::read_output(command, timeout)?;
        Ok(parse_targets(&output))
    }

    fn wait_for_change(&mut self, interval: Duration, stop: &StopSignal) -> Result<Wakeup> {
        Ok(poll_tick(interval, stop))
    }

    fn clear(&mut self) -> Result<()> {
        let mut command = self.xclip();
        command.arg("-in");
        process::write_input(command, b"", CLEAR_TIMEOUT).context("Failed to clear X11 clipboard")?;
        log::debug!("Cleared X11 clipboard");
        Ok(())
    }
}

/// Parse the newline separated output of a TARGETS request
pub(crate) fn parse_targets(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
