use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::backend::Wakeup;

/// Clipboard change watcher backed by `wl-paste --watch echo`
/// wl-paste runs `echo` once per selection change; every line it prints on
/// our pipe is one change signal
pub struct ChangeWatcher {
    child: Child,
    events: Receiver<Wakeup>,
    sender: Sender<Wakeup>,
}

impl ChangeWatcher {
    /// Start watching clipboard for changes
    /// Spawns `wl-paste --watch echo` with its stdout piped back to us
    pub fn spawn() -> Result<Self> {
        log::info!("Starting Wayland clipboard watcher");

        let mut child = Command::new("wl-paste")
            .arg("--watch")
            .arg("echo")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn clipboard watcher")?;

        let stdout = child
            .stdout
            .take()
            .context("Clipboard watcher has no stdout pipe")?;

        let (sender, events) = mpsc::channel();
        let line_sender = sender.clone();

        thread::Builder::new()
            .name("clipmon-wl-watch".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    if line.is_err() || line_sender.send(Wakeup::Changed).is_err() {
                        break;
                    }
                }
                // EOF: wl-paste exited or was killed
                let _ = line_sender.send(Wakeup::Closed);
            })
            .context("Failed to start clipboard watcher thread")?;

        log::info!("Wayland clipboard watcher started (pid {})", child.id());
        Ok(ChangeWatcher {
            child,
            events,
            sender,
        })
    }

    /// Block until the next change, stop request or watcher exit
    pub fn next(&self) -> Wakeup {
        next_wakeup(&self.events)
    }

    /// Sender that can inject a wakeup into `next` from another thread
    pub fn sender(&self) -> Sender<Wakeup> {
        self.sender.clone()
    }

    /// Kill the wl-paste process
    pub fn shutdown(&mut self) {
        if let Err(e) = self.child.kill() {
            log::debug!("Clipboard watcher already exited: {}", e);
        }
        let _ = self.child.wait();
        log::info!("Wayland clipboard watcher stopped");
    }
}

/// Wait for one wakeup, then fold the queued ones into it
///
/// One copy often arrives as a burst of offers, so queued Changed and Tick
/// signals collapse into the first. Stopped and Closed are never swallowed.
/// A disconnected channel reads as Closed.
pub(crate) fn next_wakeup(events: &Receiver<Wakeup>) -> Wakeup {
    let mut wakeup = events.recv().unwrap_or(Wakeup::Closed);
    if matches!(wakeup, Wakeup::Stopped | Wakeup::Closed) {
        return wakeup;
    }

    while let Ok(next) = events.try_recv() {
        match next {
            Wakeup::Changed | Wakeup::Tick => {}
            other => {
                wakeup = other;
                break;
            }
        }
    }
    wakeup
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_of_changes_is_one_wakeup() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            tx.send(Wakeup::Changed).unwrap();
        }

        assert_eq!(next_wakeup(&rx), Wakeup::Changed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_behind_changes_is_kept() {
        let (tx, rx) = mpsc::channel();
        tx.send(Wakeup::Changed).unwrap();
        tx.send(Wakeup::Changed).unwrap();
        tx.send(Wakeup::Stopped).unwrap();

        assert_eq!(next_wakeup(&rx), Wakeup::Stopped);
    }

    #[test]
    fn test_closed_after_changes_is_kept() {
        let (tx, rx) = mpsc::channel();
        tx.send(Wakeup::Changed).unwrap();
        tx.send(Wakeup::Closed).unwrap();

        assert_eq!(next_wakeup(&rx), Wakeup::Closed);
    }

    #[test]
    fn test_stop_first_leaves_queue_alone() {
        let (tx, rx) = mpsc::channel();
        tx.send(Wakeup::Stopped).unwrap();
        tx.send(Wakeup::Changed).unwrap();

        assert_eq!(next_wakeup(&rx), Wakeup::Stopped);
        assert_eq!(rx.try_recv(), Ok(Wakeup::Changed));
    }

    #[test]
    fn test_disconnected_channel_is_closed() {
        let (tx, rx) = mpsc::channel::<Wakeup>();
        drop(tx);

        assert_eq!(next_wakeup(&rx), Wakeup::Closed);
    }
}
