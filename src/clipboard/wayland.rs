use anyhow::{Context, Result, anyhow};
use std::env;
use std::process::Command;
use std::time::Duration;

use super::backend::{ClipboardBackend, WatchMode, Wakeup, Waker};
use super::process;
use super::watch::ChangeWatcher;
use crate::models::{FormatAttempt, wayland_formats};
use crate::monitor::StopSignal;

const CLEAR_TIMEOUT: Duration = Duration::from_secs(2);

/// Wayland clipboard backend using wl-clipboard tools
/// Requires wl-paste and wl-copy to be installed
/// Event driven: a `wl-paste --watch` child reports selection changes
pub struct WaylandBackend {
    watcher: Option<ChangeWatcher>,
}

impl WaylandBackend {
    /// Create a new Wayland clipboard backend
    pub fn new() -> Result<Self> {
        if env::var("WAYLAND_DISPLAY").map(|d| d.is_empty()).unwrap_or(true) {
            return Err(anyhow!("WAYLAND_DISPLAY is not set, no Wayland session available"));
        }

        // Verify wl-copy is available
        process::probe_tool("wl-copy", "--version")
            .context("wl-copy not found. Install wl-clipboard package")?;
        process::probe_tool("wl-paste", "--version")
            .context("wl-paste not found. Install wl-clipboard package")?;

        log::debug!("WaylandBackend initialized successfully");
        Ok(WaylandBackend { watcher: None })
    }

    /// Start the change watcher
    /// Called lazily so one-shot uses (snapshot, clear) don't spawn it
    fn watcher(&mut self) -> Result<&ChangeWatcher> {
        if self.watcher.is_none() {
            self.watcher = Some(ChangeWatcher::spawn()?);
        }
        self.watcher
            .as_ref()
            .ok_or_else(|| anyhow!("clipboard watcher not running"))
    }

    /// Spawn the watcher up front so start-up failures surface immediately
    pub fn with_watcher(mut self) -> Result<Self> {
        self.watcher()?;
        Ok(self)
    }
}

impl ClipboardBackend for WaylandBackend {
    fn name(&self) -> &'static str {
        "Wayland"
    }

    fn mode(&self) -> WatchMode {
        WatchMode::EventDriven
    }

    fn default_formats(&self) -> Vec<FormatAttempt> {
        wayland_formats()
    }

    fn attempt_read(&mut self, format: &FormatAttempt, timeout: Duration) -> Result<Vec<u8>> {
        let mut command = Command::new("wl-paste");
        command.arg("--type").arg(&format.id);
        if !format.binary {
            command.arg("--no-newline");
        }
        process::read_output(command, timeout)
    }

    fn offered_formats(&mut self, timeout: Duration) -> Result<Vec<String>> {
        let mut command = Command::new("wl-paste");
        command.arg("--list-types");
        let output = process::read_output(command, timeout)?;
        Ok(super::x11::parse_targets(&output))
    }

    fn wait_for_change(&mut self, _interval: Duration, stop: &StopSignal) -> Result<Wakeup> {
        if stop.is_raised() {
            return Ok(Wakeup::Stopped);
        }
        Ok(self.watcher()?.next())
    }

    fn waker(&self) -> Option<Waker> {
        let sender = self.watcher.as_ref()?.sender();
        Some(Box::new(move |wakeup| {
            let _ = sender.send(wakeup);
        }))
    }

    fn clear(&mut self) -> Result<()> {
        let mut command = Command::new("wl-copy");
        command.arg("--clear");
        process::write_input(command, b"", CLEAR_TIMEOUT)
            .context("Failed to clear Wayland clipboard")?;
        log::debug!("Cleared Wayland clipboard");
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.shutdown();
        }
    }
}
