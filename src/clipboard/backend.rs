use anyhow::Result;
use std::time::Duration;

use crate::models::FormatAttempt;
use crate::monitor::StopSignal;

/// How a backend learns that the clipboard may have changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Re-read the clipboard every poll interval
    Polling,
    /// Block until the platform reports a change
    EventDriven,
}

/// Why `wait_for_change` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// Poll interval elapsed
    Tick,
    /// The platform reported a clipboard change
    Changed,
    /// Stop was requested
    Stopped,
    /// The change source went away
    Closed,
}

/// Unblocks a pending `wait_for_change` from another thread, making it
/// return the given wakeup
pub type Waker = Box<dyn Fn(Wakeup) + Send + Sync>;

/// Trait for clipboard backend abstraction
/// Supports different clipboard systems (Wayland, X11)
/// The monitor loop owns one backend for its whole run and only talks to the
/// platform through it
pub trait ClipboardBackend: Send {
    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Whether this backend polls or waits for platform events
    fn mode(&self) -> WatchMode;

    /// Format attempts used when the configuration does not override them
    fn default_formats(&self) -> Vec<FormatAttempt>;

    /// Read one representation of the clipboard
    /// Must give up after `timeout`; an unavailable format may return an
    /// error or empty bytes, the caller treats both the same
    fn attempt_read(&mut self, format: &FormatAttempt, timeout: Duration) -> Result<Vec<u8>>;

    /// List every target the current clipboard owner offers
    fn offered_formats(&mut self, timeout: Duration) -> Result<Vec<String>>;

    /// Block until the next detection cycle should run
    fn wait_for_change(&mut self, interval: Duration, stop: &StopSignal) -> Result<Wakeup>;

    /// Handle that interrupts `wait_for_change`
    /// Polling backends return None: they already wake on the stop signal
    fn waker(&self) -> Option<Waker> {
        None
    }

    /// Empty the clipboard
    fn clear(&mut self) -> Result<()>;

    /// Release platform resources
    fn teardown(&mut self) {}
}

/// Wait out one poll interval, returning early when stop is raised
pub fn poll_tick(interval: Duration, stop: &StopSignal) -> Wakeup {
    if stop.wait_timeout(interval) {
        Wakeup::Stopped
    } else {
        Wakeup::Tick
    }
}
