pub mod classifier;
pub mod detector;
pub mod dispatch;
pub mod fingerprint;
mod signal;

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::clipboard::{self, BackendKind, ClipboardBackend, Wakeup, Waker};
use crate::models::{ClipboardSnapshot, FormatAttempt, ProbeStrategy};

pub use classifier::{Classifier, FormatRead, Probe};
pub use detector::ChangeDetector;
pub use dispatch::{ClipboardListener, DispatchGate};
pub use fingerprint::{Fingerprint, fingerprint};
pub use signal::StopSignal;

/// Monitor errors
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Clipboard backend unavailable: {0:#}")]
    BackendUnavailable(anyhow::Error),

    #[error("Clipboard backend failed: {0:#}")]
    Backend(anyhow::Error),
}

/// How a call to `run` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The loop ran and was stopped
    Stopped,
    /// Another run was already active; nothing was done
    AlreadyRunning,
}

/// Settings for one monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub backend: BackendKind,
    /// Idle time between cycles for polling backends
    pub poll_interval: Duration,
    /// Upper bound for a single format read
    pub read_timeout: Duration,
    pub strategy: ProbeStrategy,
    /// Attempt list override, None uses the backend's defaults
    pub formats: Option<Vec<FormatAttempt>>,
    /// Report whatever is on the clipboard when the monitor starts
    pub report_initial_content: bool,
    /// Report unrecognised content as Other
    pub fallback_to_other: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            backend: BackendKind::Auto,
            poll_interval: Duration::from_millis(100),
            read_timeout: Duration::from_millis(100),
            strategy: ProbeStrategy::PerCategory,
            formats: None,
            report_initial_content: true,
            fallback_to_other: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
}

struct Inner {
    config: MonitorConfig,
    running: AtomicBool,
    /// Lifecycle; stop and clear decide under this lock which run they target
    phase: Mutex<Phase>,
    idle: Condvar,
    stop: StopSignal,
    waker: Mutex<Option<Waker>>,
    reset_requested: AtomicBool,
    cleared_pending: AtomicBool,
    gate: DispatchGate,
}

/// Clipboard change monitor
///
/// Cloning gives another handle to the same monitor, so one thread can
/// block in `run` while others register callbacks or call `stop`.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        Monitor {
            inner: Arc::new(Inner {
                config,
                running: AtomicBool::new(false),
                phase: Mutex::new(Phase::Idle),
                idle: Condvar::new(),
                stop: StopSignal::new(),
                waker: Mutex::new(None),
                reset_requested: AtomicBool::new(false),
                cleared_pending: AtomicBool::new(false),
                gate: DispatchGate::new(),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Callback slots of this monitor
    pub fn gate(&self) -> &DispatchGate {
        &self.inner.gate
    }

    pub fn is_running(&self) -> bool {
        *self.inner.phase.lock() == Phase::Running
    }

    /// Run the monitor on the configured system clipboard
    /// Blocks until `stop` is called
    pub fn start(&self) -> Result<RunOutcome, MonitorError> {
        let kind = self.inner.config.backend;
        self.run(|| clipboard::create_watching_backend(kind))
    }

    /// Run the detection loop on a backend produced by `open`
    ///
    /// Blocks the calling thread until `stop`. Returns `AlreadyRunning`
    /// without calling `open` when another run is active. When `open` fails
    /// registered callbacks are left in place.
    pub fn run<F>(&self, open: F) -> Result<RunOutcome, MonitorError>
    where
        F: FnOnce() -> anyhow::Result<Box<dyn ClipboardBackend>>,
    {
        {
            let mut phase = self.inner.phase.lock();
            if *phase == Phase::Running {
                log::warn!("Clipboard monitor already running, ignoring start");
                return Ok(RunOutcome::AlreadyRunning);
            }
            *phase = Phase::Running;
            self.inner.running.store(true, Ordering::SeqCst);
            self.inner.stop.reset();
            self.inner.reset_requested.store(false, Ordering::SeqCst);
            self.inner.cleared_pending.store(false, Ordering::SeqCst);
        }

        // Puts the monitor back to Idle however this run ends, including a
        // panic from a callback
        let mut guard = RunGuard {
            inner: &self.inner,
            opened: false,
        };

        let backend = open().map_err(|e| {
            log::error!("Failed to start clipboard monitor: {:#}", e);
            MonitorError::BackendUnavailable(e)
        })?;
        guard.opened = true;

        self.drive(backend)
    }

    fn drive(&self, mut backend: Box<dyn ClipboardBackend>) -> Result<RunOutcome, MonitorError> {
        let inner = &self.inner;
        let config = &inner.config;

        let classifier = Classifier {
            formats: config
                .formats
                .clone()
                .unwrap_or_else(|| backend.default_formats()),
            strategy: config.strategy,
            read_timeout: config.read_timeout,
            fallback_to_other: config.fallback_to_other,
        };

        *inner.waker.lock() = backend.waker();

        log::info!(
            "Clipboard monitor started: {} backend ({:?}), {} formats",
            backend.name(),
            backend.mode(),
            classifier.formats.len()
        );

        let mut detector = ChangeDetector::new();
        let mut first_cycle = true;
        let mut outcome = Ok(RunOutcome::Stopped);

        while inner.running.load(Ordering::SeqCst) {
            if inner.reset_requested.swap(false, Ordering::SeqCst) {
                detector.reset();
            }
            if inner.cleared_pending.swap(false, Ordering::SeqCst) {
                log::debug!("Clipboard changed: cleared");
                inner.gate.dispatch(&ClipboardSnapshot::cleared());
            }

            let probe = classifier.classify(backend.as_mut());

            if first_cycle && !config.report_initial_content {
                detector.prime(&probe);
            } else if detector.observe(&probe) {
                let snapshot = probe.into_snapshot();
                log::debug!(
                    "Clipboard changed: {} ({} bytes)",
                    snapshot.content_type,
                    snapshot.size()
                );
                inner.gate.dispatch(&snapshot);
            }
            first_cycle = false;

            if !inner.running.load(Ordering::SeqCst) {
                break;
            }

            match backend.wait_for_change(config.poll_interval, &inner.stop) {
                Ok(Wakeup::Tick) | Ok(Wakeup::Changed) => {}
                Ok(Wakeup::Stopped) => break,
                Ok(Wakeup::Closed) => {
                    if inner.running.load(Ordering::SeqCst) {
                        log::error!("{} change source closed unexpectedly", backend.name());
                        outcome = Err(MonitorError::Backend(anyhow::anyhow!(
                            "{} change source closed",
                            backend.name()
                        )));
                    }
                    break;
                }
                Err(e) => {
                    log::error!("Waiting for clipboard changes failed: {:#}", e);
                    outcome = Err(MonitorError::Backend(e));
                    break;
                }
            }
        }

        // A clear that landed during the last cycle is still delivered here
        if inner.cleared_pending.swap(false, Ordering::SeqCst) {
            inner.gate.dispatch(&ClipboardSnapshot::cleared());
        }

        *inner.waker.lock() = None;
        backend.teardown();
        log::info!("Clipboard monitor stopped");

        outcome
    }

    /// Ask a running loop to exit
    ///
    /// Returns at once; the loop finishes its current cycle first. Use
    /// `wait_stopped` to wait for teardown. Does nothing when not running.
    pub fn stop(&self) {
        // Holding the phase lock pins the stop to the current run: a run
        // that is tearing down cannot hand over to a new one meanwhile
        let phase = self.inner.phase.lock();
        if *phase != Phase::Running || !self.inner.running.swap(false, Ordering::SeqCst) {
            log::debug!("Clipboard monitor not running, nothing to stop");
            return;
        }

        log::info!("Stopping clipboard monitor");
        self.inner.stop.raise();
        if let Some(waker) = self.inner.waker.lock().as_ref() {
            waker(Wakeup::Stopped);
        }
    }

    /// Wait until the monitor is idle; returns false on timeout
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        let mut phase = self.inner.phase.lock();
        self.inner
            .idle
            .wait_while_for(&mut phase, |phase| *phase == Phase::Running, timeout);
        *phase == Phase::Idle
    }

    /// Clear the system clipboard through a fresh backend of `kind`
    pub fn clear_clipboard(&self, kind: BackendKind) -> bool {
        match clipboard::create_backend(kind) {
            Ok(mut backend) => {
                let cleared = self.clear_with(backend.as_mut());
                backend.teardown();
                cleared
            }
            Err(e) => {
                log::warn!("Failed to clear clipboard: {:#}", e);
                false
            }
        }
    }

    /// Clear the clipboard through `backend` and announce it
    ///
    /// On success the dedup memory is reset, so copying the previous content
    /// again counts as a new change, and a Cleared event is dispatched. While
    /// the monitor runs the event is handed to the monitor thread, which
    /// delivers it at the start of its next cycle; otherwise it is
    /// dispatched on the calling thread.
    pub fn clear_with(&self, backend: &mut dyn ClipboardBackend) -> bool {
        if let Err(e) = backend.clear() {
            log::warn!("Failed to clear clipboard: {:#}", e);
            return false;
        }
        log::info!("Clipboard cleared via {} backend", backend.name());

        {
            let phase = self.inner.phase.lock();
            if *phase == Phase::Running {
                self.inner.reset_requested.store(true, Ordering::SeqCst);
                self.inner.cleared_pending.store(true, Ordering::SeqCst);
                if let Some(waker) = self.inner.waker.lock().as_ref() {
                    waker(Wakeup::Changed);
                }
                return true;
            }
        }

        self.inner.gate.dispatch(&ClipboardSnapshot::cleared());
        true
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Monitor::new(MonitorConfig::default())
    }
}

struct RunGuard<'a> {
    inner: &'a Inner,
    /// Set once the backend is open; only a real run clears the callbacks
    opened: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.inner.waker.lock() = None;
        if self.opened {
            self.inner.gate.clear();
        }
        self.inner.running.store(false, Ordering::SeqCst);

        let pending = {
            let mut phase = self.inner.phase.lock();
            *phase = Phase::Idle;
            self.inner.idle.notify_all();
            self.inner.cleared_pending.swap(false, Ordering::SeqCst)
        };

        // A clear that raced a failed open still reaches the kept callbacks
        if pending && !self.opened && !std::thread::panicking() {
            self.inner.gate.dispatch(&ClipboardSnapshot::cleared());
        }
    }
}
