//! C ABI over one process-wide monitor
//!
//! `StartClipboardListener` blocks the calling thread until
//! `StopClipboardListener` is called from another thread. While it runs, every
//! callback, including the Cleared event of `ClearClipboard`, runs on the thread
//! that called Start. A callback must not unwind into Rust.
//!
//! Content type values passed to the data callback:
//! None=0, Text=1, Files=2, Image=3, Other=4, Cleared=5.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{LazyLock, Once};

use crate::config::{self, Config};
use crate::logging;
use crate::models::ClipboardDataType;
use crate::monitor::{Monitor, RunOutcome};

/// Notify-only callback
pub type ClipboardChangedCallback = extern "C" fn();

/// Data callback: payload pointer, payload size in bytes, content type
///
/// The pointer is valid only during the call. One NUL byte follows the
/// payload and is not counted in `size`.
pub type ClipboardChangedWithDataCallback =
    extern "C" fn(data: *const c_char, size: usize, content_type: c_int);

/// Start returned after a normal stop
pub const START_STOPPED: c_int = 0;
/// Start returned at once because the listener was already running
pub const START_ALREADY_RUNNING: c_int = 1;
/// No usable clipboard backend, or the backend failed while running
pub const START_FAILED: c_int = -1;
/// The listener panicked
pub const START_PANICKED: c_int = -2;

static CONFIG: LazyLock<Config> = LazyLock::new(config::load_read_only);
static MONITOR: LazyLock<Monitor> = LazyLock::new(|| Monitor::new(CONFIG.monitor_config()));
static LOGGING: Once = Once::new();

fn init_logging() {
    LOGGING.call_once(|| {
        let settings = &CONFIG.logging;
        if let Some(file) = &settings.file {
            match logging::init_logger(file, &settings.level, &settings.stderr_level) {
                Ok(()) => return,
                Err(e) => eprintln!("clipmon: file logging disabled: {:#}", e),
            }
        }
        logging::init_default();
    });
}

fn monitor() -> &'static Monitor {
    init_logging();
    &MONITOR
}

/// Hand a payload to a C data callback with a trailing NUL
fn forward_data(
    callback: ClipboardChangedWithDataCallback,
    payload: &[u8],
    content_type: ClipboardDataType,
) {
    let mut buf = Vec::with_capacity(payload.len() + 1);
    buf.extend_from_slice(payload);
    buf.push(0);
    callback(
        buf.as_ptr().cast::<c_char>(),
        payload.len(),
        content_type.as_i32(),
    );
}

/// Run the clipboard listener on the calling thread until stopped
///
/// Returns 0 after a normal stop, 1 if already running, -1 when no clipboard
/// is available or the backend failed, -2 on an internal panic.
#[unsafe(no_mangle)]
pub extern "C" fn StartClipboardListener() -> c_int {
    match panic::catch_unwind(AssertUnwindSafe(|| monitor().start())) {
        Ok(Ok(RunOutcome::Stopped)) => START_STOPPED,
        Ok(Ok(RunOutcome::AlreadyRunning)) => START_ALREADY_RUNNING,
        Ok(Err(e)) => {
            log::error!("Clipboard listener failed: {}", e);
            START_FAILED
        }
        Err(_) => {
            log::error!("Clipboard listener panicked");
            START_PANICKED
        }
    }
}

/// Ask the listener to stop; returns without waiting for teardown
#[unsafe(no_mangle)]
pub extern "C" fn StopClipboardListener() {
    monitor().stop();
}

#[unsafe(no_mangle)]
pub extern "C" fn IsClipboardListenerRunning() -> bool {
    monitor().is_running()
}

/// Register the notify-only callback, or clear it with NULL
#[unsafe(no_mangle)]
pub extern "C" fn SetClipboardChangedCallback(callback: Option<ClipboardChangedCallback>) {
    let gate = monitor().gate();
    match callback {
        Some(callback) => gate.set_notify(Some(move || callback())),
        None => gate.clear_notify(),
    }
}

/// Register the data callback, or clear it with NULL
#[unsafe(no_mangle)]
pub extern "C" fn SetClipboardChangedCallbackWithData(
    callback: Option<ClipboardChangedWithDataCallback>,
) {
    let gate = monitor().gate();
    match callback {
        Some(callback) => {
            gate.set_data(Some(move |payload: &[u8], content_type: ClipboardDataType| {
                forward_data(callback, payload, content_type)
            }))
        }
        None => gate.clear_data(),
    }
}

/// Empty the system clipboard
///
/// On success registered callbacks receive a Cleared (5) event with an empty
/// payload. While the listener runs the event is delivered on the listener
/// thread at its next cycle; otherwise on the calling thread before return.
#[unsafe(no_mangle)]
pub extern "C" fn ClearClipboard() -> bool {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let monitor = monitor();
        monitor.clear_clipboard(monitor.config().backend)
    }))
    .unwrap_or_else(|_| {
        log::error!("ClearClipboard panicked");
        false
    })
}
