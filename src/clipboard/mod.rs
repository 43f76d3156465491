pub mod backend;
pub mod process;
pub mod watch;
pub mod wayland;
pub mod x11;

#[cfg(test)]
pub(crate) mod fake;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

pub use backend::{ClipboardBackend, WatchMode, Wakeup, Waker};
pub use wayland::WaylandBackend;
pub use x11::X11Backend;

/// Which clipboard system to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Detect from the session environment
    #[default]
    Auto,
    X11,
    Wayland,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Auto => "auto",
            BackendKind::X11 => "x11",
            BackendKind::Wayland => "wayland",
        })
    }
}

/// A concrete display server, the result of resolving a `BackendKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    X11,
    Wayland,
}

impl BackendKind {
    /// Resolve `Auto` against the current environment
    /// Wayland wins when both variables are set (XWayland sessions export DISPLAY too)
    pub fn resolve(self) -> Result<DisplayServer> {
        match self {
            BackendKind::X11 => Ok(DisplayServer::X11),
            BackendKind::Wayland => Ok(DisplayServer::Wayland),
            BackendKind::Auto => {
                if env_is_set("WAYLAND_DISPLAY") {
                    log::info!("Detected Wayland display server");
                    Ok(DisplayServer::Wayland)
                } else if env_is_set("DISPLAY") {
                    log::info!("Detected X11 display server");
                    Ok(DisplayServer::X11)
                } else {
                    Err(anyhow!(
                        "No supported display server detected. Set WAYLAND_DISPLAY or DISPLAY"
                    ))
                }
            }
        }
    }
}

fn env_is_set(name: &str) -> bool {
    env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Create a clipboard backend for one-shot reads and writes
/// Returns error if no supported display server is detected
pub fn create_backend(kind: BackendKind) -> Result<Box<dyn ClipboardBackend>> {
    match kind.resolve()? {
        DisplayServer::Wayland => Ok(Box::new(WaylandBackend::new()?)),
        DisplayServer::X11 => Ok(Box::new(X11Backend::new()?)),
    }
}

/// Create a clipboard backend ready to be driven by the monitor loop
/// Event sources are started here so a broken session fails at start
pub fn create_watching_backend(kind: BackendKind) -> Result<Box<dyn ClipboardBackend>> {
    match kind.resolve()? {
        DisplayServer::Wayland => Ok(Box::new(WaylandBackend::new()?.with_watcher()?)),
        DisplayServer::X11 => Ok(Box::new(X11Backend::new()?)),
    }
}

/// Empty the system clipboard
pub fn clear_clipboard(kind: BackendKind) -> Result<()> {
    let mut backend = create_backend(kind)?;
    let result = backend.clear();
    backend.teardown();
    result
}
