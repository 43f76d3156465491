pub mod format;
pub mod snapshot;

pub use format::{FormatAttempt, ProbeStrategy, wayland_formats, x11_formats};
pub use snapshot::{ClipboardDataType, ClipboardSnapshot};
