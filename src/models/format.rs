use serde::{Deserialize, Serialize};

use super::snapshot::ClipboardDataType;

/// One probe for a specific clipboard representation
///
/// `id` is whatever the backend understands as a target name: an X11 atom
/// name or a Wayland MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatAttempt {
    pub id: String,
    pub kind: ClipboardDataType,
    #[serde(default)]
    pub binary: bool,
}

impl FormatAttempt {
    pub fn new(id: impl Into<String>, kind: ClipboardDataType, binary: bool) -> Self {
        FormatAttempt {
            id: id.into(),
            kind,
            binary,
        }
    }

    pub fn image(id: impl Into<String>) -> Self {
        FormatAttempt::new(id, ClipboardDataType::Image, true)
    }

    pub fn files(id: impl Into<String>) -> Self {
        FormatAttempt::new(id, ClipboardDataType::Files, false)
    }

    pub fn text(id: impl Into<String>) -> Self {
        FormatAttempt::new(id, ClipboardDataType::Text, false)
    }
}

/// Image targets, tried in this order on every platform
const IMAGE_TARGETS: [&str; 4] = ["image/png", "image/bmp", "image/jpeg", "image/x-png"];

const URI_LIST_TARGET: &str = "text/uri-list";

fn with_text_target(text_target: &str) -> Vec<FormatAttempt> {
    // Images before files before text: copying a file in most file managers
    // also advertises its path as plain text.
    let mut formats: Vec<FormatAttempt> = IMAGE_TARGETS
        .iter()
        .map(|t| FormatAttempt::image(*t))
        .collect();
    formats.push(FormatAttempt::files(URI_LIST_TARGET));
    formats.push(FormatAttempt::text(text_target));
    formats
}

/// Default attempt list for X11 selections
pub fn x11_formats() -> Vec<FormatAttempt> {
    with_text_target("UTF8_STRING")
}

/// Default attempt list for Wayland data offers
pub fn wayland_formats() -> Vec<FormatAttempt> {
    with_text_target("text/plain;charset=utf-8")
}

/// How far the classifier reads once a format has produced data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeStrategy {
    /// Every category is probed; inside a category the first hit wins and
    /// the remaining formats of that category are skipped
    #[default]
    PerCategory,
    /// The cycle stops at the first non-empty read
    FirstHit,
}
