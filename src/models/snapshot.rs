use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of content carried by a clipboard change
///
/// Numeric values are part of the C ABI and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum ClipboardDataType {
    /// Nothing could be read
    None = 0,
    /// UTF-8 text
    Text = 1,
    /// A `text/uri-list` of copied files
    Files = 2,
    /// Raw image container bytes (png, bmp, jpeg...)
    Image = 3,
    /// Something the clipboard offered that no configured format matched
    Other = 4,
    /// The clipboard was explicitly cleared through this library
    Cleared = 5,
}

impl ClipboardDataType {
    /// Convert an ABI value back into a data type
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ClipboardDataType::None),
            1 => Some(ClipboardDataType::Text),
            2 => Some(ClipboardDataType::Files),
            3 => Some(ClipboardDataType::Image),
            4 => Some(ClipboardDataType::Other),
            5 => Some(ClipboardDataType::Cleared),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Short uppercase label for logs and CLI output
    pub fn label(self) -> &'static str {
        match self {
            ClipboardDataType::None => "NONE",
            ClipboardDataType::Text => "TEXT",
            ClipboardDataType::Files => "FILES",
            ClipboardDataType::Image => "IMAGE",
            ClipboardDataType::Other => "OTHER",
            ClipboardDataType::Cleared => "CLEARED",
        }
    }

    /// Whether payloads of this type are meant to be read as UTF-8
    pub fn is_textual(self) -> bool {
        matches!(self, ClipboardDataType::Text | ClipboardDataType::Files)
    }
}

impl fmt::Display for ClipboardDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The classified content of the clipboard for one detection cycle
///
/// Created once per cycle and never mutated afterwards. Listeners only
/// ever see it by shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub content_type: ClipboardDataType,
    pub payload: Vec<u8>,
}

impl ClipboardSnapshot {
    pub fn new(content_type: ClipboardDataType, payload: Vec<u8>) -> Self {
        ClipboardSnapshot {
            content_type,
            payload,
        }
    }

    /// Snapshot for a cycle where nothing was read
    pub fn empty() -> Self {
        ClipboardSnapshot::new(ClipboardDataType::None, Vec::new())
    }

    /// Snapshot announcing an explicit clear
    pub fn cleared() -> Self {
        ClipboardSnapshot::new(ClipboardDataType::Cleared, Vec::new())
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content_type == ClipboardDataType::None
    }

    /// Payload as text, for Text and Files snapshots
    pub fn text(&self) -> Option<String> {
        if self.content_type.is_textual() {
            Some(String::from_utf8_lossy(&self.payload).into_owned())
        } else {
            None
        }
    }

    /// URIs of a Files snapshot
    /// Comment lines and blank lines of the uri-list are skipped
    pub fn file_uris(&self) -> Vec<String> {
        if self.content_type != ClipboardDataType::Files {
            return Vec::new();
        }

        String::from_utf8_lossy(&self.payload)
            .lines()
            .map(|line| line.trim_end_matches('\r').trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    }

    /// Get a preview string (truncated for display)
    pub fn preview(&self, max_len: usize) -> String {
        match self.content_type {
            ClipboardDataType::Text => {
                let text = String::from_utf8_lossy(&self.payload);
                let first = text.lines().next().unwrap_or("");
                if first.chars().count() > max_len {
                    let cut: String = first.chars().take(max_len).collect();
                    format!("{}...", cut)
                } else {
                    first.to_string()
                }
            }
            ClipboardDataType::Files => {
                let uris = self.file_uris();
                match uris.first() {
                    Some(first) if uris.len() > 1 => {
                        format!("{} (+{} more)", first, uris.len() - 1)
                    }
                    Some(first) => first.clone(),
                    None => String::new(),
                }
            }
            ClipboardDataType::Image => {
                let format = crate::image::detect_format(&self.payload).unwrap_or("unknown");
                format!("[Image: {} ({} bytes)]", format, self.size())
            }
            ClipboardDataType::Other => format!("[{} bytes]", self.size()),
            ClipboardDataType::None | ClipboardDataType::Cleared => String::new(),
        }
    }
}
