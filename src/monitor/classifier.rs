use std::time::Duration;

use crate::clipboard::ClipboardBackend;
use crate::models::{ClipboardDataType, ClipboardSnapshot, FormatAttempt, ProbeStrategy};

/// X11 meta targets and Wayland pseudo types that never carry content
const META_TARGETS: [&str; 9] = [
    "TARGETS",
    "TIMESTAMP",
    "MULTIPLE",
    "SAVE_TARGETS",
    "DELETE",
    "INCR",
    "ATOM",
    "ATOM_PAIR",
    "chromium/x-source-url",
];

/// One format read during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRead {
    pub format_id: String,
    pub kind: ClipboardDataType,
    pub bytes: Vec<u8>,
}

/// Everything one classification cycle read, plus which read won
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probe {
    reads: Vec<FormatRead>,
    winner: Option<usize>,
}

impl Probe {
    /// Bytes of every attempted format, in attempt order
    pub fn examined(&self) -> impl Iterator<Item = &[u8]> {
        self.reads.iter().map(|r| r.bytes.as_slice())
    }

    pub fn reads(&self) -> &[FormatRead] {
        &self.reads
    }

    /// The winning read, if any format produced data
    pub fn winner(&self) -> Option<&FormatRead> {
        self.winner.map(|i| &self.reads[i])
    }

    pub fn content_type(&self) -> ClipboardDataType {
        self.winner().map(|r| r.kind).unwrap_or(ClipboardDataType::None)
    }

    /// Consume the probe, moving the winning bytes into the snapshot
    pub fn into_snapshot(mut self) -> ClipboardSnapshot {
        match self.winner {
            Some(i) => {
                let read = self.reads.swap_remove(i);
                ClipboardSnapshot::new(read.kind, read.bytes)
            }
            None => ClipboardSnapshot::empty(),
        }
    }

    fn record(&mut self, format: &FormatAttempt, bytes: Vec<u8>) -> bool {
        let hit = !bytes.is_empty();
        if hit && self.winner.is_none() {
            self.winner = Some(self.reads.len());
        }
        self.reads.push(FormatRead {
            format_id: format.id.clone(),
            kind: format.kind,
            bytes,
        });
        hit
    }
}

/// Classifier settings for one monitor
#[derive(Debug, Clone)]
pub struct Classifier {
    pub formats: Vec<FormatAttempt>,
    pub strategy: ProbeStrategy,
    pub read_timeout: Duration,
    pub fallback_to_other: bool,
}

impl Classifier {
    /// Read the clipboard through `backend` and pick the winning representation
    ///
    /// Formats are tried in list order and the first non-empty read wins.
    /// A failed or timed out read counts as empty and never aborts the cycle.
    pub fn classify(&self, backend: &mut dyn ClipboardBackend) -> Probe {
        let mut probe = Probe::default();
        let mut settled: Vec<ClipboardDataType> = Vec::new();

        for format in &self.formats {
            if settled.contains(&format.kind) {
                log::trace!("Skipping {}: {} already found", format.id, format.kind);
                continue;
            }

            let bytes = self.read(backend, format);
            if probe.record(format, bytes) {
                match self.strategy {
                    ProbeStrategy::FirstHit => break,
                    ProbeStrategy::PerCategory => settled.push(format.kind),
                }
            }
        }

        if probe.winner.is_none() && self.fallback_to_other {
            self.read_other(backend, &mut probe);
        }

        probe
    }

    fn read(&self, backend: &mut dyn ClipboardBackend, format: &FormatAttempt) -> Vec<u8> {
        match backend.attempt_read(format, self.read_timeout) {
            Ok(mut bytes) => {
                if !format.binary {
                    // Some owners NUL terminate text targets
                    while bytes.last() == Some(&0) {
                        bytes.pop();
                    }
                }
                bytes
            }
            Err(e) => {
                log::trace!("Read of {} via {} gave nothing: {:#}", format.id, backend.name(), e);
                Vec::new()
            }
        }
    }

    /// Read the first offered target nobody asked for and report it as Other
    fn read_other(&self, backend: &mut dyn ClipboardBackend, probe: &mut Probe) {
        let offered = match backend.offered_formats(self.read_timeout) {
            Ok(offered) => offered,
            Err(e) => {
                log::trace!("Could not list offered formats: {:#}", e);
                return;
            }
        };

        let candidate = offered.into_iter().find(|target| {
            !META_TARGETS.contains(&target.as_str())
                && !self.formats.iter().any(|f| f.id == *target)
        });

        if let Some(target) = candidate {
            let attempt = FormatAttempt::new(target, ClipboardDataType::Other, true);
            let bytes = self.read(backend, &attempt);
            probe.record(&attempt, bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::fake::FakeClipboard;
    use crate::models::x11_formats;

    const PNG: [u8; 12] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    ];

    fn classifier(strategy: ProbeStrategy) -> Classifier {
        Classifier {
            formats: x11_formats(),
            strategy,
            read_timeout: Duration::from_millis(100),
            fallback_to_other: true,
        }
    }

    #[test]
    fn test_text_only() {
        let clipboard = FakeClipboard::new();
        clipboard.set_text("hello");

        let probe = classifier(ProbeStrategy::PerCategory).classify(&mut clipboard.polling());
        let snapshot = probe.into_snapshot();
        assert_eq!(snapshot.content_type, ClipboardDataType::Text);
        assert_eq!(snapshot.payload, b"hello");
        assert_eq!(snapshot.size(), 5);
    }

    #[test]
    fn test_image_beats_text() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("UTF8_STRING", b"a picture"), ("image/png", &PNG)]);

        let snapshot = classifier(ProbeStrategy::PerCategory)
            .classify(&mut clipboard.polling())
            .into_snapshot();
        assert_eq!(snapshot.content_type, ClipboardDataType::Image);
        assert_eq!(snapshot.size(), 12);
    }

    #[test]
    fn test_files_beat_text() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[
            ("UTF8_STRING", b"/tmp/report.pdf"),
            ("text/uri-list", b"file:///tmp/report.pdf"),
        ]);

        let probe = classifier(ProbeStrategy::PerCategory).classify(&mut clipboard.polling());
        assert_eq!(probe.content_type(), ClipboardDataType::Files);
        assert_eq!(probe.winner().unwrap().format_id, "text/uri-list");
    }

    #[test]
    fn test_first_image_format_wins_and_rest_of_category_skipped() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("image/bmp", b"BMdata"), ("image/jpeg", b"\xFF\xD8\xFFjpeg")]);

        let probe = classifier(ProbeStrategy::PerCategory).classify(&mut clipboard.polling());
        assert_eq!(probe.winner().unwrap().format_id, "image/bmp");

        let attempted: Vec<&str> = probe.reads().iter().map(|r| r.format_id.as_str()).collect();
        // jpeg and x-png are skipped, files and text are still probed
        assert_eq!(attempted, vec!["image/png", "image/bmp", "text/uri-list", "UTF8_STRING"]);
    }

    #[test]
    fn test_per_category_examines_losing_formats() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("image/png", &PNG), ("UTF8_STRING", b"caption")]);

        let probe = classifier(ProbeStrategy::PerCategory).classify(&mut clipboard.polling());
        let examined: Vec<&[u8]> = probe.examined().filter(|b| !b.is_empty()).collect();
        assert_eq!(examined, vec![&PNG[..], &b"caption"[..]]);
    }

    #[test]
    fn test_first_hit_stops_the_cycle() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("image/png", &PNG), ("UTF8_STRING", b"caption")]);

        let probe = classifier(ProbeStrategy::FirstHit).classify(&mut clipboard.polling());
        assert_eq!(probe.reads().len(), 1);
        assert_eq!(clipboard.reads(), 1);
        assert_eq!(probe.content_type(), ClipboardDataType::Image);
    }

    #[test]
    fn test_failed_read_is_empty() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("image/png", &PNG), ("UTF8_STRING", b"fallback")]);
        clipboard.fail_format("image/png");

        let snapshot = classifier(ProbeStrategy::PerCategory)
            .classify(&mut clipboard.polling())
            .into_snapshot();
        assert_eq!(snapshot.content_type, ClipboardDataType::Text);
        assert_eq!(snapshot.payload, b"fallback");
    }

    #[test]
    fn test_nothing_readable() {
        let clipboard = FakeClipboard::new();

        let probe = classifier(ProbeStrategy::PerCategory).classify(&mut clipboard.polling());
        assert_eq!(probe.winner(), None);
        assert!(probe.examined().all(|b| b.is_empty()));
        assert!(probe.into_snapshot().is_empty());
    }

    #[test]
    fn test_unknown_format_is_other() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("application/x-spreadsheet", b"\x01\x02\x03")]);

        let probe = classifier(ProbeStrategy::PerCategory).classify(&mut clipboard.polling());
        let winner = probe.winner().unwrap();
        assert_eq!(winner.kind, ClipboardDataType::Other);
        assert_eq!(winner.format_id, "application/x-spreadsheet");
        assert_eq!(winner.bytes, b"\x01\x02\x03");
    }

    #[test]
    fn test_other_fallback_can_be_disabled() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("application/x-spreadsheet", b"\x01\x02\x03")]);

        let mut classifier = classifier(ProbeStrategy::PerCategory);
        classifier.fallback_to_other = false;
        assert_eq!(classifier.classify(&mut clipboard.polling()).winner(), None);
    }

    #[test]
    fn test_text_trailing_nul_trimmed() {
        let clipboard = FakeClipboard::new();
        clipboard.set(&[("UTF8_STRING", b"hello\0")]);

        let snapshot = classifier(ProbeStrategy::PerCategory)
            .classify(&mut clipboard.polling())
            .into_snapshot();
        assert_eq!(snapshot.payload, b"hello");
    }
}
