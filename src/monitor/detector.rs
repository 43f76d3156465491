use super::classifier::Probe;
use super::fingerprint::{Fingerprint, fingerprint};

/// Decides whether a cycle is a new logical clipboard state
///
/// Owned by the monitor thread; it is the only reader and writer of the
/// last fingerprint.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<Fingerprint>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        ChangeDetector::default()
    }

    /// Returns true when the probe should be dispatched
    /// All-empty probes never match and never touch the stored fingerprint
    pub fn observe(&mut self, probe: &Probe) -> bool {
        let Some(current) = fingerprint(probe.examined()) else {
            log::trace!("Empty cycle, nothing read");
            return false;
        };

        if self.last == Some(current) {
            log::trace!("Duplicate cycle {:?}", current);
            return false;
        }

        self.last = Some(current);
        probe.winner().is_some()
    }

    /// Remember the probe without reporting it
    pub fn prime(&mut self, probe: &Probe) {
        if let Some(current) = fingerprint(probe.examined()) {
            self.last = Some(current);
        }
    }

    /// Forget the last state so the next non-empty cycle is reported
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<Fingerprint> {
        self.last
    }
}
