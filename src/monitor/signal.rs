use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A resettable one-way flag threads can block on
///
/// The monitor raises it on stop to cut short the idle wait of a polling
/// backend.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: Mutex<bool>,
    cvar: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        StopSignal::default()
    }

    /// Raise the flag and wake every waiter
    pub fn raise(&self) {
        *self.raised.lock() = true;
        self.cvar.notify_all();
    }

    pub fn reset(&self) {
        *self.raised.lock() = false;
    }

    pub fn is_raised(&self) -> bool {
        *self.raised.lock()
    }

    /// Block for at most `timeout`; returns whether the flag is raised
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut raised = self.raised.lock();
        while !*raised {
            if self.cvar.wait_until(&mut raised, deadline).timed_out() {
                return *raised;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_times_out_when_not_raised() {
        let signal = StopSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_raise_wakes_waiter() {
        let signal = Arc::new(StopSignal::new());
        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || signal.wait_timeout(Duration::from_secs(10)))
        };
        thread::sleep(Duration::from_millis(20));
        signal.raise();
        assert!(waiter.join().unwrap());
        assert!(signal.is_raised());

        signal.reset();
        assert!(!signal.is_raised());
    }
}
