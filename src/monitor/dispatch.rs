use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::models::{ClipboardDataType, ClipboardSnapshot};

/// Receives clipboard change notifications
///
/// Both methods run on the monitor thread, notify-only first. A slow
/// implementation delays the next detection cycle. Panics are not caught.
pub trait ClipboardListener: Send + Sync {
    /// The clipboard changed
    fn on_changed(&self) {}

    /// The clipboard changed to `payload` of the given type
    fn on_changed_with_data(&self, _payload: &[u8], _content_type: ClipboardDataType) {}
}

type NotifyFn = Box<dyn Fn() + Send + Sync>;
type DataFn = Box<dyn Fn(&[u8], ClipboardDataType) + Send + Sync>;

/// The two callback slots of a monitor
///
/// Slots can be swapped from any thread at any time. A dispatch loads both
/// slots once before calling anything, so one change is always delivered to
/// the handles that were registered when its dispatch began.
#[derive(Default)]
pub struct DispatchGate {
    notify: ArcSwapOption<NotifyFn>,
    data: ArcSwapOption<DataFn>,
}

impl DispatchGate {
    pub fn new() -> Self {
        DispatchGate::default()
    }

    /// Register or clear (None) the notify-only callback
    pub fn set_notify<F>(&self, callback: Option<F>)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notify
            .store(callback.map(|f| Arc::new(Box::new(f) as NotifyFn)));
    }

    /// Register or clear (None) the data callback
    pub fn set_data<F>(&self, callback: Option<F>)
    where
        F: Fn(&[u8], ClipboardDataType) + Send + Sync + 'static,
    {
        self.data
            .store(callback.map(|f| Arc::new(Box::new(f) as DataFn)));
    }

    /// Route both slots to one listener
    pub fn set_listener(&self, listener: Arc<dyn ClipboardListener>) {
        let notify_listener = listener.clone();
        self.set_notify(Some(move || notify_listener.on_changed()));
        self.set_data(Some(move |payload: &[u8], content_type: ClipboardDataType| {
            listener.on_changed_with_data(payload, content_type)
        }));
    }

    pub fn clear_notify(&self) {
        self.notify.store(None);
    }

    pub fn clear_data(&self) {
        self.data.store(None);
    }

    /// Clear both slots
    pub fn clear(&self) {
        self.clear_notify();
        self.clear_data();
    }

    pub fn has_callbacks(&self) -> bool {
        self.notify.load().is_some() || self.data.load().is_some()
    }

    /// Deliver one change to whatever is registered
    pub fn dispatch(&self, snapshot: &ClipboardSnapshot) {
        let notify = self.notify.load_full();
        let data = self.data.load_full();

        if let Some(notify) = notify {
            notify();
        }

        if let Some(data) = data {
            data(&snapshot.payload, snapshot.content_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ClipboardListener for Recorder {
        fn on_changed(&self) {
            self.events.lock().unwrap().push("changed".to_string());
        }

        fn on_changed_with_data(&self, payload: &[u8], content_type: ClipboardDataType) {
            self.events.lock().unwrap().push(format!(
                "{}:{}:{}",
                content_type.as_i32(),
                payload.len(),
                String::from_utf8_lossy(payload)
            ));
        }
    }

    #[test]
    fn test_notify_runs_before_data() {
        let gate = DispatchGate::new();
        let recorder = Arc::new(Recorder::default());
        gate.set_listener(recorder.clone());

        gate.dispatch(&ClipboardSnapshot::new(ClipboardDataType::Text, b"hello".to_vec()));

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["changed".to_string(), "1:5:hello".to_string()]
        );
    }

    #[test]
    fn test_empty_gate_is_noop() {
        let gate = DispatchGate::new();
        assert!(!gate.has_callbacks());
        gate.dispatch(&ClipboardSnapshot::new(ClipboardDataType::Text, b"x".to_vec()));
    }

    #[test]
    fn test_only_data_callback() {
        let gate = DispatchGate::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        gate.set_data(Some(move |payload: &[u8], kind: ClipboardDataType| {
            sink.lock().unwrap().push((payload.to_vec(), kind));
        }));

        gate.dispatch(&ClipboardSnapshot::new(ClipboardDataType::Image, vec![1, 2, 3]));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(vec![1, 2, 3], ClipboardDataType::Image)]
        );
    }

    #[test]
    fn test_clear_and_replace() {
        let gate = DispatchGate::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        gate.set_notify(Some(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        gate.dispatch(&ClipboardSnapshot::cleared());

        let counter = second.clone();
        gate.set_notify(Some(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        gate.dispatch(&ClipboardSnapshot::cleared());

        gate.clear();
        assert!(!gate.has_callbacks());
        gate.dispatch(&ClipboardSnapshot::cleared());

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reregister_during_dispatch_keeps_cycle_handles() {
        let gate = Arc::new(DispatchGate::new());
        let delivered = Arc::new(Mutex::new(Vec::new()));

        // The notify callback swaps the data slot mid-dispatch
        let swap_gate = gate.clone();
        let swap_sink = delivered.clone();
        gate.set_notify(Some(move || {
            let sink = swap_sink.clone();
            swap_gate.set_data(Some(move |_: &[u8], _: ClipboardDataType| {
                sink.lock().unwrap().push("new");
            }));
        }));

        let old_sink = delivered.clone();
        gate.set_data(Some(move |_: &[u8], _: ClipboardDataType| {
            old_sink.lock().unwrap().push("old");
        }));

        gate.dispatch(&ClipboardSnapshot::new(ClipboardDataType::Text, b"a".to_vec()));
        gate.dispatch(&ClipboardSnapshot::new(ClipboardDataType::Text, b"b".to_vec()));

        assert_eq!(*delivered.lock().unwrap(), vec!["old", "new"]);
    }
}
