//! In-memory clipboard for tests
//!
//! `FakeClipboard` is the handle tests use to "copy" content; `FakeBackend`
//! is what the monitor drives. Both share the same offers.

use anyhow::{Result, bail};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::backend::{ClipboardBackend, WatchMode, Wakeup, Waker, poll_tick};
use crate::models::{FormatAttempt, x11_formats};
use crate::monitor::StopSignal;

#[derive(Default)]
struct Shared {
    offers: Mutex<Vec<(String, Vec<u8>)>>,
    failing: Mutex<Vec<String>>,
    reads: AtomicUsize,
    clears: AtomicUsize,
    teardowns: AtomicUsize,
    events: Mutex<Option<Sender<Wakeup>>>,
}

/// Test-side handle to the fake clipboard
#[derive(Clone, Default)]
pub struct FakeClipboard {
    shared: Arc<Shared>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        FakeClipboard::default()
    }

    /// Replace the clipboard content with the given offers
    pub fn set(&self, offers: &[(&str, &[u8])]) {
        *self.shared.offers.lock().unwrap() = offers
            .iter()
            .map(|(id, bytes)| (id.to_string(), bytes.to_vec()))
            .collect();
        if let Some(tx) = self.shared.events.lock().unwrap().as_ref() {
            let _ = tx.send(Wakeup::Changed);
        }
    }

    pub fn set_text(&self, text: &str) {
        self.set(&[("UTF8_STRING", text.as_bytes())]);
    }

    /// Make reads of a format fail, as if the owner never answered
    pub fn fail_format(&self, id: &str) {
        self.shared.failing.lock().unwrap().push(id.to_string());
    }

    /// Close the event source, as if the platform watcher died
    pub fn close_events(&self) {
        if let Some(tx) = self.shared.events.lock().unwrap().as_ref() {
            let _ = tx.send(Wakeup::Closed);
        }
    }

    pub fn reads(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.shared.clears.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.shared.teardowns.load(Ordering::SeqCst)
    }

    /// Polling backend over this clipboard
    pub fn polling(&self) -> FakeBackend {
        FakeBackend {
            shared: self.shared.clone(),
            events: None,
        }
    }

    /// Event-driven backend over this clipboard
    pub fn event_driven(&self) -> FakeBackend {
        let (tx, rx) = mpsc::channel();
        *self.shared.events.lock().unwrap() = Some(tx);
        FakeBackend {
            shared: self.shared.clone(),
            events: Some(rx),
        }
    }
}

pub struct FakeBackend {
    shared: Arc<Shared>,
    events: Option<Receiver<Wakeup>>,
}

impl ClipboardBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "Fake"
    }

    fn mode(&self) -> WatchMode {
        if self.events.is_some() {
            WatchMode::EventDriven
        } else {
            WatchMode::Polling
        }
    }

    fn default_formats(&self) -> Vec<FormatAttempt> {
        x11_formats()
    }

    fn attempt_read(&mut self, format: &FormatAttempt, _timeout: Duration) -> Result<Vec<u8>> {
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        if self.shared.failing.lock().unwrap().contains(&format.id) {
            bail!("{} timed out", format.id);
        }
        let offers = self.shared.offers.lock().unwrap();
        Ok(offers
            .iter()
            .find(|(id, _)| *id == format.id)
            .map(|(_, bytes)| bytes.clone())
            .unwrap_or_default())
    }

    fn offered_formats(&mut self, _timeout: Duration) -> Result<Vec<String>> {
        let offers = self.shared.offers.lock().unwrap();
        let mut targets = vec!["TARGETS".to_string(), "TIMESTAMP".to_string()];
        targets.extend(offers.iter().map(|(id, _)| id.clone()));
        Ok(targets)
    }

    fn wait_for_change(&mut self, interval: Duration, stop: &StopSignal) -> Result<Wakeup> {
        match &self.events {
            None => Ok(poll_tick(interval, stop)),
            Some(rx) => Ok(rx.recv().unwrap_or(Wakeup::Closed)),
        }
    }

    fn waker(&self) -> Option<Waker> {
        self.events.as_ref()?;
        let tx = self.shared.events.lock().unwrap().clone()?;
        Some(Box::new(move |wakeup| {
            let _ = tx.send(wakeup);
        }))
    }

    fn clear(&mut self) -> Result<()> {
        self.shared.clears.fetch_add(1, Ordering::SeqCst);
        self.shared.offers.lock().unwrap().clear();
        Ok(())
    }

    fn teardown(&mut self) {
        self.shared.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}
