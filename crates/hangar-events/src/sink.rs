use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};

use crate::RegistryEvent;

/// Trait for consuming events.
///
/// Each frontend provides its own implementation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RegistryEvent);
}

/// Channel-based event sink.
///
/// Sends events through a standard mpsc channel. The receiver end
/// can be polled by any consumer.
pub struct ChannelSink {
    sender: Sender<RegistryEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<RegistryEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: RegistryEvent) {
        let _ = self.sender.send(event);
    }
}

/// No-op event sink for headless operation.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RegistryEvent) {}
}

/// Collector sink that stores all events for inspection.
#[derive(Default)]
pub struct CollectorSink {
    events: Mutex<Vec<RegistryEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: RegistryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
