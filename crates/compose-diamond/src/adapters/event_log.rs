//! # Event Log Adapter
//!
//! Collects committed events in memory, both structured and as encoded
//! logs (topic 0 plus ABI data).

use crate::domain::entities::DiamondEvent;
use crate::events::LogPayload;
use crate::ports::outbound::EventSink;
use parking_lot::Mutex;

/// A published event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedEvent {
    /// Bus topic it was published under.
    pub topic: String,
    pub event: DiamondEvent,
    pub log: LogPayload,
}

/// In-memory event sink.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    published: Mutex<Vec<PublishedEvent>>,
}

impl InMemoryEventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().clone()
    }

    /// Structured events only.
    #[must_use]
    pub fn events(&self) -> Vec<DiamondEvent> {
        self.published.lock().iter().map(|p| p.event.clone()).collect()
    }

    /// Drains the log.
    pub fn take(&self) -> Vec<PublishedEvent> {
        std::mem::take(&mut *self.published.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.published.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.lock().is_empty()
    }
}

impl EventSink for InMemoryEventLog {
    fn publish(&self, topic: &str, event: &DiamondEvent) {
        self.published.lock().push(PublishedEvent {
            topic: topic.to_string(),
            event: event.clone(),
            log: LogPayload::from(event),
        });
    }
}
