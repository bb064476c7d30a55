//! Notification sinks.

use tokensale_types::SaleEvent;

/// Receives every [`SaleEvent`] a sale emits, in emission order.
pub trait EventSink {
    fn emit(&mut self, event: SaleEvent);
}

/// In-memory sink that keeps every event.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SaleEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[SaleEvent] {
        &self.events
    }

    /// Events whose kind is named `name` (e.g. `"PURCHASED"`).
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SaleEvent> + 'a {
        self.events.iter().filter(move |e| e.kind.name() == name)
    }

    #[must_use]
    pub fn last(&self) -> Option<&SaleEvent> {
        self.events.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every stored event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<SaleEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: SaleEvent) {
        self.events.push(event);
    }
}
