//! Synchronous fan-out event bus.

use crate::event::MarketEvent;

/// Fan-out bus for committed ledger events.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast
/// to avoid stalling the engine's single-writer loop.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&MarketEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&MarketEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &MarketEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
