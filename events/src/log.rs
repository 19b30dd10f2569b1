//! Append-only sequenced event log.

use crate::event::MarketEvent;
use custos_types::Timestamp;
use serde::{Deserialize, Serialize};

/// An event with its position in the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequencedEvent {
    /// Monotonic, gap-free, starting at 1.
    pub seq: u64,
    pub recorded_at: Timestamp,
    pub event: MarketEvent,
}

/// The authoritative, append-only record of every committed transition.
///
/// Entries are never mutated or removed; a consumer that remembers the last
/// sequence number it saw can resume with [`EventLog::events_from`].
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<SequencedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning its sequence number.
    pub fn append(&mut self, event: MarketEvent, now: Timestamp) -> u64 {
        let seq = self.entries.len() as u64 + 1;
        self.entries.push(SequencedEvent {
            seq,
            recorded_at: now,
            event,
        });
        seq
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries with `seq >= from`, in log order.
    pub fn events_from(&self, from: u64) -> &[SequencedEvent] {
        let start = from.saturating_sub(1).min(self.entries.len() as u64) as usize;
        &self.entries[start..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequencedEvent> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&SequencedEvent> {
        self.entries.last()
    }
}
