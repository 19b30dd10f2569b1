//! Event log for the Custos ledger.
//!
//! Every committed state transition appends exactly one [`MarketEvent`]
//! (two for pay-on-create) to the [`EventLog`], in transition order.
//! External indexers replay the log to reconstruct state; in-process
//! subscribers can also attach to the [`EventBus`].

pub mod bus;
pub mod event;
pub mod log;

pub use bus::EventBus;
pub use event::MarketEvent;
pub use log::{EventLog, SequencedEvent};
