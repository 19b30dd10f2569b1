//! The Custos market engine.
//!
//! One [`MarketEngine`] instance owns all mutation: access control, the
//! asset ledger, and the order escrow, stitched together over a shared
//! store. Every committed transition appends to the event log and fans
//! out on the event bus; every failed operation leaves no trace.

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::MarketEngine;
pub use error::EngineError;
