//! Fundamental types for the Custos custody ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, amounts, entity ids, timestamps, state
//! enums, and market policy parameters.

pub mod address;
pub mod amount;
pub mod id;
pub mod params;
pub mod state;
pub mod time;

pub use address::AccountAddress;
pub use amount::{Amount, UNIT};
pub use id::{AssetId, OrderId};
pub use params::MarketParams;
pub use state::{OrderStatus, VerificationStatus};
pub use time::Timestamp;
