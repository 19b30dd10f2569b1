//! Asset ledger for the Custos marketplace.
//!
//! Owns the catalog of registered assets: identity, serial-number
//! uniqueness, verification status, listing state, ownership, and the
//! per-asset histories. The escrow crate mutates listing state only
//! through the order-lock surface exposed here ([`AssetLedger::begin_order`]
//! and friends), never by writing asset fields directly.

pub mod error;
pub mod ledger;

pub use error::LedgerError;
pub use ledger::AssetLedger;
