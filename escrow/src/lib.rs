//! Order escrow for the Custos marketplace.
//!
//! Owns the purchase lifecycle: payment is taken atomically with order
//! creation and held in the [`EscrowVault`] until exactly one terminal
//! transition releases it — to seller and platform on completion, or back
//! to the buyer on refund. Listing state on the asset ledger is only ever
//! touched through the ledger's order-lock surface.

pub mod engine;
pub mod error;
pub mod vault;

pub use engine::{CompletedOrder, OrderEscrow};
pub use error::EscrowError;
pub use vault::{EscrowVault, Payout};
