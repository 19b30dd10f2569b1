//! Escrow-specific errors.

use custos_assets::LedgerError;
use custos_store::StoreError;
use custos_types::{Amount, OrderId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("order not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("price mismatch: paid {paid}, listed {listed}")]
    PriceMismatch { paid: Amount, listed: Amount },

    #[error("refund deadline exceeded: deadline {deadline}, now {now}")]
    DeadlineExceeded { deadline: Timestamp, now: Timestamp },

    #[error("funds for {0} already deposited")]
    AlreadyHeld(OrderId),

    #[error("no funds held for {0}")]
    NothingHeld(OrderId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
