//! Unified engine error.

use custos_access::AccessError;
use custos_assets::LedgerError;
use custos_escrow::EscrowError;
use thiserror::Error;

/// Any failure from an engine operation.
///
/// Component errors pass through unchanged so callers can match on the
/// named kinds (`Unauthorized`, `NotFound`, `DuplicateSerialNumber`,
/// `InvalidState`, `PriceMismatch`, `DeadlineExceeded`, `AlreadyExists`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error("config error: {0}")]
    Config(String),
}
