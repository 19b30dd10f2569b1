//! Asset-ledger errors.

use custos_access::AccessError;
use custos_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("duplicate serial number: {0}")]
    DuplicateSerialNumber(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("price mismatch: {0}")]
    PriceMismatch(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
