//! Access-control errors.

use custos_store::StoreError;
use custos_types::AccountAddress;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("brand already registered: {0}")]
    AlreadyExists(AccountAddress),

    #[error("brand not found: {0}")]
    NotFound(AccountAddress),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
