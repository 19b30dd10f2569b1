//! Brand storage trait.

use crate::StoreError;
use custos_types::{AccountAddress, Timestamp};
use serde::{Deserialize, Serialize};

/// A registered brand identity.
///
/// At most one record exists per address; records are never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrandRecord {
    pub address: AccountAddress,
    /// Display name, set once at registration.
    pub name: String,
    /// Only the administrator flips this.
    pub is_authorized: bool,
    pub registered_at: Timestamp,
}

/// Trait for brand storage operations.
pub trait BrandStore {
    fn get_brand(&self, address: &AccountAddress) -> Result<BrandRecord, StoreError>;
    fn put_brand(&self, record: &BrandRecord) -> Result<(), StoreError>;
    fn brand_exists(&self, address: &AccountAddress) -> Result<bool, StoreError>;
    fn brand_count(&self) -> Result<u64, StoreError>;
    fn iter_brands(&self) -> Result<Vec<BrandRecord>, StoreError>;

    /// Count authorized brands without the caller filtering by hand.
    fn authorized_brand_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .iter_brands()?
            .into_iter()
            .filter(|b| b.is_authorized)
            .count() as u64)
    }
}
