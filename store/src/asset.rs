//! Asset storage trait and record.

use crate::StoreError;
use custos_types::{AccountAddress, Amount, AssetId, OrderId, Timestamp, VerificationStatus};
use serde::{Deserialize, Serialize};

/// A uniquely serial-numbered asset under custody tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    /// Current holder.
    pub owner: AccountAddress,
    /// Registering brand. `None` for user-registered assets until a
    /// verification decision records the brand.
    pub brand: Option<AccountAddress>,
    pub name: String,
    /// Globally unique for the lifetime of the system.
    pub serial_number: String,
    /// Opaque pointer; the core never parses or validates it.
    pub metadata_uri: String,
    pub status: VerificationStatus,
    pub created_at: Timestamp,
    pub is_listed: bool,
    /// Meaningful only while listed; zero otherwise.
    pub price: Amount,
    /// The single non-terminal order holding this asset, if any.
    /// While set, the asset cannot be listed, unlisted, or transferred.
    pub open_order: Option<OrderId>,
}

impl AssetRecord {
    /// Whether any listing/transfer mutation is currently blocked by an
    /// in-flight order.
    pub fn has_open_order(&self) -> bool {
        self.open_order.is_some()
    }
}

/// Trait for asset storage operations.
///
/// Implementations must keep the serial-number index consistent with the
/// primary table: `put_new_asset` installs both under one commit.
pub trait AssetStore {
    fn get_asset(&self, id: AssetId) -> Result<AssetRecord, StoreError>;

    /// Insert a brand-new asset and index its serial number atomically.
    /// Fails with [`StoreError::Duplicate`] if the serial is already taken,
    /// leaving both tables untouched.
    fn put_new_asset(&self, record: &AssetRecord) -> Result<(), StoreError>;

    /// Overwrite an existing asset record (serial number must not change).
    fn update_asset(&self, record: &AssetRecord) -> Result<(), StoreError>;

    fn asset_exists(&self, id: AssetId) -> Result<bool, StoreError>;
    fn asset_count(&self) -> Result<u64, StoreError>;
    fn asset_id_by_serial(&self, serial: &str) -> Result<Option<AssetId>, StoreError>;
    fn iter_assets(&self) -> Result<Vec<AssetRecord>, StoreError>;

    /// All assets currently held by `owner`, in insertion order.
    fn assets_by_owner(&self, owner: &AccountAddress) -> Result<Vec<AssetRecord>, StoreError> {
        Ok(self
            .iter_assets()?
            .into_iter()
            .filter(|a| a.owner == *owner)
            .collect())
    }

    /// All assets currently listed for sale, in insertion order.
    fn listed_assets(&self) -> Result<Vec<AssetRecord>, StoreError> {
        Ok(self
            .iter_assets()?
            .into_iter()
            .filter(|a| a.is_listed)
            .collect())
    }
}
