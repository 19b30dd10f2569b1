//! Append-only per-asset history storage.

use crate::StoreError;
use custos_types::{AccountAddress, AssetId, OrderId, Timestamp};
use serde::{Deserialize, Serialize};

/// One entry in an asset's ownership history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnerHistoryEntry {
    pub owner: AccountAddress,
    pub at: Timestamp,
}

/// Trait for the append-only ownership and order histories keyed by asset.
///
/// Both sequences only ever grow; entries are returned in append order.
pub trait HistoryStore {
    fn append_owner(
        &self,
        asset_id: AssetId,
        owner: &AccountAddress,
        at: Timestamp,
    ) -> Result<(), StoreError>;

    fn owner_history(&self, asset_id: AssetId) -> Result<Vec<OwnerHistoryEntry>, StoreError>;

    fn append_order_ref(&self, asset_id: AssetId, order_id: OrderId) -> Result<(), StoreError>;

    fn order_history(&self, asset_id: AssetId) -> Result<Vec<OrderId>, StoreError>;
}
