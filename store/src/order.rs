//! Order storage trait and record.

use crate::StoreError;
use custos_types::{AccountAddress, Amount, AssetId, OrderId, OrderStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// An escrowed purchase transaction tied to one asset and one
/// buyer/seller pair. Immutable once terminal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub asset_id: AssetId,
    /// Asset owner at order creation.
    pub seller: AccountAddress,
    pub buyer: AccountAddress,
    /// Copied from the listing at creation; never changes afterwards.
    pub price: Amount,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
    pub shipped_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    /// Cleared on completion; refund guards also check the deadline.
    pub can_refund: bool,
    /// Last instant (inclusive) at which the buyer may request a refund.
    pub refund_deadline: Option<Timestamp>,
}

impl OrderRecord {
    /// Whether `account` is a party to this order.
    pub fn involves(&self, account: &AccountAddress) -> bool {
        self.buyer == *account || self.seller == *account
    }
}

/// Trait for order storage operations.
pub trait OrderStore {
    fn get_order(&self, id: OrderId) -> Result<OrderRecord, StoreError>;
    fn put_order(&self, record: &OrderRecord) -> Result<(), StoreError>;
    fn order_exists(&self, id: OrderId) -> Result<bool, StoreError>;
    fn order_count(&self) -> Result<u64, StoreError>;
    fn iter_orders(&self) -> Result<Vec<OrderRecord>, StoreError>;

    /// Every order in which `account` is buyer or seller, in insertion order.
    fn orders_by_user(&self, account: &AccountAddress) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self
            .iter_orders()?
            .into_iter()
            .filter(|o| o.involves(account))
            .collect())
    }
}
