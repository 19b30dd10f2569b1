//! Ledger transition events.

use custos_types::{AccountAddress, Amount, AssetId, OrderId, VerificationStatus};
use serde::{Deserialize, Serialize};

/// One event per committed ledger transition.
///
/// Field shapes mirror the query surface external indexers build their
/// read views from; events are serde-encodable for off-process consumers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// A brand record was created (unauthorized until the admin approves).
    BrandRegistered {
        brand: AccountAddress,
        name: String,
    },
    /// The administrator flipped a brand's authorization.
    BrandAuthorized {
        brand: AccountAddress,
        authorized: bool,
    },
    /// An asset entered the catalog (either registration path).
    AssetRegistered {
        asset_id: AssetId,
        owner: AccountAddress,
        brand: Option<AccountAddress>,
        name: String,
        serial_number: String,
    },
    /// A pending asset received a verification verdict.
    AssetVerified {
        asset_id: AssetId,
        status: VerificationStatus,
        verifier: AccountAddress,
    },
    AssetListed {
        asset_id: AssetId,
        seller: AccountAddress,
        price: Amount,
    },
    AssetUnlisted {
        asset_id: AssetId,
    },
    /// Explicit owner-to-owner transfer outside any order.
    AssetTransferred {
        asset_id: AssetId,
        from: AccountAddress,
        to: AccountAddress,
    },
    OrderCreated {
        order_id: OrderId,
        asset_id: AssetId,
        buyer: AccountAddress,
        seller: AccountAddress,
        price: Amount,
    },
    /// Always follows `OrderCreated` immediately: payment is atomic with creation.
    OrderPaid {
        order_id: OrderId,
        amount: Amount,
    },
    OrderShipped {
        order_id: OrderId,
    },
    OrderDelivered {
        order_id: OrderId,
    },
    /// Funds released: `seller_proceeds` to the seller, `fee` to the platform.
    OrderCompleted {
        order_id: OrderId,
        asset_id: AssetId,
        seller_proceeds: Amount,
        fee: Amount,
    },
    /// Full price returned to the buyer; the listing was restored.
    OrderRefunded {
        order_id: OrderId,
        asset_id: AssetId,
        amount: Amount,
    },
    OrderCancelled {
        order_id: OrderId,
        asset_id: AssetId,
    },
}

impl MarketEvent {
    /// Stable tag name, matching what indexers key on.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::BrandRegistered { .. } => "BrandRegistered",
            Self::BrandAuthorized { .. } => "BrandAuthorized",
            Self::AssetRegistered { .. } => "AssetRegistered",
            Self::AssetVerified { .. } => "AssetVerified",
            Self::AssetListed { .. } => "AssetListed",
            Self::AssetUnlisted { .. } => "AssetUnlisted",
            Self::AssetTransferred { .. } => "AssetTransferred",
            Self::OrderCreated { .. } => "OrderCreated",
            Self::OrderPaid { .. } => "OrderPaid",
            Self::OrderShipped { .. } => "OrderShipped",
            Self::OrderDelivered { .. } => "OrderDelivered",
            Self::OrderCompleted { .. } => "OrderCompleted",
            Self::OrderRefunded { .. } => "OrderRefunded",
            Self::OrderCancelled { .. } => "OrderCancelled",
        }
    }
}
