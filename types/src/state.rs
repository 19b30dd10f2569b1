//! State enums for asset verification and order lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The provenance-verification state of an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Asset exists but no verification claim has been made.
    /// Kept for indexer compatibility; neither registration path produces it.
    Unverified,
    /// User-registered asset awaiting a brand or admin decision.
    Pending,
    /// Provenance claim accepted; the asset is marketplace-eligible.
    Verified,
    /// Provenance claim rejected; the asset stays in the catalog but cannot be listed.
    Rejected,
}

impl VerificationStatus {
    /// Whether a verification decision is still possible.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether this status is a legal outcome of `verify_asset`.
    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }

    /// Only verified assets may be listed for sale.
    pub fn can_list(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// The lifecycle state of an escrowed order.
///
/// "No order" is represented by order absence, not a variant. The legal
/// forward path is `Created → Paid → Shipped → Delivered → Completed`;
/// `Refunded` is reachable from Paid/Shipped/Delivered, `Cancelled` only
/// from Created. `Disputed` has no in-core producer — arbitration is an
/// external process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order exists but payment has not been taken. Unreachable under
    /// pay-on-create; retained for the defensive cancellation path.
    Created,
    /// Payment is held in escrow.
    Paid,
    /// Seller has shipped the item.
    Shipped,
    /// Buyer has confirmed receipt.
    Delivered,
    /// Funds released to seller and platform; ownership moved to the buyer.
    Completed,
    /// A party contested the order; resolution is external to the core.
    Disputed,
    /// Full price returned to the buyer; listing restored.
    Refunded,
    /// Order abandoned before payment; listing restored.
    Cancelled,
}

impl OrderStatus {
    /// Terminal states release (or never held) the escrowed funds and free
    /// the asset's order lock.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded | Self::Cancelled)
    }

    /// Open orders hold the asset's order lock.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// States from which a buyer refund is still possible.
    pub fn refundable(&self) -> bool {
        matches!(self, Self::Paid | Self::Shipped | Self::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Disputed => "disputed",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_not_open() {
        for s in [
            OrderStatus::Completed,
            OrderStatus::Refunded,
            OrderStatus::Cancelled,
        ] {
            assert!(s.is_terminal());
            assert!(!s.is_open());
        }
    }

    #[test]
    fn disputed_keeps_the_order_open() {
        assert!(OrderStatus::Disputed.is_open());
        assert!(!OrderStatus::Disputed.refundable());
    }

    #[test]
    fn only_verdicts_close_verification() {
        assert!(VerificationStatus::Verified.is_verdict());
        assert!(VerificationStatus::Rejected.is_verdict());
        assert!(!VerificationStatus::Pending.is_verdict());
        assert!(!VerificationStatus::Unverified.is_verdict());
    }
}
