//! Market policy parameters.
//!
//! Everything here is policy rather than mechanism: the state machines in
//! the asset and escrow crates consult these values but never hard-code
//! them, so fee and deadline policy can change without touching a guard.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};

/// Tunable policy values for the marketplace.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MarketParams {
    /// Percentage of the order price retained by the platform on completion.
    pub platform_fee_percent: u8,

    /// Seconds after payment during which the buyer may request a refund.
    /// The deadline itself is inclusive: a refund at exactly
    /// `paid_at + refund_window_secs` still succeeds.
    pub refund_window_secs: u64,

    /// Seconds after delivery confirmation before anyone (not just buyer or
    /// seller) may trigger `complete_order`.
    pub auto_complete_grace_secs: u64,
}

impl MarketParams {
    /// Marketplace defaults: 2% fee, 7-day refund window, 3-day grace.
    pub fn market_defaults() -> Self {
        Self {
            platform_fee_percent: 2,
            refund_window_secs: 7 * 24 * 3600,
            auto_complete_grace_secs: 3 * 24 * 3600,
        }
    }

    /// The platform's cut of `price`, rounded down. Total over the full
    /// `Amount` range: the quotient/remainder split cannot overflow, and
    /// percentages above 100 are capped so the fee never exceeds the price.
    pub fn platform_fee(&self, price: Amount) -> Amount {
        let pct = u128::from(self.platform_fee_percent.min(100));
        let raw = price.raw();
        Amount::new(raw / 100 * pct + raw % 100 * pct / 100)
    }

    /// What the seller receives after the platform fee.
    pub fn seller_proceeds(&self, price: Amount) -> Amount {
        price - self.platform_fee(price)
    }
}

impl Default for MarketParams {
    fn default() -> Self {
        Self::market_defaults()
    }
}
