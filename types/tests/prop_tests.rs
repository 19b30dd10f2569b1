use proptest::prelude::*;

use custos_types::{Amount, MarketParams, Timestamp};

proptest! {
    /// The platform fee never exceeds the price it is taken from, even for
    /// prices at the top of the range or nonsense percentages.
    #[test]
    fn fee_bounded_by_price(price in any::<u128>(), pct in any::<u8>()) {
        let params = MarketParams {
            platform_fee_percent: pct,
            ..MarketParams::market_defaults()
        };
        let price = Amount::new(price);
        prop_assert!(params.platform_fee(price) <= price);
    }

    /// Fee and seller proceeds always partition the price exactly.
    #[test]
    fn fee_split_conserves_value(price in any::<u128>(), pct in any::<u8>()) {
        let params = MarketParams {
            platform_fee_percent: pct,
            ..MarketParams::market_defaults()
        };
        let price = Amount::new(price);
        let fee = params.platform_fee(price);
        prop_assert_eq!(fee + params.seller_proceeds(price), price);
    }

    /// Checked amount arithmetic round-trips: (a + b) - b == a.
    #[test]
    fn amount_add_sub_roundtrip(a in 0u128..u128::MAX / 2, b in 0u128..u128::MAX / 2) {
        let a = Amount::new(a);
        let b = Amount::new(b);
        let sum = a.checked_add(b).unwrap();
        prop_assert_eq!(sum.checked_sub(b).unwrap(), a);
    }

    /// A deadline is never expired strictly before its boundary and always
    /// expired at or after it.
    #[test]
    fn deadline_boundary(start in 0u64..1 << 40, window in 0u64..1 << 20, offset in 0u64..1 << 20) {
        let paid = Timestamp::new(start);
        let now = Timestamp::new(start + offset);
        let expired = paid.has_expired(window, now);
        prop_assert_eq!(expired, offset >= window);
    }
}
