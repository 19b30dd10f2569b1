//! Per-order fund custody.
//!
//! The vault is the only resource in the system requiring custody
//! discipline: value deposited on order creation must be released exactly
//! once, in full, on a terminal transition. Double-release and
//! release-without-terminal are the primary bug class; both are rejected
//! here rather than trusted to callers.

use crate::error::EscrowError;
use custos_types::{AccountAddress, Amount, OrderId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One recorded fund release.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub order_id: OrderId,
    pub to: AccountAddress,
    pub amount: Amount,
    pub at: Timestamp,
}

/// Escrowed funds keyed by order, with an append-only payout journal.
#[derive(Debug, Default)]
pub struct EscrowVault {
    held: HashMap<OrderId, Amount>,
    total_held: Amount,
    payouts: Vec<Payout>,
}

impl EscrowVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take custody of `amount` for `order_id`. One deposit per order, ever.
    pub fn deposit(&mut self, order_id: OrderId, amount: Amount) -> Result<(), EscrowError> {
        if self.held.contains_key(&order_id) {
            return Err(EscrowError::AlreadyHeld(order_id));
        }
        self.total_held = self
            .total_held
            .checked_add(amount)
            .ok_or_else(|| EscrowError::InvalidState("escrow balance overflow".into()))?;
        self.held.insert(order_id, amount);
        Ok(())
    }

    /// Release the full held amount for `order_id` split across `splits`.
    ///
    /// Fails if nothing is held (including a second release) or if the
    /// split amounts do not sum to exactly the held amount; on failure the
    /// deposit stays in custody untouched.
    pub fn release(
        &mut self,
        order_id: OrderId,
        splits: &[(AccountAddress, Amount)],
        at: Timestamp,
    ) -> Result<Amount, EscrowError> {
        let held = *self
            .held
            .get(&order_id)
            .ok_or(EscrowError::NothingHeld(order_id))?;
        let mut total = Amount::ZERO;
        for (_, amount) in splits {
            total = total
                .checked_add(*amount)
                .ok_or_else(|| EscrowError::InvalidState("payout overflow".into()))?;
        }
        if total != held {
            return Err(EscrowError::InvalidState(format!(
                "release of {total} does not match {held} held for {order_id}"
            )));
        }
        self.held.remove(&order_id);
        self.total_held = self.total_held - held;
        for (to, amount) in splits {
            if amount.is_zero() {
                continue;
            }
            self.payouts.push(Payout {
                order_id,
                to: to.clone(),
                amount: *amount,
                at,
            });
        }
        Ok(held)
    }

    /// Amount currently held for an order, if any.
    pub fn held_for(&self, order_id: OrderId) -> Option<Amount> {
        self.held.get(&order_id).copied()
    }

    /// Sum of all deposits not yet released.
    pub fn total_held(&self) -> Amount {
        self.total_held
    }

    /// The append-only release journal, in release order.
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(s: &str) -> AccountAddress {
        AccountAddress::new(s)
    }

    #[test]
    fn deposit_then_split_release() {
        let mut vault = EscrowVault::new();
        let order = OrderId::new(1);
        vault.deposit(order, Amount::new(100)).unwrap();
        assert_eq!(vault.held_for(order), Some(Amount::new(100)));
        assert_eq!(vault.total_held(), Amount::new(100));

        let released = vault
            .release(
                order,
                &[
                    (acct("cst_seller"), Amount::new(98)),
                    (acct("cst_platform"), Amount::new(2)),
                ],
                Timestamp::new(5),
            )
            .unwrap();
        assert_eq!(released, Amount::new(100));
        assert_eq!(vault.held_for(order), None);
        assert_eq!(vault.total_held(), Amount::ZERO);
        assert_eq!(vault.payouts().len(), 2);
    }

    #[test]
    fn double_deposit_rejected() {
        let mut vault = EscrowVault::new();
        let order = OrderId::new(1);
        vault.deposit(order, Amount::new(100)).unwrap();
        let err = vault.deposit(order, Amount::new(100)).unwrap_err();
        assert!(matches!(err, EscrowError::AlreadyHeld(_)));
        assert_eq!(vault.total_held(), Amount::new(100));
    }

    #[test]
    fn double_release_rejected() {
        let mut vault = EscrowVault::new();
        let order = OrderId::new(1);
        let buyer = acct("cst_buyer");
        vault.deposit(order, Amount::new(50)).unwrap();
        vault
            .release(order, &[(buyer.clone(), Amount::new(50))], Timestamp::new(1))
            .unwrap();
        let err = vault
            .release(order, &[(buyer, Amount::new(50))], Timestamp::new(2))
            .unwrap_err();
        assert!(matches!(err, EscrowError::NothingHeld(_)));
        assert_eq!(vault.payouts().len(), 1);
    }

    #[test]
    fn partial_release_rejected_and_custody_kept() {
        let mut vault = EscrowVault::new();
        let order = OrderId::new(1);
        vault.deposit(order, Amount::new(100)).unwrap();
        let err = vault
            .release(
                order,
                &[(acct("cst_seller"), Amount::new(99))],
                Timestamp::new(1),
            )
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidState(_)));
        assert_eq!(vault.held_for(order), Some(Amount::new(100)));
        assert!(vault.payouts().is_empty());
    }

    #[test]
    fn zero_splits_are_not_journaled() {
        let mut vault = EscrowVault::new();
        let order = OrderId::new(1);
        vault.deposit(order, Amount::new(100)).unwrap();
        vault
            .release(
                order,
                &[
                    (acct("cst_seller"), Amount::new(100)),
                    (acct("cst_platform"), Amount::ZERO),
                ],
                Timestamp::new(1),
            )
            .unwrap();
        assert_eq!(vault.payouts().len(), 1);
        assert_eq!(vault.payouts()[0].to, acct("cst_seller"));
    }
}
