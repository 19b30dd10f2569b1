//! Core asset lifecycle engine.

use crate::error::LedgerError;
use custos_access::AccessControl;
use custos_store::{
    AssetRecord, AssetStore, BrandStore, HistoryStore, OwnerHistoryEntry, StoreError,
};
use custos_types::{
    AccountAddress, Amount, AssetId, OrderId, Timestamp, VerificationStatus,
};
use std::sync::Arc;

/// The asset ledger — sole writer of asset records.
///
/// Ids are handed out sequentially starting at 1 and never reused. Every
/// operation validates caller identity and current state before the first
/// mutation, so a failed call leaves no partial state behind.
pub struct AssetLedger<S> {
    store: Arc<S>,
    next_id: AssetId,
}

impl<S: AssetStore + HistoryStore> AssetLedger<S> {
    /// Build a ledger over `store`, resuming the id sequence from the
    /// number of assets already present (ids are dense and never deleted).
    pub fn new(store: Arc<S>) -> Result<Self, LedgerError> {
        let count = store.asset_count()?;
        Ok(Self {
            store,
            next_id: AssetId::new(count + 1),
        })
    }

    // ── Registration and verification ────────────────────────────────────

    /// Brand path: caller must be an authorized brand; the asset enters the
    /// catalog already verified, owned by the brand.
    pub fn register_asset<B: BrandStore>(
        &mut self,
        access: &AccessControl<B>,
        caller: &AccountAddress,
        name: impl Into<String>,
        serial_number: impl Into<String>,
        metadata_uri: impl Into<String>,
        now: Timestamp,
    ) -> Result<AssetRecord, LedgerError> {
        access.require_authorized_brand(caller)?;
        self.insert_asset(
            caller,
            Some(caller.clone()),
            name.into(),
            serial_number.into(),
            metadata_uri.into(),
            VerificationStatus::Verified,
            now,
        )
    }

    /// User path: anyone may register; the asset starts `Pending` with no
    /// brand until a verification verdict records one.
    pub fn register_asset_by_user(
        &mut self,
        caller: &AccountAddress,
        name: impl Into<String>,
        serial_number: impl Into<String>,
        metadata_uri: impl Into<String>,
        now: Timestamp,
    ) -> Result<AssetRecord, LedgerError> {
        self.insert_asset(
            caller,
            None,
            name.into(),
            serial_number.into(),
            metadata_uri.into(),
            VerificationStatus::Pending,
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_asset(
        &mut self,
        owner: &AccountAddress,
        brand: Option<AccountAddress>,
        name: String,
        serial_number: String,
        metadata_uri: String,
        status: VerificationStatus,
        now: Timestamp,
    ) -> Result<AssetRecord, LedgerError> {
        if self.store.asset_id_by_serial(&serial_number)?.is_some() {
            return Err(LedgerError::DuplicateSerialNumber(serial_number));
        }
        let record = AssetRecord {
            id: self.next_id,
            owner: owner.clone(),
            brand,
            name,
            serial_number,
            metadata_uri,
            status,
            created_at: now,
            is_listed: false,
            price: Amount::ZERO,
            open_order: None,
        };
        match self.store.put_new_asset(&record) {
            Ok(()) => {}
            Err(StoreError::Duplicate(key)) => {
                return Err(LedgerError::DuplicateSerialNumber(key));
            }
            Err(e) => return Err(e.into()),
        }
        self.store.append_owner(record.id, owner, now)?;
        self.next_id = self.next_id.next();
        Ok(record)
    }

    /// Decide a pending asset's provenance claim.
    ///
    /// Caller must be the administrator or the referenced brand itself
    /// (which must be authorized). Legal only while the asset is `Pending`;
    /// the verdict must be `Verified` or `Rejected`.
    pub fn verify_asset<B: BrandStore>(
        &mut self,
        access: &AccessControl<B>,
        caller: &AccountAddress,
        asset_id: AssetId,
        verdict: VerificationStatus,
        brand: &AccountAddress,
        _now: Timestamp,
    ) -> Result<AssetRecord, LedgerError> {
        if !verdict.is_verdict() {
            return Err(LedgerError::InvalidState(format!(
                "{verdict} is not a verification verdict"
            )));
        }
        if !access.is_admin(caller) {
            if caller != brand {
                return Err(LedgerError::Unauthorized(format!(
                    "{caller} is neither the administrator nor the referenced brand"
                )));
            }
            access.require_authorized_brand(caller)?;
        }
        let mut record = self.asset(asset_id)?;
        if !record.status.is_pending() {
            return Err(LedgerError::InvalidState(format!(
                "{asset_id} is {}, not pending",
                record.status
            )));
        }
        record.status = verdict;
        record.brand = Some(brand.clone());
        self.store.update_asset(&record)?;
        Ok(record)
    }

    // ── Listing and transfer ─────────────────────────────────────────────

    /// List a verified, unencumbered asset at a positive price.
    pub fn list_asset(
        &mut self,
        caller: &AccountAddress,
        asset_id: AssetId,
        price: Amount,
    ) -> Result<AssetRecord, LedgerError> {
        let mut record = self.asset(asset_id)?;
        require_owner(&record, caller)?;
        require_no_open_order(&record)?;
        if !record.status.can_list() {
            return Err(LedgerError::InvalidState(format!(
                "{asset_id} is {}, only verified assets may be listed",
                record.status
            )));
        }
        if record.is_listed {
            return Err(LedgerError::InvalidState(format!(
                "{asset_id} is already listed"
            )));
        }
        if price.is_zero() {
            return Err(LedgerError::PriceMismatch(
                "listing price must be greater than zero".into(),
            ));
        }
        record.is_listed = true;
        record.price = price;
        self.store.update_asset(&record)?;
        Ok(record)
    }

    /// Take a listed, unencumbered asset off the market.
    pub fn unlist_asset(
        &mut self,
        caller: &AccountAddress,
        asset_id: AssetId,
    ) -> Result<AssetRecord, LedgerError> {
        let mut record = self.asset(asset_id)?;
        require_owner(&record, caller)?;
        require_no_open_order(&record)?;
        if !record.is_listed {
            return Err(LedgerError::InvalidState(format!(
                "{asset_id} is not listed"
            )));
        }
        record.is_listed = false;
        record.price = Amount::ZERO;
        self.store.update_asset(&record)?;
        Ok(record)
    }

    /// Move ownership outside any order. The asset must be unlisted and
    /// free of open orders.
    pub fn transfer_asset(
        &mut self,
        caller: &AccountAddress,
        asset_id: AssetId,
        new_owner: &AccountAddress,
        now: Timestamp,
    ) -> Result<AssetRecord, LedgerError> {
        let mut record = self.asset(asset_id)?;
        require_owner(&record, caller)?;
        require_no_open_order(&record)?;
        if record.is_listed {
            return Err(LedgerError::InvalidState(format!(
                "{asset_id} is listed; unlist before transferring"
            )));
        }
        if new_owner == &record.owner {
            return Err(LedgerError::InvalidState(
                "transfer to the current owner is a no-op".into(),
            ));
        }
        record.owner = new_owner.clone();
        self.store.update_asset(&record)?;
        self.store.append_owner(asset_id, new_owner, now)?;
        Ok(record)
    }

    // ── Order-lock surface (called by the escrow, never by end users) ────

    /// Atomically unlist the asset and lock it to `order_id`.
    ///
    /// The listing price is cleared here; the order carries the price from
    /// this point on. Also appends the order to the asset's order history.
    pub fn begin_order(
        &mut self,
        asset_id: AssetId,
        order_id: OrderId,
    ) -> Result<AssetRecord, LedgerError> {
        let mut record = self.asset(asset_id)?;
        require_no_open_order(&record)?;
        if !record.is_listed {
            return Err(LedgerError::InvalidState(format!(
                "{asset_id} is not listed"
            )));
        }
        record.is_listed = false;
        record.price = Amount::ZERO;
        record.open_order = Some(order_id);
        self.store.update_asset(&record)?;
        self.store.append_order_ref(asset_id, order_id)?;
        Ok(record)
    }

    /// Restore the pre-order listing after a refund or cancellation:
    /// owner unchanged, listed again at `price`, lock released.
    pub fn restore_listing(
        &mut self,
        asset_id: AssetId,
        order_id: OrderId,
        price: Amount,
    ) -> Result<AssetRecord, LedgerError> {
        let mut record = self.locked_asset(asset_id, order_id)?;
        record.is_listed = true;
        record.price = price;
        record.open_order = None;
        self.store.update_asset(&record)?;
        Ok(record)
    }

    /// Hand the asset to the buyer on order completion and release the lock.
    pub fn settle_to_buyer(
        &mut self,
        asset_id: AssetId,
        order_id: OrderId,
        buyer: &AccountAddress,
        now: Timestamp,
    ) -> Result<AssetRecord, LedgerError> {
        let mut record = self.locked_asset(asset_id, order_id)?;
        record.owner = buyer.clone();
        record.open_order = None;
        self.store.update_asset(&record)?;
        self.store.append_owner(asset_id, buyer, now)?;
        Ok(record)
    }

    fn locked_asset(
        &self,
        asset_id: AssetId,
        order_id: OrderId,
    ) -> Result<AssetRecord, LedgerError> {
        let record = self.asset(asset_id)?;
        if record.open_order != Some(order_id) {
            return Err(LedgerError::InvalidState(format!(
                "{asset_id} is not locked by {order_id}"
            )));
        }
        Ok(record)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn asset(&self, asset_id: AssetId) -> Result<AssetRecord, LedgerError> {
        self.store
            .get_asset(asset_id)
            .map_err(|_| LedgerError::NotFound(asset_id.to_string()))
    }

    pub fn asset_by_serial_number(&self, serial: &str) -> Result<AssetRecord, LedgerError> {
        match self.store.asset_id_by_serial(serial)? {
            Some(id) => self.asset(id),
            None => Err(LedgerError::NotFound(format!("serial {serial}"))),
        }
    }

    pub fn assets_by_owner(
        &self,
        owner: &AccountAddress,
    ) -> Result<Vec<AssetRecord>, LedgerError> {
        Ok(self.store.assets_by_owner(owner)?)
    }

    pub fn listed_assets(&self) -> Result<Vec<AssetRecord>, LedgerError> {
        Ok(self.store.listed_assets()?)
    }

    pub fn owner_history(
        &self,
        asset_id: AssetId,
    ) -> Result<Vec<OwnerHistoryEntry>, LedgerError> {
        Ok(self.store.owner_history(asset_id)?)
    }

    pub fn order_history(&self, asset_id: AssetId) -> Result<Vec<OrderId>, LedgerError> {
        Ok(self.store.order_history(asset_id)?)
    }

    pub fn asset_count(&self) -> Result<u64, LedgerError> {
        Ok(self.store.asset_count()?)
    }
}

fn require_owner(record: &AssetRecord, caller: &AccountAddress) -> Result<(), LedgerError> {
    if record.owner != *caller {
        return Err(LedgerError::Unauthorized(format!(
            "{caller} does not own {}",
            record.id
        )));
    }
    Ok(())
}

fn require_no_open_order(record: &AssetRecord) -> Result<(), LedgerError> {
    if let Some(order) = record.open_order {
        return Err(LedgerError::InvalidState(format!(
            "{} is held by open {order}",
            record.id
        )));
    }
    Ok(())
}
