//! Administrator and brand-authorization engine.

use crate::error::AccessError;
use custos_store::{BrandRecord, BrandStore};
use custos_types::{AccountAddress, Timestamp};
use std::sync::Arc;

/// Access-control engine: one administrator, many brand records.
///
/// Brand records are created by anyone for their own address but start
/// unauthorized; only the administrator flips `is_authorized`. Records are
/// never deleted.
pub struct AccessControl<S> {
    admin: AccountAddress,
    store: Arc<S>,
}

impl<S: BrandStore> AccessControl<S> {
    pub fn new(admin: AccountAddress, store: Arc<S>) -> Self {
        Self { admin, store }
    }

    /// The platform administrator (also the platform fee account).
    pub fn admin(&self) -> &AccountAddress {
        &self.admin
    }

    /// Register the caller as a brand. Fails if the caller already has a
    /// brand record; the name is fixed at registration.
    pub fn register_brand(
        &mut self,
        caller: &AccountAddress,
        name: impl Into<String>,
        now: Timestamp,
    ) -> Result<BrandRecord, AccessError> {
        if self.store.brand_exists(caller)? {
            return Err(AccessError::AlreadyExists(caller.clone()));
        }
        let record = BrandRecord {
            address: caller.clone(),
            name: name.into(),
            is_authorized: false,
            registered_at: now,
        };
        self.store.put_brand(&record)?;
        Ok(record)
    }

    /// Admin-only: flip a brand's authorization flag.
    pub fn authorize_brand(
        &mut self,
        caller: &AccountAddress,
        brand: &AccountAddress,
        authorized: bool,
    ) -> Result<BrandRecord, AccessError> {
        self.require_admin(caller)?;
        let mut record = self
            .store
            .get_brand(brand)
            .map_err(|_| AccessError::NotFound(brand.clone()))?;
        record.is_authorized = authorized;
        self.store.put_brand(&record)?;
        Ok(record)
    }

    pub fn is_admin(&self, account: &AccountAddress) -> bool {
        self.admin == *account
    }

    /// Whether `account` has a brand record with authorization granted.
    pub fn is_authorized_brand(&self, account: &AccountAddress) -> Result<bool, AccessError> {
        match self.store.get_brand(account) {
            Ok(record) => Ok(record.is_authorized),
            Err(custos_store::StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn brand(&self, account: &AccountAddress) -> Result<BrandRecord, AccessError> {
        self.store
            .get_brand(account)
            .map_err(|_| AccessError::NotFound(account.clone()))
    }

    pub fn brands(&self) -> Result<Vec<BrandRecord>, AccessError> {
        Ok(self.store.iter_brands()?)
    }

    /// How many brands currently hold authorization.
    pub fn authorized_brand_count(&self) -> Result<u64, AccessError> {
        Ok(self.store.authorized_brand_count()?)
    }

    // ── Guards ───────────────────────────────────────────────────────────

    pub fn require_admin(&self, caller: &AccountAddress) -> Result<(), AccessError> {
        if !self.is_admin(caller) {
            return Err(AccessError::Unauthorized(format!(
                "{caller} is not the administrator"
            )));
        }
        Ok(())
    }

    pub fn require_authorized_brand(&self, caller: &AccountAddress) -> Result<(), AccessError> {
        if !self.is_authorized_brand(caller)? {
            return Err(AccessError::Unauthorized(format!(
                "{caller} is not an authorized brand"
            )));
        }
        Ok(())
    }
}
