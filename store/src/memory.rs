//! Thread-safe in-memory storage backend.
//!
//! All tables live behind a single mutex so cross-table writes (asset row +
//! serial index) commit under one lock and readers never observe a
//! half-applied update.

use crate::asset::{AssetRecord, AssetStore};
use crate::brand::{BrandRecord, BrandStore};
use crate::history::{HistoryStore, OwnerHistoryEntry};
use crate::order::{OrderRecord, OrderStore};
use crate::StoreError;
use custos_types::{AccountAddress, AssetId, OrderId, Timestamp};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    brands: HashMap<String, BrandRecord>,
    brand_order: Vec<String>,
    assets: HashMap<AssetId, AssetRecord>,
    asset_order: Vec<AssetId>,
    serial_index: HashMap<String, AssetId>,
    orders: HashMap<OrderId, OrderRecord>,
    order_order: Vec<OrderId>,
    owner_history: HashMap<AssetId, Vec<OwnerHistoryEntry>>,
    order_history: HashMap<AssetId, Vec<OrderId>>,
}

/// An in-memory store implementing every storage trait.
///
/// Thread-safe; iteration methods return records in insertion order, which
/// is the only ordering guarantee the query surface makes.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BrandStore for MemoryStore {
    fn get_brand(&self, address: &AccountAddress) -> Result<BrandRecord, StoreError> {
        self.lock()
            .brands
            .get(address.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    fn put_brand(&self, record: &BrandRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let key = record.address.as_str().to_owned();
        if !inner.brands.contains_key(&key) {
            inner.brand_order.push(key.clone());
        }
        inner.brands.insert(key, record.clone());
        Ok(())
    }

    fn brand_exists(&self, address: &AccountAddress) -> Result<bool, StoreError> {
        Ok(self.lock().brands.contains_key(address.as_str()))
    }

    fn brand_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock().brands.len() as u64)
    }

    fn iter_brands(&self) -> Result<Vec<BrandRecord>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .brand_order
            .iter()
            .filter_map(|k| inner.brands.get(k).cloned())
            .collect())
    }
}

impl AssetStore for MemoryStore {
    fn get_asset(&self, id: AssetId) -> Result<AssetRecord, StoreError> {
        self.lock()
            .assets
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn put_new_asset(&self, record: &AssetRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.serial_index.contains_key(&record.serial_number) {
            return Err(StoreError::Duplicate(record.serial_number.clone()));
        }
        if inner.assets.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id.to_string()));
        }
        inner
            .serial_index
            .insert(record.serial_number.clone(), record.id);
        inner.asset_order.push(record.id);
        inner.assets.insert(record.id, record.clone());
        Ok(())
    }

    fn update_asset(&self, record: &AssetRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.assets.contains_key(&record.id) {
            return Err(StoreError::NotFound(record.id.to_string()));
        }
        inner.assets.insert(record.id, record.clone());
        Ok(())
    }

    fn asset_exists(&self, id: AssetId) -> Result<bool, StoreError> {
        Ok(self.lock().assets.contains_key(&id))
    }

    fn asset_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock().assets.len() as u64)
    }

    fn asset_id_by_serial(&self, serial: &str) -> Result<Option<AssetId>, StoreError> {
        Ok(self.lock().serial_index.get(serial).copied())
    }

    fn iter_assets(&self) -> Result<Vec<AssetRecord>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .asset_order
            .iter()
            .filter_map(|id| inner.assets.get(id).cloned())
            .collect())
    }
}

impl OrderStore for MemoryStore {
    fn get_order(&self, id: OrderId) -> Result<OrderRecord, StoreError> {
        self.lock()
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn put_order(&self, record: &OrderRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.orders.contains_key(&record.id) {
            inner.order_order.push(record.id);
        }
        inner.orders.insert(record.id, record.clone());
        Ok(())
    }

    fn order_exists(&self, id: OrderId) -> Result<bool, StoreError> {
        Ok(self.lock().orders.contains_key(&id))
    }

    fn order_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock().orders.len() as u64)
    }

    fn iter_orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .order_order
            .iter()
            .filter_map(|id| inner.orders.get(id).cloned())
            .collect())
    }
}

impl HistoryStore for MemoryStore {
    fn append_owner(
        &self,
        asset_id: AssetId,
        owner: &AccountAddress,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        self.lock()
            .owner_history
            .entry(asset_id)
            .or_default()
            .push(OwnerHistoryEntry {
                owner: owner.clone(),
                at,
            });
        Ok(())
    }

    fn owner_history(&self, asset_id: AssetId) -> Result<Vec<OwnerHistoryEntry>, StoreError> {
        Ok(self
            .lock()
            .owner_history
            .get(&asset_id)
            .cloned()
            .unwrap_or_default())
    }

    fn append_order_ref(&self, asset_id: AssetId, order_id: OrderId) -> Result<(), StoreError> {
        self.lock()
            .order_history
            .entry(asset_id)
            .or_default()
            .push(order_id);
        Ok(())
    }

    fn order_history(&self, asset_id: AssetId) -> Result<Vec<OrderId>, StoreError> {
        Ok(self
            .lock()
            .order_history
            .get(&asset_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custos_types::{Amount, VerificationStatus};

    fn asset(id: u64, serial: &str, owner: &str) -> AssetRecord {
        AssetRecord {
            id: AssetId::new(id),
            owner: AccountAddress::new(owner),
            brand: None,
            name: "Test".into(),
            serial_number: serial.into(),
            metadata_uri: String::new(),
            status: VerificationStatus::Pending,
            created_at: Timestamp::new(1),
            is_listed: false,
            price: Amount::ZERO,
            open_order: None,
        }
    }

    #[test]
    fn duplicate_serial_rejected_and_nothing_written() {
        let store = MemoryStore::new();
        store.put_new_asset(&asset(1, "SN-1", "cst_a")).unwrap();
        let err = store.put_new_asset(&asset(2, "SN-1", "cst_b")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.asset_count().unwrap(), 1);
        assert!(!store.asset_exists(AssetId::new(2)).unwrap());
    }

    #[test]
    fn serial_index_resolves_after_insert() {
        let store = MemoryStore::new();
        store.put_new_asset(&asset(1, "SN-9", "cst_a")).unwrap();
        assert_eq!(
            store.asset_id_by_serial("SN-9").unwrap(),
            Some(AssetId::new(1))
        );
        assert_eq!(store.asset_id_by_serial("SN-10").unwrap(), None);
    }

    #[test]
    fn update_requires_existing_asset() {
        let store = MemoryStore::new();
        let err = store.update_asset(&asset(7, "SN-7", "cst_a")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let store = MemoryStore::new();
        for i in 1..=3 {
            store
                .put_new_asset(&asset(i, &format!("SN-{i}"), "cst_a"))
                .unwrap();
        }
        let ids: Vec<u64> = store
            .iter_assets()
            .unwrap()
            .iter()
            .map(|a| a.id.raw())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn histories_are_append_only_sequences() {
        let store = MemoryStore::new();
        let id = AssetId::new(1);
        let a = AccountAddress::new("cst_a");
        let b = AccountAddress::new("cst_b");
        store.append_owner(id, &a, Timestamp::new(1)).unwrap();
        store.append_owner(id, &b, Timestamp::new(2)).unwrap();
        let owners: Vec<_> = store
            .owner_history(id)
            .unwrap()
            .into_iter()
            .map(|e| e.owner)
            .collect();
        assert_eq!(owners, vec![a, b]);

        store.append_order_ref(id, OrderId::new(1)).unwrap();
        store.append_order_ref(id, OrderId::new(4)).unwrap();
        assert_eq!(
            store.order_history(id).unwrap(),
            vec![OrderId::new(1), OrderId::new(4)]
        );
    }
}
