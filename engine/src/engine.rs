//! The market engine facade.
//!
//! [`MarketEngine`] is the single writer for the whole ledger. Every
//! mutation goes through one of its operations, which delegate to the
//! access-control, asset-ledger, and escrow components, then record the
//! committed transition: append to the event log, fan out on the bus, and
//! log at info level. A rejected operation logs at warn level and commits
//! nothing.

use std::sync::Arc;

use tracing::{info, warn};

use custos_access::AccessControl;
use custos_assets::AssetLedger;
use custos_escrow::{CompletedOrder, OrderEscrow};
use custos_events::{EventBus, EventLog, MarketEvent, SequencedEvent};
use custos_store::{
    AssetRecord, AssetStore, BrandRecord, BrandStore, HistoryStore, MemoryStore, OrderRecord,
    OrderStore, OwnerHistoryEntry,
};
use custos_types::{
    AccountAddress, Amount, AssetId, MarketParams, OrderId, Timestamp, VerificationStatus,
};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Single-writer facade over the full market: access control, asset
/// ledger, order escrow, event log, and event bus share one store.
///
/// All operations take explicit timestamps, so the engine is fully
/// deterministic; the caller owns the clock.
pub struct MarketEngine<S> {
    access: AccessControl<S>,
    ledger: AssetLedger<S>,
    escrow: OrderEscrow<S>,
    params: MarketParams,
    log: EventLog,
    bus: EventBus,
}

impl MarketEngine<MemoryStore> {
    /// An engine over a fresh in-memory store, configured from `config`.
    pub fn in_memory(config: &EngineConfig) -> Result<Self, EngineError> {
        let admin = config.admin_address()?;
        Self::new(admin, config.params(), Arc::new(MemoryStore::new()))
    }
}

impl<S> MarketEngine<S>
where
    S: BrandStore + AssetStore + OrderStore + HistoryStore,
{
    /// Build an engine over `store`. Id sequences resume from whatever the
    /// store already holds; the event log starts empty (it is not part of
    /// the store).
    ///
    /// Rejects policy values no completion could honour, so the fee split
    /// inside `complete_order` can assume `fee <= price`.
    pub fn new(
        admin: AccountAddress,
        params: MarketParams,
        store: Arc<S>,
    ) -> Result<Self, EngineError> {
        if params.platform_fee_percent > 100 {
            return Err(EngineError::Config(format!(
                "platform_fee_percent {} exceeds 100",
                params.platform_fee_percent
            )));
        }
        let access = AccessControl::new(admin, Arc::clone(&store));
        let ledger = AssetLedger::new(Arc::clone(&store))?;
        let escrow = OrderEscrow::new(store)?;
        Ok(Self {
            access,
            ledger,
            escrow,
            params,
            log: EventLog::new(),
            bus: EventBus::new(),
        })
    }

    pub fn admin(&self) -> &AccountAddress {
        self.access.admin()
    }

    pub fn params(&self) -> &MarketParams {
        &self.params
    }

    // ── Brands ───────────────────────────────────────────────────────────

    /// Register the caller as a brand (unauthorized until the admin approves).
    pub fn register_brand(
        &mut self,
        caller: &AccountAddress,
        name: impl Into<String>,
        now: Timestamp,
    ) -> Result<BrandRecord, EngineError> {
        let record = self
            .access
            .register_brand(caller, name, now)
            .map_err(|e| reject("register_brand", e))?;
        info!(brand = %record.address, name = %record.name, "brand registered");
        self.commit(
            MarketEvent::BrandRegistered {
                brand: record.address.clone(),
                name: record.name.clone(),
            },
            now,
        );
        Ok(record)
    }

    /// Admin-only: grant or revoke a brand's authorization.
    pub fn authorize_brand(
        &mut self,
        caller: &AccountAddress,
        brand: &AccountAddress,
        authorized: bool,
        now: Timestamp,
    ) -> Result<BrandRecord, EngineError> {
        let record = self
            .access
            .authorize_brand(caller, brand, authorized)
            .map_err(|e| reject("authorize_brand", e))?;
        info!(brand = %record.address, authorized, "brand authorization updated");
        self.commit(
            MarketEvent::BrandAuthorized {
                brand: record.address.clone(),
                authorized,
            },
            now,
        );
        Ok(record)
    }

    // ── Assets ───────────────────────────────────────────────────────────

    /// Brand path: the asset enters the catalog already verified.
    pub fn register_asset(
        &mut self,
        caller: &AccountAddress,
        name: impl Into<String>,
        serial_number: impl Into<String>,
        metadata_uri: impl Into<String>,
        now: Timestamp,
    ) -> Result<AssetRecord, EngineError> {
        let record = self
            .ledger
            .register_asset(&self.access, caller, name, serial_number, metadata_uri, now)
            .map_err(|e| reject("register_asset", e))?;
        self.commit_registered(&record, now);
        Ok(record)
    }

    /// User path: the asset starts pending verification.
    pub fn register_asset_by_user(
        &mut self,
        caller: &AccountAddress,
        name: impl Into<String>,
        serial_number: impl Into<String>,
        metadata_uri: impl Into<String>,
        now: Timestamp,
    ) -> Result<AssetRecord, EngineError> {
        let record = self
            .ledger
            .register_asset_by_user(caller, name, serial_number, metadata_uri, now)
            .map_err(|e| reject("register_asset_by_user", e))?;
        self.commit_registered(&record, now);
        Ok(record)
    }

    fn commit_registered(&mut self, record: &AssetRecord, now: Timestamp) {
        info!(
            asset_id = %record.id,
            owner = %record.owner,
            serial = %record.serial_number,
            status = %record.status,
            "asset registered"
        );
        self.commit(
            MarketEvent::AssetRegistered {
                asset_id: record.id,
                owner: record.owner.clone(),
                brand: record.brand.clone(),
                name: record.name.clone(),
                serial_number: record.serial_number.clone(),
            },
            now,
        );
    }

    /// Decide a pending asset's provenance claim (admin or the referenced
    /// authorized brand).
    pub fn verify_asset(
        &mut self,
        caller: &AccountAddress,
        asset_id: AssetId,
        verdict: VerificationStatus,
        brand: &AccountAddress,
        now: Timestamp,
    ) -> Result<AssetRecord, EngineError> {
        let record = self
            .ledger
            .verify_asset(&self.access, caller, asset_id, verdict, brand, now)
            .map_err(|e| reject("verify_asset", e))?;
        info!(%asset_id, status = %record.status, verifier = %caller, "asset verified");
        self.commit(
            MarketEvent::AssetVerified {
                asset_id,
                status: record.status,
                verifier: caller.clone(),
            },
            now,
        );
        Ok(record)
    }

    /// List a verified asset for sale at `price`.
    pub fn list_asset(
        &mut self,
        caller: &AccountAddress,
        asset_id: AssetId,
        price: Amount,
        now: Timestamp,
    ) -> Result<AssetRecord, EngineError> {
        let record = self
            .ledger
            .list_asset(caller, asset_id, price)
            .map_err(|e| reject("list_asset", e))?;
        info!(%asset_id, seller = %record.owner, %price, "asset listed");
        self.commit(
            MarketEvent::AssetListed {
                asset_id,
                seller: record.owner.clone(),
                price,
            },
            now,
        );
        Ok(record)
    }

    /// Take an asset off the market.
    pub fn unlist_asset(
        &mut self,
        caller: &AccountAddress,
        asset_id: AssetId,
        now: Timestamp,
    ) -> Result<AssetRecord, EngineError> {
        let record = self
            .ledger
            .unlist_asset(caller, asset_id)
            .map_err(|e| reject("unlist_asset", e))?;
        info!(%asset_id, "asset unlisted");
        self.commit(MarketEvent::AssetUnlisted { asset_id }, now);
        Ok(record)
    }

    /// Move ownership outside any order (gift, off-platform sale).
    pub fn transfer_asset(
        &mut self,
        caller: &AccountAddress,
        asset_id: AssetId,
        new_owner: &AccountAddress,
        now: Timestamp,
    ) -> Result<AssetRecord, EngineError> {
        let record = self
            .ledger
            .transfer_asset(caller, asset_id, new_owner, now)
            .map_err(|e| reject("transfer_asset", e))?;
        info!(%asset_id, from = %caller, to = %new_owner, "asset transferred");
        self.commit(
            MarketEvent::AssetTransferred {
                asset_id,
                from: caller.clone(),
                to: new_owner.clone(),
            },
            now,
        );
        Ok(record)
    }

    // ── Orders ───────────────────────────────────────────────────────────

    /// Pay-on-create: buy a listed asset. The payment must equal the
    /// listing price exactly and goes into escrow custody; the asset is
    /// unlisted and locked to the new order.
    pub fn create_order(
        &mut self,
        buyer: &AccountAddress,
        asset_id: AssetId,
        payment: Amount,
        now: Timestamp,
    ) -> Result<OrderRecord, EngineError> {
        let record = self
            .escrow
            .create_order(&mut self.ledger, buyer, asset_id, payment, &self.params, now)
            .map_err(|e| reject("create_order", e))?;
        info!(
            order_id = %record.id,
            %asset_id,
            buyer = %record.buyer,
            seller = %record.seller,
            price = %record.price,
            "order created and paid"
        );
        self.commit(
            MarketEvent::OrderCreated {
                order_id: record.id,
                asset_id,
                buyer: record.buyer.clone(),
                seller: record.seller.clone(),
                price: record.price,
            },
            now,
        );
        self.commit(
            MarketEvent::OrderPaid {
                order_id: record.id,
                amount: record.price,
            },
            now,
        );
        Ok(record)
    }

    /// Seller acknowledges shipment.
    pub fn ship_order(
        &mut self,
        caller: &AccountAddress,
        order_id: OrderId,
        now: Timestamp,
    ) -> Result<OrderRecord, EngineError> {
        let record = self
            .escrow
            .ship_order(caller, order_id, now)
            .map_err(|e| reject("ship_order", e))?;
        info!(%order_id, "order shipped");
        self.commit(MarketEvent::OrderShipped { order_id }, now);
        Ok(record)
    }

    /// Buyer acknowledges receipt.
    pub fn confirm_delivery(
        &mut self,
        caller: &AccountAddress,
        order_id: OrderId,
        now: Timestamp,
    ) -> Result<OrderRecord, EngineError> {
        let record = self
            .escrow
            .confirm_delivery(caller, order_id, now)
            .map_err(|e| reject("confirm_delivery", e))?;
        info!(%order_id, "delivery confirmed");
        self.commit(MarketEvent::OrderDelivered { order_id }, now);
        Ok(record)
    }

    /// Release escrow: proceeds to the seller, fee to the platform,
    /// ownership to the buyer. Buyer or seller any time after delivery;
    /// anyone once the grace period has passed.
    pub fn complete_order(
        &mut self,
        caller: &AccountAddress,
        order_id: OrderId,
        now: Timestamp,
    ) -> Result<CompletedOrder, EngineError> {
        let platform = self.access.admin().clone();
        let done = self
            .escrow
            .complete_order(&mut self.ledger, caller, order_id, &platform, &self.params, now)
            .map_err(|e| reject("complete_order", e))?;
        info!(
            %order_id,
            asset_id = %done.order.asset_id,
            seller_proceeds = %done.seller_proceeds,
            fee = %done.fee,
            "order completed"
        );
        self.commit(
            MarketEvent::OrderCompleted {
                order_id,
                asset_id: done.order.asset_id,
                seller_proceeds: done.seller_proceeds,
                fee: done.fee,
            },
            now,
        );
        Ok(done)
    }

    /// Buyer-only: return the full price and restore the listing. Allowed
    /// until the refund deadline (inclusive) while the order is open.
    pub fn request_refund(
        &mut self,
        caller: &AccountAddress,
        order_id: OrderId,
        now: Timestamp,
    ) -> Result<OrderRecord, EngineError> {
        let record = self
            .escrow
            .request_refund(&mut self.ledger, caller, order_id, now)
            .map_err(|e| reject("request_refund", e))?;
        info!(%order_id, asset_id = %record.asset_id, amount = %record.price, "order refunded");
        self.commit(
            MarketEvent::OrderRefunded {
                order_id,
                asset_id: record.asset_id,
                amount: record.price,
            },
            now,
        );
        Ok(record)
    }

    /// Cancel an unpaid order. Pay-on-create never leaves an order unpaid,
    /// so this only resolves records a future reservation stage might
    /// create.
    pub fn cancel_order(
        &mut self,
        caller: &AccountAddress,
        order_id: OrderId,
        now: Timestamp,
    ) -> Result<OrderRecord, EngineError> {
        let record = self
            .escrow
            .cancel_order(&mut self.ledger, caller, order_id, now)
            .map_err(|e| reject("cancel_order", e))?;
        info!(%order_id, asset_id = %record.asset_id, "order cancelled");
        self.commit(
            MarketEvent::OrderCancelled {
                order_id,
                asset_id: record.asset_id,
            },
            now,
        );
        Ok(record)
    }

    // ── Events ───────────────────────────────────────────────────────────

    /// Attach an in-process listener; it sees every event committed after
    /// this call.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&MarketEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    pub fn events(&self) -> impl Iterator<Item = &SequencedEvent> {
        self.log.iter()
    }

    /// All events with `seq >= from`, for consumers resuming mid-log.
    pub fn events_from(&self, from: u64) -> &[SequencedEvent] {
        self.log.events_from(from)
    }

    pub fn event_count(&self) -> u64 {
        self.log.len()
    }

    fn commit(&mut self, event: MarketEvent, now: Timestamp) {
        let seq = self.log.append(event, now);
        let entry = self.log.last().expect("event was just appended");
        self.bus.emit(&entry.event);
        info!(seq, tag = entry.event.tag(), "event committed");
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn brand(&self, account: &AccountAddress) -> Result<BrandRecord, EngineError> {
        Ok(self.access.brand(account)?)
    }

    pub fn brands(&self) -> Result<Vec<BrandRecord>, EngineError> {
        Ok(self.access.brands()?)
    }

    pub fn is_authorized_brand(&self, account: &AccountAddress) -> Result<bool, EngineError> {
        Ok(self.access.is_authorized_brand(account)?)
    }

    pub fn asset(&self, asset_id: AssetId) -> Result<AssetRecord, EngineError> {
        Ok(self.ledger.asset(asset_id)?)
    }

    /// Provenance lookup by serial number, the primary consumer entry point.
    pub fn asset_by_serial_number(&self, serial: &str) -> Result<AssetRecord, EngineError> {
        Ok(self.ledger.asset_by_serial_number(serial)?)
    }

    pub fn assets_by_owner(
        &self,
        owner: &AccountAddress,
    ) -> Result<Vec<AssetRecord>, EngineError> {
        Ok(self.ledger.assets_by_owner(owner)?)
    }

    pub fn listed_assets(&self) -> Result<Vec<AssetRecord>, EngineError> {
        Ok(self.ledger.listed_assets()?)
    }

    pub fn owner_history(
        &self,
        asset_id: AssetId,
    ) -> Result<Vec<OwnerHistoryEntry>, EngineError> {
        Ok(self.ledger.owner_history(asset_id)?)
    }

    pub fn order_history(&self, asset_id: AssetId) -> Result<Vec<OrderId>, EngineError> {
        Ok(self.ledger.order_history(asset_id)?)
    }

    pub fn order(&self, order_id: OrderId) -> Result<OrderRecord, EngineError> {
        Ok(self.escrow.order(order_id)?)
    }

    pub fn orders_by_user(
        &self,
        account: &AccountAddress,
    ) -> Result<Vec<OrderRecord>, EngineError> {
        Ok(self.escrow.orders_by_user(account)?)
    }

    pub fn held_for_order(&self, order_id: OrderId) -> Option<Amount> {
        self.escrow.held_for_order(order_id)
    }

    /// Total funds currently in escrow custody across all open orders.
    pub fn total_held(&self) -> Amount {
        self.escrow.total_held()
    }

    /// Every fund release ever made, in release order.
    pub fn payouts(&self) -> &[custos_escrow::Payout] {
        self.escrow.payouts()
    }

    pub fn asset_count(&self) -> Result<u64, EngineError> {
        Ok(self.ledger.asset_count()?)
    }

    pub fn order_count(&self) -> Result<u64, EngineError> {
        Ok(self.escrow.order_count()?)
    }
}

fn reject(op: &'static str, err: impl Into<EngineError>) -> EngineError {
    let err = err.into();
    warn!(op, error = %err, "operation rejected");
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn in_memory_engine_uses_config_policy() {
        let config = EngineConfig {
            admin: "cst_platform".into(),
            platform_fee_percent: 5,
            ..EngineConfig::default()
        };
        let engine = MarketEngine::in_memory(&config).unwrap();
        assert_eq!(engine.admin().as_str(), "cst_platform");
        assert_eq!(engine.params().platform_fee_percent, 5);
        assert_eq!(engine.event_count(), 0);
    }

    #[test]
    fn bad_config_admin_is_rejected_before_construction() {
        let config = EngineConfig {
            admin: "platform".into(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            MarketEngine::in_memory(&config).err(),
            Some(EngineError::Config(_))
        ));
    }

    #[test]
    fn fee_percent_above_hundred_rejected_at_construction() {
        let params = MarketParams {
            platform_fee_percent: 200,
            ..MarketParams::market_defaults()
        };
        assert!(matches!(
            MarketEngine::new(
                AccountAddress::new("cst_admin"),
                params,
                Arc::new(MemoryStore::new()),
            )
            .err(),
            Some(EngineError::Config(_))
        ));
    }

    #[test]
    fn committed_operations_append_to_the_log() {
        let mut engine = MarketEngine::in_memory(&EngineConfig::default()).unwrap();
        let acme = AccountAddress::new("cst_acme");
        engine.register_brand(&acme, "Acme", t(1)).unwrap();
        assert_eq!(engine.event_count(), 1);
        assert_eq!(
            engine.events().next().unwrap().event.tag(),
            "BrandRegistered"
        );
    }

    #[test]
    fn rejected_operations_leave_the_log_untouched() {
        let mut engine = MarketEngine::in_memory(&EngineConfig::default()).unwrap();
        let acme = AccountAddress::new("cst_acme");
        engine.register_brand(&acme, "Acme", t(1)).unwrap();
        engine.register_brand(&acme, "Acme again", t(2)).unwrap_err();
        assert_eq!(engine.event_count(), 1);
    }
}
