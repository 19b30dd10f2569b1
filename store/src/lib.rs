//! Abstract storage traits for the Custos ledger.
//!
//! Every storage backend implements these traits; the engines depend only
//! on the traits. [`MemoryStore`] is the bundled thread-safe in-memory
//! backend used by the engine and by tests — persistent backends attach at
//! the same seam.

pub mod asset;
pub mod brand;
pub mod error;
pub mod history;
pub mod memory;
pub mod order;

pub use asset::{AssetRecord, AssetStore};
pub use brand::{BrandRecord, BrandStore};
pub use error::StoreError;
pub use history::{HistoryStore, OwnerHistoryEntry};
pub use memory::MemoryStore;
pub use order::{OrderRecord, OrderStore};
