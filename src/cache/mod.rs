//! Cache Module
//!
//! Version-tagged named tiers with per-tier FIFO bounds and JSON snapshots.

mod entry;
mod fifo;
pub mod persist;
mod stats;
mod store;
mod tier;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, RequestKey, StoredResponse};
pub use fifo::InsertionOrder;
pub use persist::TierSnapshot;
pub use stats::CacheStats;
pub use store::{NamedCacheStore, TierStore};
pub use tier::CacheTier;

/// Store handle shared by every task of the proxy.
pub type SharedStore = Arc<RwLock<NamedCacheStore>>;
