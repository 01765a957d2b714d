//! Proxy Context
//!
//! Everything a handler needs, built once at startup and passed to every
//! request, control message and event.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{persist, NamedCacheStore, SharedStore};
use crate::config::Config;
use crate::control::Lifecycle;
use crate::error::Result;
use crate::events::{ClientRegistry, NotificationCenter};
use crate::proxy::origin::{HttpOrigin, Origin};

// == Proxy Context ==
#[derive(Clone)]
pub struct ProxyContext {
    pub config: Arc<Config>,
    pub store: SharedStore,
    pub origin: Arc<dyn Origin>,
    pub clients: Arc<ClientRegistry>,
    pub notifications: Arc<NotificationCenter>,
    pub lifecycle: Arc<Lifecycle>,
}

impl ProxyContext {
    /// Creates a context around an existing store and origin.
    pub fn new(config: Config, store: NamedCacheStore, origin: Arc<dyn Origin>) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
            origin,
            clients: Arc::new(ClientRegistry::new()),
            notifications: Arc::new(NotificationCenter::new()),
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    /// Builds the context for `config.origin_url`, restoring tiers persisted
    /// in `config.cache_dir` when one is set.
    pub async fn open(config: &Config) -> Result<Self> {
        let origin = HttpOrigin::new(&config.origin_url, config.origin_timeout)?;
        let snapshots = match &config.cache_dir {
            Some(dir) => persist::load_snapshots(dir).await?,
            None => Vec::new(),
        };
        let store = NamedCacheStore::restore(&config.cache_version, config.quota_bytes, snapshots);
        info!(
            tiers = store.all_tier_ids().len(),
            entries = store.total_entries(),
            "cache store restored"
        );
        Ok(Self::new(config.clone(), store, Arc::new(origin)))
    }
}
