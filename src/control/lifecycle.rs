//! Worker Lifecycle
//!
//! Install primes the static shell, activation collects tiers left over by
//! older versions, and claiming takes control of already-open clients.

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::RequestKey;
use crate::config::STATIC_ALLOW_LIST;
use crate::proxy::classify::classify_path;
use crate::proxy::origin::OriginRequest;
use crate::proxy::ProxyContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Nothing installed yet
    Parsed,
    Installing,
    /// Installed and waiting to take over
    Installed,
    Activating,
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifecycleStatus {
    pub state: WorkerState,
    /// Generation that is currently installing, waiting or active
    pub generation: u64,
}

// == Lifecycle ==
#[derive(Debug)]
pub struct Lifecycle {
    status: RwLock<LifecycleStatus>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(LifecycleStatus {
                state: WorkerState::Parsed,
                generation: 0,
            }),
        }
    }

    pub async fn status(&self) -> LifecycleStatus {
        *self.status.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        self.status.write().await.state = state;
    }
}

// == Install ==
/// Starts a new generation and primes the static allow-list.
///
/// Each path lands in the tier its class is served from, so icons and the
/// placeholder go to the Image tier. Each path is fetched independently;
/// failures are logged and skipped.
/// Returns the number of paths primed.
pub async fn install(ctx: &ProxyContext) -> usize {
    let generation = {
        let mut status = ctx.lifecycle.status.write().await;
        status.generation += 1;
        status.state = WorkerState::Installing;
        status.generation
    };
    info!(generation, "installing");

    let mut primed = 0;
    for path in STATIC_ALLOW_LIST {
        match ctx.origin.fetch(&OriginRequest::get(*path)).await {
            Ok(response) if response.is_success() => {
                let tier = classify_path(path).tier();
                let mut store = ctx.store.write().await;
                match store.put(tier, RequestKey::get(*path), response) {
                    Ok(()) => primed += 1,
                    Err(e) => warn!(path, error = %e, "could not prime static path"),
                }
            }
            Ok(response) => warn!(path, status = response.status, "origin refused static path"),
            Err(e) => warn!(path, error = %e, "could not prime static path"),
        }
    }

    ctx.lifecycle.set_state(WorkerState::Installed).await;
    info!(generation, primed, total = STATIC_ALLOW_LIST.len(), "installed, waiting");
    primed
}

// == Activate ==
/// Makes the waiting generation active and deletes orphaned tiers.
///
/// Returns the identifiers of the deleted tiers.
pub async fn activate(ctx: &ProxyContext) -> Vec<String> {
    ctx.lifecycle.set_state(WorkerState::Activating).await;

    let removed = {
        let mut store = ctx.store.write().await;
        let orphaned = store.orphaned_tier_ids();
        for id in &orphaned {
            store.delete_tier_id(id);
        }
        orphaned
    };
    if !removed.is_empty() {
        info!(tiers = ?removed, "deleted tiers of older versions");
    }

    ctx.lifecycle.set_state(WorkerState::Activated).await;
    let generation = ctx.lifecycle.status().await.generation;
    info!(generation, "activated");
    removed
}

// == Skip Waiting ==
/// Activates the waiting generation now instead of when clients close.
pub async fn skip_waiting(ctx: &ProxyContext) {
    match ctx.lifecycle.status().await.state {
        WorkerState::Installed => {
            activate(ctx).await;
        }
        WorkerState::Activated | WorkerState::Activating => {}
        state => warn!(?state, "skip waiting ignored, nothing is waiting"),
    }
}

// == Claim Clients ==
/// Puts every open client under the active generation; returns the count.
pub async fn claim_clients(ctx: &ProxyContext) -> usize {
    let status = ctx.lifecycle.status().await;
    if status.state != WorkerState::Activated {
        warn!(state = ?status.state, "claim requested before activation");
        return 0;
    }
    let claimed = ctx.clients.claim(status.generation).await;
    info!(claimed, generation = status.generation, "claimed clients");
    claimed
}
