//! Snapshot Flush Task
//!
//! Background task that periodically writes changed tiers to disk and
//! removes the snapshots of deleted tiers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{persist, SharedStore};
use crate::error::Result;

/// Writes every tier changed since the last flush.
///
/// The write lock is held only while collecting snapshots; file I/O runs
/// after it is released. When a write fails, the tiers not yet written are
/// queued again so the next flush retries them. Returns the number of
/// snapshot files touched.
pub async fn flush_dirty(store: &SharedStore, dir: &Path) -> Result<usize> {
    let (snapshots, removed) = {
        let mut store_guard = store.write().await;
        store_guard.take_dirty()
    };

    let mut touched = 0;
    for (i, id) in removed.iter().enumerate() {
        if let Err(e) = persist::remove_snapshot(dir, id).await {
            let pending = snapshots.into_iter().map(|s| s.id).collect();
            store.write().await.requeue_dirty(pending, removed[i..].to_vec());
            return Err(e);
        }
        touched += 1;
    }
    for (i, snapshot) in snapshots.iter().enumerate() {
        if let Err(e) = persist::write_snapshot(dir, snapshot).await {
            let pending = snapshots[i..].iter().map(|s| s.id.clone()).collect();
            store.write().await.requeue_dirty(pending, Vec::new());
            return Err(e);
        }
        touched += 1;
    }
    Ok(touched)
}

async fn flush_logged(store: &SharedStore, dir: &Path) {
    match flush_dirty(store, dir).await {
        Ok(0) => debug!("snapshot flush: nothing changed"),
        Ok(touched) => info!("snapshot flush: wrote {} tier files", touched),
        Err(e) => warn!(error = %e, "snapshot flush failed, will retry"),
    }
}

/// Spawns a background task that flushes dirty tiers every
/// `flush_interval_secs` seconds.
///
/// Failures are logged and the loop keeps going. When `shutdown` changes
/// (or its sender is dropped) the task runs one last flush and exits; a
/// flush already in progress always completes first.
pub fn spawn_flush_task(
    store: SharedStore,
    dir: PathBuf,
    flush_interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(flush_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting snapshot flush task with interval of {} seconds",
            flush_interval_secs
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => flush_logged(&store, &dir).await,
                _ = shutdown.changed() => {
                    info!("Flush task stopping, writing final snapshots");
                    flush_logged(&store, &dir).await;
                    break;
                }
            }
        }
    })
}
