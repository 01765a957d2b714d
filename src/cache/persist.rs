//! Snapshot Persistence Module
//!
//! Serializes tiers to one JSON file per tier identifier so cached
//! responses survive a restart.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::error::{ProxyError, Result};

const SNAPSHOT_EXTENSION: &str = "json";

// == Tier Snapshot ==
/// On-disk form of one tier, entries ordered oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSnapshot {
    pub id: String,
    pub next_index: u64,
    pub entries: Vec<CacheEntry>,
}

fn snapshot_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.{}", id, SNAPSHOT_EXTENSION))
}

// == Load ==
/// Reads every snapshot in `dir`.
///
/// A missing directory yields no snapshots. Files that fail to decode are
/// logged and skipped so the affected tier starts empty.
pub async fn load_snapshots(dir: &Path) -> Result<Vec<TierSnapshot>> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut snapshots = Vec::new();
    while let Some(file) = read_dir.next_entry().await? {
        let path = file.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
            continue;
        }
        match read_snapshot(&path).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable tier snapshot"),
        }
    }
    debug!(count = snapshots.len(), "loaded tier snapshots");
    Ok(snapshots)
}

async fn read_snapshot(path: &Path) -> Result<TierSnapshot> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes).map_err(|e| ProxyError::CorruptEntry(e.to_string()))
}

// == Write ==
/// Writes a snapshot atomically (temp file, then rename).
pub async fn write_snapshot(dir: &Path, snapshot: &TierSnapshot) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let bytes =
        serde_json::to_vec(snapshot).map_err(|e| ProxyError::Storage(e.to_string()))?;
    let target = snapshot_path(dir, &snapshot.id);
    let tmp = target.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &target).await?;
    Ok(())
}

// == Remove ==
/// Deletes the snapshot of a tier; a missing file is not an error.
pub async fn remove_snapshot(dir: &Path, id: &str) -> Result<()> {
    match tokio::fs::remove_file(snapshot_path(dir, id)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{RequestKey, StoredResponse};

    fn snapshot(id: &str) -> TierSnapshot {
        TierSnapshot {
            id: id.to_string(),
            next_index: 1,
            entries: vec![CacheEntry::new(
                RequestKey::get("/app.css"),
                StoredResponse::new(200, vec![("content-type".into(), "text/css".into())], "body{}"),
                0,
            )],
        }
    }

    #[tokio::test]
    async fn test_missing_dir_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = load_snapshots(&dir.path().join("absent")).await.unwrap();
        assert!(snapshots.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();

        write_snapshot(dir.path(), &snapshot("static-v2")).await.unwrap();
        let loaded = load_snapshots(dir.path()).await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "static-v2");
        assert_eq!(loaded[0].entries[0].response.body, b"body{}");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();

        write_snapshot(dir.path(), &snapshot("api-v2")).await.unwrap();
        tokio::fs::write(dir.path().join("images-v2.json"), b"{not json")
            .await
            .unwrap();

        let loaded = load_snapshots(dir.path()).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "api-v2");
    }

    #[tokio::test]
    async fn test_remove_snapshot() {
        let dir = tempfile::tempdir().unwrap();

        write_snapshot(dir.path(), &snapshot("api-v2")).await.unwrap();
        remove_snapshot(dir.path(), "api-v2").await.unwrap();
        remove_snapshot(dir.path(), "api-v2").await.unwrap();

        assert!(load_snapshots(dir.path()).await.unwrap().is_empty());
    }
}
