//! Cache Store Module
//!
//! Named, version-tagged tiers. Each tier is a HashMap of entries plus an
//! insertion-order tracker; every write runs its eviction check before it
//! returns.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::cache::persist::TierSnapshot;
use crate::cache::{CacheEntry, CacheStats, CacheTier, InsertionOrder, RequestKey, StoredResponse};
use crate::error::{ProxyError, Result};

// == Tier Store ==
/// A single bounded tier.
#[derive(Debug)]
pub struct TierStore {
    entries: HashMap<RequestKey, CacheEntry>,
    order: InsertionOrder,
    bound: usize,
    next_index: u64,
}

impl TierStore {
    pub fn new(bound: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            bound,
            next_index: 0,
        }
    }

    /// Rebuilds a tier from a snapshot, trimming it to the bound.
    pub fn from_snapshot(bound: usize, snapshot: TierSnapshot) -> (Self, Vec<CacheEntry>) {
        let mut tier = Self::new(bound);
        let mut entries = snapshot.entries;
        entries.sort_by_key(|e| e.insertion_index);
        for entry in entries {
            tier.order.record(&entry.key);
            tier.entries.insert(entry.key.clone(), entry);
        }
        tier.next_index = snapshot
            .next_index
            .max(tier.entries.values().map(|e| e.insertion_index + 1).max().unwrap_or(0));
        let evicted = tier.evict_excess(0);
        (tier, evicted)
    }

    pub fn get(&self, key: &RequestKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Keys that would be evicted if `key` were written now, oldest first.
    fn planned_evictions(&self, key: &RequestKey) -> Vec<&RequestKey> {
        let incoming = usize::from(!self.entries.contains_key(key));
        let excess = (self.entries.len() + incoming).saturating_sub(self.bound);
        self.order.iter().filter(|k| *k != key).take(excess).collect()
    }

    /// Removes the oldest entries until `len + reserve <= bound`.
    fn evict_excess(&mut self, reserve: usize) -> Vec<CacheEntry> {
        let mut evicted = Vec::new();
        while self.entries.len() + reserve > self.bound {
            match self.order.evict_oldest() {
                Some(oldest) => {
                    if let Some(entry) = self.entries.remove(&oldest) {
                        evicted.push(entry);
                    }
                }
                None => break,
            }
        }
        evicted
    }

    /// Writes an entry, evicting the oldest entries first if the key is new.
    ///
    /// An existing key is replaced whole and keeps its insertion position.
    /// Returns the replaced entry (if any) and the evicted entries.
    pub fn put(
        &mut self,
        key: RequestKey,
        response: StoredResponse,
    ) -> (Option<CacheEntry>, Vec<CacheEntry>) {
        if let Some(existing) = self.entries.get(&key) {
            let entry = CacheEntry::new(key.clone(), response, existing.insertion_index);
            let replaced = self.entries.insert(key, entry);
            return (replaced, Vec::new());
        }

        let evicted = self.evict_excess(1);
        let entry = CacheEntry::new(key.clone(), response, self.next_index);
        self.next_index += 1;
        self.order.record(&key);
        self.entries.insert(key, entry);
        (None, evicted)
    }

    pub fn delete(&mut self, key: &RequestKey) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.remove(key);
        }
        removed
    }

    /// Keys from oldest to newest.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn size_bytes(&self) -> usize {
        self.entries.values().map(CacheEntry::size_bytes).sum()
    }

    /// Entries from oldest to newest, for snapshots.
    pub fn snapshot(&self, id: &str) -> TierSnapshot {
        TierSnapshot {
            id: id.to_string(),
            next_index: self.next_index,
            entries: self
                .order
                .iter()
                .filter_map(|k| self.entries.get(k).cloned())
                .collect(),
        }
    }
}

// == Named Cache Store ==
/// All tiers of the proxy, keyed by their versioned identifier.
#[derive(Debug)]
pub struct NamedCacheStore {
    tiers: HashMap<String, TierStore>,
    version: String,
    quota_bytes: usize,
    used_bytes: usize,
    stats: CacheStats,
    /// Tier ids written since the last flush
    dirty: BTreeSet<String>,
    /// Tier ids deleted since the last flush
    removed: BTreeSet<String>,
}

impl NamedCacheStore {
    // == Constructor ==
    /// Creates an empty store for the given version tag and byte quota.
    pub fn new(version: impl Into<String>, quota_bytes: usize) -> Self {
        Self {
            tiers: HashMap::new(),
            version: version.into(),
            quota_bytes,
            used_bytes: 0,
            stats: CacheStats::new(),
            dirty: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    /// Creates a store pre-populated from persisted snapshots.
    ///
    /// Tiers of other versions are restored too, so activation can collect them.
    pub fn restore(
        version: impl Into<String>,
        quota_bytes: usize,
        snapshots: Vec<TierSnapshot>,
    ) -> Self {
        let mut store = Self::new(version, quota_bytes);
        for snapshot in snapshots {
            let id = snapshot.id.clone();
            let (tier, evicted) = TierStore::from_snapshot(bound_for_id(&id), snapshot);
            if !evicted.is_empty() {
                store.dirty.insert(id.clone());
            }
            store.used_bytes += tier.size_bytes();
            store.tiers.insert(id, tier);
        }
        store.refresh_totals();
        store
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Identifier of a tier in the current version.
    pub fn tier_id(&self, tier: CacheTier) -> String {
        tier.id(&self.version)
    }

    // == Get ==
    /// Looks up a response; counts a hit or a miss.
    pub fn get(&mut self, tier: CacheTier, key: &RequestKey) -> Option<CacheEntry> {
        let found = self
            .tiers
            .get(&tier.id(&self.version))
            .and_then(|t| t.get(key))
            .cloned();
        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    /// Presence check that does not touch statistics.
    pub fn contains(&self, tier: CacheTier, key: &RequestKey) -> bool {
        self.tiers
            .get(&tier.id(&self.version))
            .is_some_and(|t| t.get(key).is_some())
    }

    // == Put ==
    /// Stores a response and enforces the tier bound in the same step.
    ///
    /// Fails with `QuotaExceeded` when the write would push the stored bytes
    /// over the quota; the tier is left untouched in that case.
    pub fn put(&mut self, tier: CacheTier, key: RequestKey, response: StoredResponse) -> Result<()> {
        let id = tier.id(&self.version);
        let slot = self
            .tiers
            .entry(id.clone())
            .or_insert_with(|| TierStore::new(tier.bound()));

        let replaced_bytes = slot.get(&key).map_or(0, CacheEntry::size_bytes);
        let evicted_bytes: usize = slot
            .planned_evictions(&key)
            .into_iter()
            .filter_map(|k| slot.get(k))
            .map(CacheEntry::size_bytes)
            .sum();
        let projected = self.used_bytes - replaced_bytes - evicted_bytes + response.body.len();
        if projected > self.quota_bytes {
            self.stats.record_rejected_write();
            return Err(ProxyError::QuotaExceeded(format!(
                "writing {} to {} needs {} bytes, quota is {}",
                key, id, projected, self.quota_bytes
            )));
        }

        let (_, evicted) = slot.put(key, response);
        if !evicted.is_empty() {
            debug!(tier = %id, count = evicted.len(), "evicted oldest entries");
        }
        self.stats.record_evictions(evicted.len());
        self.used_bytes = projected;
        self.removed.remove(&id);
        self.dirty.insert(id);
        self.refresh_totals();
        Ok(())
    }

    // == Keys ==
    /// Keys of a tier in insertion order.
    pub fn keys(&self, tier: CacheTier) -> Vec<RequestKey> {
        self.tiers
            .get(&tier.id(&self.version))
            .map(TierStore::keys)
            .unwrap_or_default()
    }

    // == Delete ==
    /// Removes one entry; returns whether it existed.
    pub fn delete(&mut self, tier: CacheTier, key: &RequestKey) -> bool {
        let id = tier.id(&self.version);
        let removed = self.tiers.get_mut(&id).and_then(|t| t.delete(key));
        match removed {
            Some(entry) => {
                self.used_bytes -= entry.size_bytes();
                self.dirty.insert(id);
                self.refresh_totals();
                true
            }
            None => false,
        }
    }

    /// Drops a whole tier of the current version.
    pub fn delete_tier(&mut self, tier: CacheTier) -> bool {
        let id = tier.id(&self.version);
        self.delete_tier_id(&id)
    }

    /// Drops a tier by raw identifier, including tiers of other versions.
    pub fn delete_tier_id(&mut self, id: &str) -> bool {
        match self.tiers.remove(id) {
            Some(tier) => {
                self.used_bytes -= tier.size_bytes();
                self.dirty.remove(id);
                self.removed.insert(id.to_string());
                self.refresh_totals();
                true
            }
            None => false,
        }
    }

    /// Identifiers of every existing tier, sorted.
    pub fn all_tier_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tiers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Existing tiers that do not belong to the current version.
    pub fn orphaned_tier_ids(&self) -> Vec<String> {
        let current: Vec<String> = CacheTier::ALL.iter().map(|t| self.tier_id(*t)).collect();
        self.all_tier_ids()
            .into_iter()
            .filter(|id| !current.contains(id))
            .collect()
    }

    /// Deletes every tier; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let ids = self.all_tier_ids();
        ids.iter().filter(|id| self.delete_tier_id(id)).count()
    }

    // == Length ==
    pub fn len(&self, tier: CacheTier) -> usize {
        self.tiers
            .get(&tier.id(&self.version))
            .map_or(0, TierStore::len)
    }

    /// Entry count summed over every existing tier.
    pub fn total_entries(&self) -> usize {
        self.tiers.values().map(TierStore::len).sum()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Entry counts per existing tier id.
    pub fn tier_sizes(&self) -> Vec<(String, usize)> {
        self.all_tier_ids()
            .into_iter()
            .map(|id| {
                let len = self.tiers.get(&id).map_or(0, TierStore::len);
                (id, len)
            })
            .collect()
    }

    // == Persistence ==
    /// Returns snapshots of tiers written since the last call, plus the ids
    /// of tiers deleted since then, and clears both sets.
    pub fn take_dirty(&mut self) -> (Vec<TierSnapshot>, Vec<String>) {
        let dirty = std::mem::take(&mut self.dirty);
        let removed = std::mem::take(&mut self.removed);
        let snapshots = dirty
            .iter()
            .filter_map(|id| self.tiers.get(id).map(|t| t.snapshot(id)))
            .collect();
        (snapshots, removed.into_iter().collect())
    }

    /// Puts back tiers whose flush did not complete so the next flush
    /// retries them. Ids whose state changed in the meantime are skipped.
    pub fn requeue_dirty(&mut self, dirty: Vec<String>, removed: Vec<String>) {
        for id in dirty {
            if self.tiers.contains_key(&id) {
                self.dirty.insert(id);
            }
        }
        for id in removed {
            if !self.tiers.contains_key(&id) {
                self.removed.insert(id);
            }
        }
    }

    fn refresh_totals(&mut self) {
        let entries = self.total_entries();
        self.stats.set_totals(entries, self.used_bytes);
    }
}

/// Bound for a tier identifier of any version; unknown prefixes are unbounded.
fn bound_for_id(id: &str) -> usize {
    let prefix = id.rsplit_once("-v").map_or(id, |(p, _)| p);
    CacheTier::ALL
        .iter()
        .find(|t| t.prefix() == prefix)
        .map_or(usize::MAX, |t| t.bound())
}
