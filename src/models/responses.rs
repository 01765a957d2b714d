//! Response DTOs for the proxy control API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::control::LifecycleStatus;

/// Entry count of one tier.
#[derive(Debug, Clone, Serialize)]
pub struct TierSize {
    pub id: String,
    pub entries: usize,
}

/// Response body for the stats endpoint (GET /__proxy/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejected_writes: u64,
    pub total_entries: usize,
    pub total_bytes: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub tiers: Vec<TierSize>,
    pub lifecycle: LifecycleStatus,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, tiers: Vec<(String, usize)>, lifecycle: LifecycleStatus) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            rejected_writes: stats.rejected_writes,
            total_entries: stats.total_entries,
            total_bytes: stats.total_bytes,
            tiers: tiers
                .into_iter()
                .map(|(id, entries)| TierSize { id, entries })
                .collect(),
            lifecycle,
        }
    }
}

/// Response body for the connectivity event (POST /__proxy/events/online)
#[derive(Debug, Clone, Serialize)]
pub struct BackOnlineResponse {
    /// Number of clients that received the notice
    pub delivered: usize,
}

/// Response body for the health endpoint (GET /__proxy/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
