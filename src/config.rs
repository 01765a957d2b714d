//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// == Fixed Tables ==
/// Paths primed into the Static tier at install time.
pub const STATIC_ALLOW_LIST: &[&str] = &[
    "/",
    "/manifest.json",
    "/favicon.ico",
    "/apple-touch-icon.png",
    "/images/icon-192x192.png",
    "/images/icon-512x512.png",
    "/images/placeholder.png",
    "/offline.html",
];

/// API path prefixes whose successful responses go into the Api tier.
pub const CACHEABLE_API_PREFIXES: &[&str] = &[
    "/api/movies",
    "/api/categories",
    "/api/countries",
    "/api/user/preferences",
];

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the remote origin server
    pub origin_url: String,
    /// Version tag embedded in every tier identifier
    pub cache_version: String,
    /// Directory holding tier snapshots, None = memory only
    pub cache_dir: Option<PathBuf>,
    /// Maximum total stored body bytes across all tiers
    pub quota_bytes: usize,
    /// Snapshot flush interval in seconds
    pub flush_interval: u64,
    /// Connect/read timeout of the origin client in seconds
    pub origin_timeout: u64,
    /// Activate a freshly installed generation without waiting
    pub skip_waiting: bool,
    /// Probe target for `CheckNetwork`
    pub health_path: String,
    /// Offline fallback document, served for failed navigations
    pub offline_page: String,
    /// Placeholder served for failed image loads
    pub placeholder_image: String,
    /// Icon and badge used for push notifications
    pub notification_icon: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ORIGIN_URL` - Origin base URL (default: http://127.0.0.1:8080)
    /// - `CACHE_VERSION` - Tier version tag (default: 2)
    /// - `CACHE_DIR` - Snapshot directory, empty disables (default: ./proxy-cache)
    /// - `QUOTA_BYTES` - Storage quota (default: 50 MiB)
    /// - `FLUSH_INTERVAL` - Snapshot interval in seconds (default: 5)
    /// - `ORIGIN_TIMEOUT_SECS` - Origin timeout in seconds (default: 10)
    /// - `SKIP_WAITING` - Activate immediately after install (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_dir = match env::var("CACHE_DIR") {
            Ok(dir) if dir.is_empty() => None,
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => defaults.cache_dir.clone(),
        };

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            origin_url: env::var("ORIGIN_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.origin_url),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            cache_dir,
            quota_bytes: parse_var("QUOTA_BYTES").unwrap_or(defaults.quota_bytes),
            flush_interval: parse_var("FLUSH_INTERVAL").unwrap_or(defaults.flush_interval),
            origin_timeout: parse_var("ORIGIN_TIMEOUT_SECS").unwrap_or(defaults.origin_timeout),
            skip_waiting: parse_var("SKIP_WAITING").unwrap_or(defaults.skip_waiting),
            ..defaults
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            origin_url: "http://127.0.0.1:8080".to_string(),
            cache_version: "2".to_string(),
            cache_dir: Some(PathBuf::from("./proxy-cache")),
            quota_bytes: 50 * 1024 * 1024,
            flush_interval: 5,
            origin_timeout: 10,
            skip_waiting: true,
            health_path: "/api/health".to_string(),
            offline_page: "/offline.html".to_string(),
            placeholder_image: "/images/placeholder.png".to_string(),
            notification_icon: "/images/icon-192x192.png".to_string(),
        }
    }
}
