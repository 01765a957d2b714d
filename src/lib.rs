//! Offline Proxy - An offline-first caching proxy
//!
//! Intercepts requests to an origin server, answers them from tiered FIFO
//! caches when the network is unavailable, and relays control messages and
//! wake-up signals to connected clients.

pub mod api;
pub mod cache;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use config::Config;
pub use error::{ProxyError, Result};
pub use proxy::ProxyContext;
pub use tasks::{flush_dirty, spawn_flush_task};
