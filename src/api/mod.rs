//! API Module
//!
//! HTTP surface of the proxy.
//!
//! # Endpoints
//! - `/__proxy/*` - Control channel, wake-up signals, stats and health
//! - everything else - Intercepted by the proxy

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
