//! Proxy Module
//!
//! Request classification, retrieval strategies, synthetic offline
//! responses and the origin seam.

pub mod classify;
pub mod context;
pub mod offline;
pub mod origin;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_support;

pub use classify::{classify, ResourceClass, Strategy};
pub use context::ProxyContext;
pub use origin::{HttpOrigin, Origin, OriginRequest};
pub use strategy::handle_fetch;
