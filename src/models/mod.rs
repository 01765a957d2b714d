//! Request and Response models for the proxy control API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing bodies of the `/__proxy/` endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{NotificationClickRequest, RegisterClientRequest};
pub use responses::{BackOnlineResponse, HealthResponse, StatsResponse, TierSize};
