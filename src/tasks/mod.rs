//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Snapshot Flush: Writes changed cache tiers to disk at configured intervals

mod flush;

pub use flush::{flush_dirty, spawn_flush_task};
