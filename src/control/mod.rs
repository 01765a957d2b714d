//! Control Module
//!
//! Typed command protocol between the host application and the proxy,
//! plus the install/activate/claim lifecycle it drives.

pub mod dispatch;
pub mod lifecycle;
pub mod message;

pub use dispatch::{dispatch, request};
pub use lifecycle::{Lifecycle, LifecycleStatus, WorkerState};
pub use message::{ControlMessage, ControlReply, MoviePayload};
