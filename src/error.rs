//! Error types for the offline proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the offline proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Origin unreachable, request aborted or timed out
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Storing the entry would exceed the storage quota
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A persisted entry or snapshot could not be decoded
    #[error("Corrupt cache entry: {0}")]
    CorruptEntry(String),

    /// Any other storage I/O failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Referenced resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Storage failures are absorbed by the strategies instead of surfacing.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            ProxyError::QuotaExceeded(_) | ProxyError::CorruptEntry(_) | ProxyError::Storage(_)
        )
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Transport(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
            ProxyError::QuotaExceeded(_) => StatusCode::INSUFFICIENT_STORAGE,
            ProxyError::CorruptEntry(_) | ProxyError::Storage(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_classification() {
        assert!(ProxyError::QuotaExceeded("full".into()).is_storage());
        assert!(ProxyError::CorruptEntry("bad".into()).is_storage());
        assert!(!ProxyError::Transport("down".into()).is_storage());
    }

    #[test]
    fn test_error_status_codes() {
        let resp = ProxyError::InvalidRequest("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ProxyError::NotFound("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
