//! Request DTOs for the proxy control API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for client registration (POST /__proxy/clients)
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterClientRequest {
    /// Location the client currently shows
    pub url: String,
}

impl RegisterClientRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !self.url.starts_with('/') {
            return Some("Client url must be an absolute path".to_string());
        }
        None
    }
}

/// Request body for notification clicks (POST /__proxy/events/notification-click)
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationClickRequest {
    pub notification_id: u64,
    /// `open`, `close`/`dismiss`, or absent for a click on the body
    #[serde(default)]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_deserialize() {
        let req: RegisterClientRequest = serde_json::from_str(r#"{"url": "/movie/foo"}"#).unwrap();
        assert_eq!(req.url, "/movie/foo");
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_relative_url() {
        let req = RegisterClientRequest {
            url: "movie/foo".to_string(),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_click_request_without_action() {
        let req: NotificationClickRequest =
            serde_json::from_str(r#"{"notification_id": 3}"#).unwrap();
        assert_eq!(req.notification_id, 3);
        assert!(req.action.is_none());
    }
}
