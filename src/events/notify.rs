//! Push Notifications
//!
//! Push payload parsing with defaults, and the set of notifications
//! currently shown to the user.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_TITLE: &str = "CinemaFlix";
pub const DEFAULT_BODY: &str = "Có nội dung mới dành cho bạn!";
pub const DEFAULT_TAG: &str = "default";
pub const DEFAULT_URL: &str = "/";

pub const ACTION_OPEN: &str = "open";
pub const ACTION_CLOSE: &str = "close";

// == Push Payload ==
/// Payload delivered by the push service; every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub url: String,
    pub tag: String,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_body() -> String {
    DEFAULT_BODY.to_string()
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

impl Default for PushPayload {
    fn default() -> Self {
        Self {
            title: default_title(),
            body: default_body(),
            image: None,
            url: default_url(),
            tag: default_tag(),
        }
    }
}

impl PushPayload {
    /// Parses raw push data. Never fails: non-JSON data becomes the body,
    /// JSON that is not an object yields the defaults.
    pub fn parse(data: &[u8]) -> Self {
        if data.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice::<serde_json::Value>(data) {
            Ok(value) => Self::from_value(value),
            Err(_) => {
                let text = String::from_utf8_lossy(data).trim().to_string();
                Self {
                    body: if text.is_empty() { default_body() } else { text },
                    ..Self::default()
                }
            }
        }
    }

    /// Builds a payload from already-decoded JSON, substituting defaults
    /// for missing or mistyped fields.
    pub fn from_value(value: serde_json::Value) -> Self {
        let field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_string);
        Self {
            title: field("title").unwrap_or_else(default_title),
            body: field("body").unwrap_or_else(default_body),
            image: field("image"),
            url: field("url").unwrap_or_else(default_url),
            tag: field("tag").unwrap_or_else(default_tag),
        }
    }
}

// == Notification ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub tag: String,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
    pub renotify: bool,
    pub require_interaction: bool,
}

impl NotificationOptions {
    /// Options rendered for a push payload: one `open` and one `close` action.
    pub fn for_push(payload: &PushPayload, icon: &str) -> Self {
        Self {
            body: payload.body.clone(),
            icon: icon.to_string(),
            badge: icon.to_string(),
            image: payload.image.clone(),
            tag: payload.tag.clone(),
            data: NotificationData {
                url: payload.url.clone(),
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_OPEN.to_string(),
                    title: "Xem ngay".to_string(),
                },
                NotificationAction {
                    action: ACTION_CLOSE.to_string(),
                    title: "Đóng".to_string(),
                },
            ],
            renotify: true,
            require_interaction: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub options: NotificationOptions,
}

// == Notification Center ==
/// Notifications currently visible. Showing a notification whose tag is
/// already shown replaces the old one.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: RwLock<Vec<Notification>>,
    next_id: AtomicU64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn show(&self, title: impl Into<String>, options: NotificationOptions) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            title: title.into(),
            options,
        };
        let mut shown = self.shown.write().await;
        let before = shown.len();
        shown.retain(|n| n.options.tag != notification.options.tag);
        if shown.len() != before {
            debug!(tag = %notification.options.tag, "replacing notification with same tag");
        }
        shown.push(notification.clone());
        notification
    }

    pub async fn get(&self, id: u64) -> Option<Notification> {
        self.shown.read().await.iter().find(|n| n.id == id).cloned()
    }

    /// Closes a notification; returns it if it was shown.
    pub async fn close(&self, id: u64) -> Option<Notification> {
        let mut shown = self.shown.write().await;
        let index = shown.iter().position(|n| n.id == id)?;
        Some(shown.remove(index))
    }

    pub async fn list(&self) -> Vec<Notification> {
        self.shown.read().await.clone()
    }
}
