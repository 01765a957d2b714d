//! Events Module
//!
//! Reactions to external wake-up signals: connectivity restored, push
//! payload arrived, notification clicked.

pub mod clients;
pub mod notify;

use serde::Serialize;
use tracing::{debug, info, warn};

pub use clients::{ClientInfo, ClientMessage, ClientRegistry};
pub use notify::{Notification, NotificationCenter, NotificationOptions, PushPayload};

use crate::proxy::ProxyContext;

// == Back Online ==
/// Posts `BackOnline` to every open client; returns how many were reached.
///
/// Best effort: a failed post is logged and not retried.
pub async fn back_online(ctx: &ProxyContext) -> usize {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let mut delivered = 0;
    for client in ctx.clients.match_all().await {
        let message = ClientMessage::BackOnline {
            timestamp: timestamp.clone(),
        };
        match ctx.clients.post_message(client.id, message).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!(client = client.id, error = %e, "could not notify client"),
        }
    }
    info!(delivered, "connectivity restored");
    delivered
}

// == Push ==
/// Renders exactly one notification for raw push data.
pub async fn push(ctx: &ProxyContext, data: &[u8]) -> Notification {
    let payload = PushPayload::parse(data);
    let options = NotificationOptions::for_push(&payload, &ctx.config.notification_icon);
    let notification = ctx.notifications.show(payload.title, options).await;
    debug!(id = notification.id, tag = %notification.options.tag, "notification shown");
    notification
}

// == Notification Click ==
/// What a click on a notification led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// The user dismissed it
    Dismissed,
    /// An open client already showed the target and was focused
    Focused { client: ClientInfo },
    /// A new client was opened at the target
    Opened { client: ClientInfo },
    /// No such notification is shown
    Unknown,
}

/// Closes the notification and routes to its target unless dismissed.
pub async fn notification_click(
    ctx: &ProxyContext,
    notification_id: u64,
    action: Option<&str>,
) -> ClickOutcome {
    let Some(notification) = ctx.notifications.close(notification_id).await else {
        debug!(notification_id, "click on unknown notification");
        return ClickOutcome::Unknown;
    };

    if matches!(action, Some(notify::ACTION_CLOSE) | Some("dismiss")) {
        return ClickOutcome::Dismissed;
    }

    let target = notification.options.data.url;
    if let Some(existing) = ctx.clients.find_by_url(&target).await {
        match ctx.clients.focus(existing.id).await {
            Ok(client) => return ClickOutcome::Focused { client },
            Err(e) => warn!(client = existing.id, error = %e, "focus failed, opening a new client"),
        }
    }
    ClickOutcome::Opened {
        client: ctx.clients.open_window(target).await,
    }
}
