//! API Handlers
//!
//! The intercepting fallback handler plus the `/__proxy/` endpoints for
//! control messages and wake-up signals.

use axum::{
    body::{Body, Bytes},
    extract::{Path, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::cache::StoredResponse;
use crate::control::{self, ControlMessage};
use crate::error::{ProxyError, Result};
use crate::events::{self, ClickOutcome, ClientInfo, ClientMessage, Notification};
use crate::models::{
    BackOnlineResponse, HealthResponse, NotificationClickRequest, RegisterClientRequest,
    StatsResponse,
};
use crate::proxy::{handle_fetch, OriginRequest, ProxyContext};

/// Largest request body forwarded to the origin.
const MAX_REQUEST_BODY: usize = 10 * 1024 * 1024;

// == Stored Response Conversion ==
impl IntoResponse for StoredResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid header"),
            }
        }
        response
    }
}

/// Fallback handler: every request outside `/__proxy/` is intercepted.
pub async fn proxy_handler(State(ctx): State<ProxyContext>, request: Request) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_REQUEST_BODY)
        .await
        .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;

    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let origin_request = OriginRequest {
        method: parts.method,
        url,
        headers,
        body: body.to_vec(),
    };

    Ok(handle_fetch(&ctx, &parts.uri, origin_request)
        .await
        .into_response())
}

/// Handler for POST /__proxy/control
///
/// Replies with the message's reply, or 202 for messages without one.
/// Unknown tags are accepted and ignored.
pub async fn control_handler(
    State(ctx): State<ProxyContext>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Some(message) = ControlMessage::decode(body) else {
        return StatusCode::ACCEPTED.into_response();
    };
    match control::request(&ctx, message).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handler for POST /__proxy/events/online
pub async fn online_handler(State(ctx): State<ProxyContext>) -> Json<BackOnlineResponse> {
    let delivered = events::back_online(&ctx).await;
    Json(BackOnlineResponse { delivered })
}

/// Handler for POST /__proxy/events/push
///
/// The body is raw push data; it is never rejected.
pub async fn push_handler(State(ctx): State<ProxyContext>, body: Bytes) -> Json<Notification> {
    Json(events::push(&ctx, &body).await)
}

/// Handler for POST /__proxy/events/notification-click
pub async fn notification_click_handler(
    State(ctx): State<ProxyContext>,
    Json(req): Json<NotificationClickRequest>,
) -> Json<ClickOutcome> {
    let outcome = events::notification_click(&ctx, req.notification_id, req.action.as_deref()).await;
    Json(outcome)
}

/// Handler for GET /__proxy/notifications
pub async fn notifications_handler(State(ctx): State<ProxyContext>) -> Json<Vec<Notification>> {
    Json(ctx.notifications.list().await)
}

/// Handler for POST /__proxy/clients
pub async fn register_client_handler(
    State(ctx): State<ProxyContext>,
    Json(req): Json<RegisterClientRequest>,
) -> Result<Json<ClientInfo>> {
    if let Some(error_msg) = req.validate() {
        return Err(ProxyError::InvalidRequest(error_msg));
    }
    Ok(Json(ctx.clients.register(req.url).await))
}

/// Handler for GET /__proxy/clients
pub async fn list_clients_handler(State(ctx): State<ProxyContext>) -> Json<Vec<ClientInfo>> {
    Json(ctx.clients.match_all().await)
}

/// Handler for GET /__proxy/clients/:id/messages
///
/// Drains the messages queued for a client.
pub async fn client_messages_handler(
    State(ctx): State<ProxyContext>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<ClientMessage>>> {
    Ok(Json(ctx.clients.take_messages(id).await?))
}

/// Handler for DELETE /__proxy/clients/:id
pub async fn unregister_client_handler(
    State(ctx): State<ProxyContext>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    if ctx.clients.unregister(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ProxyError::NotFound(format!("client {}", id)))
    }
}

/// Handler for GET /__proxy/stats
pub async fn stats_handler(State(ctx): State<ProxyContext>) -> Json<StatsResponse> {
    let (stats, tiers) = {
        let store = ctx.store.read().await;
        (store.stats(), store.tier_sizes())
    };
    let lifecycle = ctx.lifecycle.status().await;
    Json(StatsResponse::new(stats, tiers, lifecycle))
}

/// Handler for GET /__proxy/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::{context, ScriptedOrigin};

    #[test]
    fn test_stored_response_conversion() {
        let stored = StoredResponse::new(
            503,
            vec![
                ("content-type".into(), "application/json".into()),
                ("bad header".into(), "x".into()),
            ],
            "{}",
        );
        let response = stored.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers().len(), 1);
    }

    #[tokio::test]
    async fn test_register_client_handler_validates() {
        let ctx = context(ScriptedOrigin::new());
        let req = RegisterClientRequest {
            url: "nope".to_string(),
        };
        let result = register_client_handler(State(ctx), Json(req)).await;
        assert!(matches!(result, Err(ProxyError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_client_messages_unknown_client() {
        let ctx = context(ScriptedOrigin::new());
        let result = client_messages_handler(State(ctx), Path(7)).await;
        assert!(matches!(result, Err(ProxyError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
