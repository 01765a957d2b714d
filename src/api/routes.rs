//! API Routes
//!
//! Configures the Axum router: `/__proxy/` endpoints plus the intercepting
//! fallback.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    client_messages_handler, control_handler, health_handler, list_clients_handler,
    notification_click_handler, notifications_handler, online_handler, proxy_handler,
    push_handler, register_client_handler, stats_handler, unregister_client_handler,
};
use crate::proxy::ProxyContext;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /__proxy/control` - Control message
/// - `POST /__proxy/events/online` - Connectivity restored
/// - `POST /__proxy/events/push` - Push payload arrived
/// - `POST /__proxy/events/notification-click` - Notification clicked
/// - `GET|POST /__proxy/clients` - List or register open clients
/// - `DELETE /__proxy/clients/:id` - Forget a client
/// - `GET /__proxy/clients/:id/messages` - Drain a client's messages
/// - `GET /__proxy/notifications` - Notifications currently shown
/// - `GET /__proxy/stats` - Cache statistics
/// - `GET /__proxy/health` - Health check
/// - anything else - intercepted and proxied to the origin
pub fn create_router(ctx: ProxyContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__proxy/control", post(control_handler))
        .route("/__proxy/events/online", post(online_handler))
        .route("/__proxy/events/push", post(push_handler))
        .route(
            "/__proxy/events/notification-click",
            post(notification_click_handler),
        )
        .route(
            "/__proxy/clients",
            get(list_clients_handler).post(register_client_handler),
        )
        .route("/__proxy/clients/:id", delete(unregister_client_handler))
        .route("/__proxy/clients/:id/messages", get(client_messages_handler))
        .route("/__proxy/notifications", get(notifications_handler))
        .route("/__proxy/stats", get(stats_handler))
        .route("/__proxy/health", get(health_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::{context, ScriptedOrigin};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(context(ScriptedOrigin::new()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__proxy/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__proxy/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_control_message_is_accepted() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/__proxy/control")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"REBOOT"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_unrouted_path_is_proxied() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/assets/missing.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Scripted origin answers unknown paths with 404
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
