//! Control Dispatch
//!
//! Routes each control message to its handler and delivers the reply.

use axum::http::Method;
use serde_json::json;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::cache::{current_timestamp_ms, CacheTier, RequestKey, StoredResponse};
use crate::control::lifecycle;
use crate::control::message::{ControlMessage, ControlReply, MoviePayload};
use crate::proxy::origin::OriginRequest;
use crate::proxy::strategy::store_response;
use crate::proxy::ProxyContext;

// == Dispatch ==
/// Runs the handler for `message`.
///
/// Messages that produce a reply send it on `reply` exactly once; a
/// channel passed with any other message is dropped unanswered. Handler
/// failures are logged and never reach the sender.
pub async fn dispatch(
    ctx: &ProxyContext,
    message: ControlMessage,
    reply: Option<oneshot::Sender<ControlReply>>,
) {
    debug!(tag = message.tag(), "control message");
    let answer = match message {
        ControlMessage::SkipWaiting => {
            lifecycle::skip_waiting(ctx).await;
            None
        }
        ControlMessage::ClaimClients => {
            lifecycle::claim_clients(ctx).await;
            None
        }
        ControlMessage::CacheMovie { payload } => {
            cache_movie(ctx, payload).await;
            None
        }
        ControlMessage::GetCacheSize => Some(ControlReply::CacheSize {
            size: ctx.store.read().await.total_entries(),
        }),
        ControlMessage::ClearCache => {
            let removed = ctx.store.write().await.clear();
            info!(tiers = removed, "cleared all caches");
            Some(ControlReply::Cleared {})
        }
        ControlMessage::CheckNetwork => Some(ControlReply::NetworkStatus {
            is_online: check_network(ctx).await,
        }),
    };

    if let (Some(answer), Some(reply)) = (answer, reply) {
        if reply.send(answer).is_err() {
            debug!("control reply dropped, sender went away");
        }
    }
}

/// Dispatches a message and waits for its reply, if it has one.
pub async fn request(ctx: &ProxyContext, message: ControlMessage) -> Option<ControlReply> {
    if !message.expects_reply() {
        dispatch(ctx, message, None).await;
        return None;
    }
    let (tx, rx) = oneshot::channel();
    dispatch(ctx, message, Some(tx)).await;
    rx.await.ok()
}

/// Path under which a movie's details are primed.
pub fn movie_path(slug: &str) -> String {
    format!("/movie/{}", slug)
}

// == Cache Movie ==
/// Primes a movie's details into Runtime and, best effort, its poster
/// into Image. Priming the same slug again replaces the entry.
async fn cache_movie(ctx: &ProxyContext, movie: MoviePayload) {
    let body = json!({
        "slug": movie.slug,
        "name": movie.name,
        "poster_url": movie.poster_url,
        "cached_at": current_timestamp_ms(),
    });
    let response = StoredResponse::new(
        200,
        vec![("content-type".to_string(), "application/json".to_string())],
        body.to_string(),
    );
    let key = RequestKey::get(movie_path(&movie.slug));
    if let Err(e) = ctx.store.write().await.put(CacheTier::Runtime, key, response) {
        warn!(slug = %movie.slug, error = %e, "could not prime movie details");
    }

    let Some(poster) = movie.poster_url else {
        return;
    };
    match ctx.origin.fetch(&OriginRequest::get(poster.as_str())).await {
        Ok(resp) if resp.is_success() => {
            store_response(ctx, CacheTier::Image, poster_key(ctx, &poster), resp).await;
        }
        Ok(resp) => debug!(%poster, status = resp.status, "poster not cached"),
        Err(e) => debug!(%poster, error = %e, "poster fetch failed"),
    }
}

/// Posters hosted on the origin are keyed by path, the way the proxy keys
/// them when the app loads them; posters on other hosts keep the full URL.
fn poster_key(ctx: &ProxyContext, poster: &str) -> RequestKey {
    let base = ctx.config.origin_url.trim_end_matches('/');
    match poster.strip_prefix(base) {
        Some(path) if path.starts_with('/') => RequestKey::get(path),
        _ => RequestKey::get(poster),
    }
}

// == Check Network ==
/// Probes the health endpoint; any answer from the origin means online.
async fn check_network(ctx: &ProxyContext) -> bool {
    let probe = OriginRequest::new(Method::HEAD, ctx.config.health_path.as_str())
        .with_header("cache-control", "no-cache");
    match ctx.origin.fetch(&probe).await {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "network probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::test_support::{context, ScriptedOrigin};

    fn movie(slug: &str, name: &str, poster: Option<&str>) -> ControlMessage {
        ControlMessage::CacheMovie {
            payload: MoviePayload {
                slug: slug.to_string(),
                name: name.to_string(),
                poster_url: poster.map(str::to_string),
            },
        }
    }

    #[tokio::test]
    async fn test_cache_movie_is_idempotent_per_slug() {
        let ctx = context(ScriptedOrigin::new());

        dispatch(&ctx, movie("foo", "Foo", None), None).await;
        dispatch(&ctx, movie("foo", "Foo (Director's Cut)", None), None).await;

        let mut store = ctx.store.write().await;
        assert_eq!(store.len(CacheTier::Runtime), 1);
        let entry = store.get(CacheTier::Runtime, &RequestKey::get("/movie/foo")).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&entry.response.body).unwrap();
        assert_eq!(body["name"], "Foo (Director's Cut)");
    }

    #[tokio::test]
    async fn test_cache_movie_primes_poster() {
        let origin = ScriptedOrigin::new();
        origin.route("/images/foo.jpg", 200, "image/jpeg", "jpeg");
        let ctx = context(origin.clone());

        dispatch(&ctx, movie("foo", "Foo", Some("/images/foo.jpg")), None).await;

        let store = ctx.store.read().await;
        assert!(store.contains(CacheTier::Image, &RequestKey::get("/images/foo.jpg")));
    }

    #[tokio::test]
    async fn test_absolute_origin_poster_is_keyed_by_path() {
        let origin = ScriptedOrigin::new();
        origin.route("http://127.0.0.1:8080/images/foo.jpg", 200, "image/jpeg", "jpeg");
        let ctx = context(origin.clone());

        let poster = "http://127.0.0.1:8080/images/foo.jpg";
        dispatch(&ctx, movie("foo", "Foo", Some(poster)), None).await;

        origin.set_offline(true);
        let uri = "/images/foo.jpg".parse().unwrap();
        let resp =
            crate::proxy::handle_fetch(&ctx, &uri, OriginRequest::get("/images/foo.jpg")).await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"jpeg");
    }

    #[test]
    fn test_foreign_poster_keeps_full_url() {
        let ctx = context(ScriptedOrigin::new());
        let key = poster_key(&ctx, "https://cdn.example.com/p/foo.jpg");
        assert_eq!(key.url, "https://cdn.example.com/p/foo.jpg");
        assert_eq!(poster_key(&ctx, "/images/foo.jpg").url, "/images/foo.jpg");
    }

    #[tokio::test]
    async fn test_cache_movie_swallows_poster_failure() {
        let origin = ScriptedOrigin::new();
        origin.set_offline(true);
        let ctx = context(origin.clone());

        dispatch(&ctx, movie("bar", "Bar", Some("/images/bar.jpg")), None).await;

        let store = ctx.store.read().await;
        assert_eq!(store.len(CacheTier::Runtime), 1);
        assert_eq!(store.len(CacheTier::Image), 0);
    }

    #[tokio::test]
    async fn test_get_cache_size_sums_all_tiers() {
        let ctx = context(ScriptedOrigin::new());
        {
            let mut store = ctx.store.write().await;
            for tier in CacheTier::ALL {
                store
                    .put(tier, RequestKey::get("/x"), StoredResponse::new(200, vec![], "x"))
                    .unwrap();
            }
        }

        let reply = request(&ctx, ControlMessage::GetCacheSize).await;
        assert_eq!(reply, Some(ControlReply::CacheSize { size: 4 }));
    }

    #[tokio::test]
    async fn test_clear_then_size_is_zero() {
        let ctx = context(ScriptedOrigin::new());
        dispatch(&ctx, movie("foo", "Foo", None), None).await;

        assert_eq!(
            request(&ctx, ControlMessage::ClearCache).await,
            Some(ControlReply::Cleared {})
        );
        assert_eq!(
            request(&ctx, ControlMessage::GetCacheSize).await,
            Some(ControlReply::CacheSize { size: 0 })
        );
    }

    #[tokio::test]
    async fn test_check_network_replies_both_ways() {
        let origin = ScriptedOrigin::new();
        let ctx = context(origin.clone());

        assert_eq!(
            request(&ctx, ControlMessage::CheckNetwork).await,
            Some(ControlReply::NetworkStatus { is_online: true })
        );
        let probe = origin.seen().pop().unwrap();
        assert_eq!(probe.method, Method::HEAD);
        assert_eq!(probe.url, "/api/health");
        assert_eq!(probe.header("cache-control"), Some("no-cache"));

        origin.set_offline(true);
        assert_eq!(
            request(&ctx, ControlMessage::CheckNetwork).await,
            Some(ControlReply::NetworkStatus { is_online: false })
        );
    }

    #[tokio::test]
    async fn test_messages_without_reply_drop_the_channel() {
        let ctx = context(ScriptedOrigin::new());
        assert_eq!(request(&ctx, ControlMessage::SkipWaiting).await, None);
        assert_eq!(request(&ctx, ControlMessage::ClaimClients).await, None);
    }
}
