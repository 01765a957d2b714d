//! Strategy Executor
//!
//! Runs network-first or cache-first retrieval for an intercepted request
//! and always produces a response, synthesizing one when both the origin
//! and the tier fail.

use axum::http::Uri;
use tracing::{debug, error, warn};

use crate::cache::{CacheTier, RequestKey, StoredResponse};
use crate::config::CACHEABLE_API_PREFIXES;
use crate::proxy::classify::{classify, ResourceClass, Strategy};
use crate::proxy::offline::{self, SERVED_FROM_CACHE, SERVED_FROM_HEADER};
use crate::proxy::origin::OriginRequest;
use crate::proxy::ProxyContext;

// == Fetch Entry Point ==
/// Answers one outgoing request from the application.
pub async fn handle_fetch(ctx: &ProxyContext, uri: &Uri, request: OriginRequest) -> StoredResponse {
    match classify(&request.method, uri) {
        None => pass_through(ctx, &request).await,
        Some(class) => match class.strategy() {
            Strategy::NetworkFirst => network_first(ctx, class, &request).await,
            Strategy::CacheFirst => cache_first(ctx, class, &request).await,
        },
    }
}

fn key_of(request: &OriginRequest) -> RequestKey {
    RequestKey::new(request.method.as_str(), request.url.clone())
}

/// A top-level document load, as opposed to a subresource fetch.
pub fn is_navigation(request: &OriginRequest) -> bool {
    match request.header("sec-fetch-mode") {
        Some(mode) => mode.eq_ignore_ascii_case("navigate"),
        None => request
            .header("accept")
            .is_some_and(|accept| accept.contains("text/html")),
    }
}

pub fn is_cacheable_api(path: &str) -> bool {
    CACHEABLE_API_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

// == Pass Through ==
async fn pass_through(ctx: &ProxyContext, request: &OriginRequest) -> StoredResponse {
    match ctx.origin.fetch(request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(method = %request.method, url = %request.url, error = %e, "pass-through request failed");
            offline::bad_gateway()
        }
    }
}

// == Network First ==
async fn network_first(
    ctx: &ProxyContext,
    class: ResourceClass,
    request: &OriginRequest,
) -> StoredResponse {
    let key = key_of(request);
    let tier = class.tier();

    match ctx.origin.fetch(request).await {
        Ok(response) => {
            let cacheable = match class {
                ResourceClass::Api => is_cacheable_api(key.path()),
                _ => is_navigation(request),
            };
            if response.is_success() && cacheable {
                store_response(ctx, tier, key, response.clone()).await;
            }
            response
        }
        Err(e) => {
            debug!(%key, error = %e, "network failed, falling back to cache");
            let cached = ctx.store.write().await.get(tier, &key);
            match (class, cached) {
                (ResourceClass::Api, Some(entry)) => entry
                    .response
                    .with_header(SERVED_FROM_HEADER, SERVED_FROM_CACHE),
                (ResourceClass::Api, None) => offline::offline_api(),
                (_, Some(entry)) => entry.response,
                (_, None) => offline_document(ctx).await,
            }
        }
    }
}

/// Offline page entry, then the root entry, then the inline page; all 503.
async fn offline_document(ctx: &ProxyContext) -> StoredResponse {
    let mut store = ctx.store.write().await;
    let candidates = [RequestKey::get(ctx.config.offline_page.as_str()), RequestKey::get("/")];
    for key in candidates {
        if let Some(entry) = store.get(CacheTier::Static, &key) {
            return offline::as_offline_page(entry.response);
        }
    }
    offline::offline_page()
}

// == Cache First ==
async fn cache_first(
    ctx: &ProxyContext,
    class: ResourceClass,
    request: &OriginRequest,
) -> StoredResponse {
    let key = key_of(request);
    let tier = class.tier();

    if let Some(entry) = ctx.store.write().await.get(tier, &key) {
        return entry.response;
    }

    match ctx.origin.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                store_response(ctx, tier, key, response.clone()).await;
            }
            response
        }
        Err(e) => {
            debug!(%key, error = %e, "network failed on cache miss");
            match class {
                ResourceClass::Image => placeholder_image(ctx).await,
                _ => offline::not_found(),
            }
        }
    }
}

async fn placeholder_image(ctx: &ProxyContext) -> StoredResponse {
    let key = RequestKey::get(ctx.config.placeholder_image.as_str());
    let mut store = ctx.store.write().await;
    store
        .get(CacheTier::Image, &key)
        .or_else(|| store.get(CacheTier::Static, &key))
        .map(|entry| entry.response)
        .unwrap_or_else(offline::not_found)
}

// == Store ==
/// Writes a response to a tier on a detached task and waits for it.
///
/// The write finishes even if the caller is dropped midway. Storage errors
/// are logged; the caller keeps serving the network response.
pub async fn store_response(
    ctx: &ProxyContext,
    tier: CacheTier,
    key: RequestKey,
    response: StoredResponse,
) {
    let store = ctx.store.clone();
    let label = key.to_string();
    let write = tokio::spawn(async move { store.write().await.put(tier, key, response) });

    match write.await {
        Ok(Ok(())) => debug!(key = %label, %tier, "cached response"),
        Ok(Err(e)) if e.is_storage() => {
            warn!(key = %label, %tier, error = %e, "cache write rejected, serving uncached")
        }
        Ok(Err(e)) => error!(key = %label, %tier, error = %e, "cache write failed"),
        Err(e) => warn!(key = %label, %tier, error = %e, "cache write task failed"),
    }
}
