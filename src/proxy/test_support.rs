//! Scripted origin shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::cache::{NamedCacheStore, StoredResponse};
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::proxy::origin::{Origin, OriginRequest};
use crate::proxy::ProxyContext;

/// Answers from a fixed route table; unknown paths get 404. While offline
/// every fetch fails with a transport error.
#[derive(Default)]
pub struct ScriptedOrigin {
    routes: Mutex<HashMap<String, StoredResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    seen: Mutex<Vec<OriginRequest>>,
}

impl ScriptedOrigin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, url: &str, status: u16, content_type: &str, body: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            StoredResponse::new(
                status,
                vec![("content-type".to_string(), content_type.to_string())],
                body,
            ),
        );
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<OriginRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Origin for ScriptedOrigin {
    async fn fetch(&self, request: &OriginRequest) -> Result<StoredResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProxyError::Transport("connection refused".into()));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| StoredResponse::new(404, Vec::new(), Vec::new())))
    }
}

/// In-memory context over a scripted origin.
pub fn context(origin: Arc<ScriptedOrigin>) -> ProxyContext {
    let config = Config {
        cache_dir: None,
        ..Config::default()
    };
    let store = NamedCacheStore::new(&config.cache_version, config.quota_bytes);
    ProxyContext::new(config, store, origin)
}
