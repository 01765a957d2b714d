//! Origin Client
//!
//! The seam between the proxy and the remote origin server.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use tracing::debug;

use crate::cache::StoredResponse;
use crate::error::{ProxyError, Result};

/// Headers that describe a single hop and must not be forwarded or stored.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "host",
    "content-length",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Absolute URLs (e.g. posters on a CDN) bypass the origin base URL.
fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// == Origin Request ==
/// A request as it is sent to the origin.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub method: Method,
    /// Path and query, relative to the origin base URL
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl OriginRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// == Origin Trait ==
/// Anything that can answer a request on behalf of the origin server.
///
/// An `Err` always means a transport failure; HTTP error statuses are
/// returned as `Ok` responses.
#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, request: &OriginRequest) -> Result<StoredResponse>;
}

// == HTTP Origin ==
/// Origin reached over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrigin {
    /// Builds a client whose connect and read timeouts are `timeout_secs`.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, request: &OriginRequest) -> Result<StoredResponse> {
        let url = if is_absolute(&request.url) {
            request.url.clone()
        } else {
            format!("{}{}", self.base_url, request.url)
        };
        debug!(method = %request.method, %url, "fetching from origin");

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in request.headers.iter().filter(|(n, _)| !is_hop_by_hop(n)) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(StoredResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop_detection() {
        assert!(is_hop_by_hop("Connection"));
        assert!(is_hop_by_hop("transfer-encoding"));
        assert!(!is_hop_by_hop("content-type"));
    }

    #[test]
    fn test_absolute_urls() {
        assert!(is_absolute("https://cdn.example.com/p.jpg"));
        assert!(!is_absolute("/images/p.jpg"));
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let origin = HttpOrigin::new("http://localhost:8080/", 5).unwrap();
        assert_eq!(origin.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_transport_failure() {
        // Port 9 (discard) is closed on test machines
        let origin = HttpOrigin::new("http://127.0.0.1:9", 1).unwrap();
        let result = origin.fetch(&OriginRequest::get("/api/health")).await;
        assert!(matches!(result, Err(ProxyError::Transport(_))));
    }
}
