//! Synthetic responses used when neither the network nor a tier can answer.

use serde_json::json;

use crate::cache::StoredResponse;

/// Marker header added to API responses served from a tier.
pub const SERVED_FROM_HEADER: &str = "x-served-from";
pub const SERVED_FROM_CACHE: &str = "cache";

/// Localized message of the offline API body.
pub const OFFLINE_MESSAGE: &str = "Bạn đang offline. Vui lòng kiểm tra kết nối mạng.";
/// Heading of the inline offline document.
pub const OFFLINE_HEADING: &str = "Bạn đang offline";

const JSON_CONTENT_TYPE: &str = "application/json";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

fn content_type(value: &str) -> Vec<(String, String)> {
    vec![("content-type".to_string(), value.to_string())]
}

/// `{"error":"Offline","message":...}` with status 503.
pub fn offline_api() -> StoredResponse {
    let body = json!({
        "error": "Offline",
        "message": OFFLINE_MESSAGE,
    });
    StoredResponse::new(503, content_type(JSON_CONTENT_TYPE), body.to_string())
}

/// Self-contained fallback page with status 503.
pub fn offline_page() -> StoredResponse {
    StoredResponse::new(503, content_type(HTML_CONTENT_TYPE), offline_html())
}

/// Re-labels a cached document as the offline answer to a navigation.
pub fn as_offline_page(cached: StoredResponse) -> StoredResponse {
    StoredResponse {
        status: 503,
        ..cached
    }
    .with_header("content-type", HTML_CONTENT_TYPE)
}

/// Bare 404 with an empty body.
pub fn not_found() -> StoredResponse {
    StoredResponse::new(404, Vec::new(), Vec::new())
}

/// Bare 502 for pass-through requests whose origin is unreachable.
pub fn bad_gateway() -> StoredResponse {
    StoredResponse::new(502, Vec::new(), Vec::new())
}

fn offline_html() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="vi">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline</title>
<style>
body {{ margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center;
       background: #141414; color: #e5e5e5; font-family: system-ui, sans-serif; text-align: center; }}
h1 {{ color: #e50914; }}
button {{ padding: .75rem 1.5rem; border: 0; border-radius: 4px; background: #e50914; color: #fff; cursor: pointer; }}
</style>
</head>
<body>
<main>
<h1>{heading}</h1>
<p>{message}</p>
<button onclick="location.reload()">Thử lại</button>
</main>
</body>
</html>
"#,
        heading = OFFLINE_HEADING,
        message = OFFLINE_MESSAGE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_api_body() {
        let resp = offline_api();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.header("content-type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(body["error"], "Offline");
        assert_eq!(body["message"], OFFLINE_MESSAGE);
    }

    #[test]
    fn test_offline_page() {
        let resp = offline_page();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.header("content-type"), Some("text/html; charset=utf-8"));
        let html = String::from_utf8(resp.body).unwrap();
        assert!(html.contains(&format!("<h1>{}</h1>", OFFLINE_HEADING)));
    }

    #[test]
    fn test_as_offline_page_forces_status() {
        let cached = StoredResponse::new(200, content_type("text/html"), "<p>shell</p>");
        let resp = as_offline_page(cached);
        assert_eq!(resp.status, 503);
        assert_eq!(resp.header("content-type"), Some(HTML_CONTENT_TYPE));
        assert_eq!(resp.body, b"<p>shell</p>");
    }

    #[test]
    fn test_not_found_is_bare() {
        let resp = not_found();
        assert_eq!(resp.status, 404);
        assert!(resp.body.is_empty());
    }
}
