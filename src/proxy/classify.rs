//! Request Classifier
//!
//! Assigns every intercepted request to exactly one resource class.

use axum::http::{Method, Uri};
use serde::Serialize;

use crate::cache::CacheTier;
use crate::config::STATIC_ALLOW_LIST;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "ico"];
const STATIC_EXTENSIONS: &[&str] = &["css", "js", "woff", "woff2", "ttf", "eot"];
const EXTENSION_SCHEMES: &[&str] = &[
    "chrome-extension",
    "moz-extension",
    "safari-extension",
    "safari-web-extension",
];

// == Resource Class ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Api,
    Image,
    Static,
    Navigation,
}

/// Which retrieval algorithm a class uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

impl ResourceClass {
    /// Tier the class reads from and writes to.
    pub fn tier(self) -> CacheTier {
        match self {
            ResourceClass::Api => CacheTier::Api,
            ResourceClass::Image => CacheTier::Image,
            ResourceClass::Static => CacheTier::Static,
            ResourceClass::Navigation => CacheTier::Runtime,
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            ResourceClass::Api | ResourceClass::Navigation => Strategy::NetworkFirst,
            ResourceClass::Image | ResourceClass::Static => Strategy::CacheFirst,
        }
    }
}

// == Classify ==
/// Classifies a request; `None` means the proxy must not intercept it.
pub fn classify(method: &Method, uri: &Uri) -> Option<ResourceClass> {
    if *method != Method::GET && *method != Method::HEAD {
        return None;
    }
    if uri
        .scheme_str()
        .is_some_and(|s| EXTENSION_SCHEMES.contains(&s))
    {
        return None;
    }
    Some(classify_path(uri.path()))
}

/// Classification by path alone, for intercepted requests.
pub fn classify_path(path: &str) -> ResourceClass {
    if path.starts_with("/api/") {
        return ResourceClass::Api;
    }
    match extension(path) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => ResourceClass::Image,
        Some(ext) if STATIC_EXTENSIONS.contains(&ext.as_str()) => ResourceClass::Static,
        _ if STATIC_ALLOW_LIST.contains(&path) => ResourceClass::Static,
        _ => ResourceClass::Navigation,
    }
}

/// Lowercased extension of the last path segment.
fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> Option<ResourceClass> {
        classify(&Method::GET, &uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn test_unsafe_methods_pass_through() {
        let uri: Uri = "/api/movies".parse().unwrap();
        assert_eq!(classify(&Method::POST, &uri), None);
        assert_eq!(classify(&Method::DELETE, &uri), None);
        assert_eq!(classify(&Method::HEAD, &uri), Some(ResourceClass::Api));
    }

    #[test]
    fn test_extension_scheme_passes_through() {
        assert_eq!(get("chrome-extension://abcdef/script.js"), None);
        assert_eq!(get("moz-extension://abcdef/icon.png"), None);
    }

    #[test]
    fn test_api_prefix_wins_over_extension() {
        assert_eq!(get("/api/movies?page=1"), Some(ResourceClass::Api));
        assert_eq!(get("/api/posters/x.png"), Some(ResourceClass::Api));
        assert_eq!(get("/apix/movies"), Some(ResourceClass::Navigation));
    }

    #[test]
    fn test_images() {
        assert_eq!(get("/images/poster123.webp"), Some(ResourceClass::Image));
        assert_eq!(get("/img/Logo.PNG"), Some(ResourceClass::Image));
        assert_eq!(get("/favicon.ico"), Some(ResourceClass::Image));
    }

    #[test]
    fn test_static_assets() {
        assert_eq!(get("/assets/app.css"), Some(ResourceClass::Static));
        assert_eq!(get("/assets/app.js?v=3"), Some(ResourceClass::Static));
        assert_eq!(get("/fonts/inter.woff2"), Some(ResourceClass::Static));
        assert_eq!(get("/manifest.json"), Some(ResourceClass::Static));
        assert_eq!(get("/offline.html"), Some(ResourceClass::Static));
        assert_eq!(get("/"), Some(ResourceClass::Static));
    }

    #[test]
    fn test_navigation_is_the_default() {
        assert_eq!(get("/movie/foo"), Some(ResourceClass::Navigation));
        assert_eq!(get("/search?q=x"), Some(ResourceClass::Navigation));
        assert_eq!(get("/data.json"), Some(ResourceClass::Navigation));
    }

    #[test]
    fn test_class_tiers_and_strategies() {
        assert_eq!(ResourceClass::Navigation.tier(), CacheTier::Runtime);
        assert_eq!(ResourceClass::Api.strategy(), Strategy::NetworkFirst);
        assert_eq!(ResourceClass::Image.strategy(), Strategy::CacheFirst);
    }

    mod properties {
        use crate::proxy::classify::{classify, classify_path, ResourceClass};
        use axum::http::{Method, Uri};
        use proptest::prelude::*;

        fn any_method() -> impl Strategy<Value = Method> {
            prop_oneof![
                Just(Method::GET),
                Just(Method::HEAD),
                Just(Method::POST),
                Just(Method::PUT),
                Just(Method::DELETE),
                Just(Method::PATCH),
                Just(Method::OPTIONS),
            ]
        }

        proptest! {
            // Every request gets exactly one answer, the same one each time;
            // only GET and HEAD are intercepted.
            #[test]
            fn prop_classify_total_and_deterministic(
                method in any_method(),
                path in "/[a-zA-Z0-9._-]{0,20}(/[a-zA-Z0-9._-]{1,20}){0,3}"
            ) {
                let uri: Uri = path.parse().unwrap();
                let first = classify(&method, &uri);

                prop_assert_eq!(first, classify(&method, &uri));
                let intercepted = method == Method::GET || method == Method::HEAD;
                prop_assert_eq!(first.is_some(), intercepted);
                if intercepted {
                    prop_assert_eq!(first, Some(classify_path(&path)));
                }
            }

            // Anything under /api/ is an API call whatever it ends with.
            #[test]
            fn prop_api_prefix_always_api(tail in "[a-z0-9/]{0,20}(\\.(png|css|js))?") {
                let path = format!("/api/{}", tail);
                prop_assert_eq!(classify_path(&path), ResourceClass::Api);
            }

            // Extension matching ignores case.
            #[test]
            fn prop_extension_case_insensitive(stem in "[a-z]{1,10}", upper in any::<bool>()) {
                let ext = if upper { "JPG" } else { "jpg" };
                let path = format!("/posters/{}.{}", stem, ext);
                prop_assert_eq!(classify_path(&path), ResourceClass::Image);
            }
        }
    }
}
