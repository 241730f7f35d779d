//! Request classification.
//!
//! Every intercepted request is classified exactly once, first match wins:
//! API prefix, then the enumerated static-asset list, then navigation,
//! then the generic default. The class picks the caching strategy in
//! [`strategy`](crate::strategy).

use serde::{Deserialize, Serialize};

use larder_core::EngineConfig;

/// A request intercepted by the engine.
///
/// Paths are root-relative; the host marks top-level page loads as
/// navigations the way a browser marks `mode: navigate` requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub path: String,
    #[serde(default)]
    pub navigation: bool,
}

impl ResourceRequest {
    /// A plain subresource request.
    pub fn get(path: &str) -> Self {
        Self { path: path.to_string(), navigation: false }
    }

    /// A top-level page load.
    pub fn navigation(path: &str) -> Self {
        Self { path: path.to_string(), navigation: true }
    }
}

/// Which strategy a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Network-first with the fixed offline degradation payload.
    Api,
    /// Cache-first against the static generation.
    StaticAsset,
    /// Network-first falling back to the cached page or the cached root.
    Navigation,
    /// Generic network-first; may produce no response at all.
    Default,
}

/// Classify a request, first match wins.
pub fn classify(config: &EngineConfig, request: &ResourceRequest) -> RouteClass {
    // Match on the path alone; the query selects a resource variant but
    // never changes the route.
    let path = request.path.split('?').next().unwrap_or(&request.path);

    if path.starts_with(&config.api_prefix) {
        return RouteClass::Api;
    }

    if is_static_asset(&config.static_assets, path) {
        return RouteClass::StaticAsset;
    }

    if request.navigation {
        return RouteClass::Navigation;
    }

    RouteClass::Default
}

/// Match a path against the configured asset list.
///
/// Entries starting with '/' must match the whole path; anything else is
/// a suffix match (".css", ".png", ...).
fn is_static_asset(assets: &[String], path: &str) -> bool {
    assets.iter().any(|pattern| {
        if pattern.starts_with('/') {
            path == pattern
        } else {
            path.ends_with(pattern.as_str())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_api_prefix_wins() {
        let config = config();
        assert_eq!(classify(&config, &ResourceRequest::get("/api/restaurants")), RouteClass::Api);
        // First match wins even when later rules would also hit.
        assert_eq!(classify(&config, &ResourceRequest::get("/api/theme.css")), RouteClass::Api);
        assert_eq!(classify(&config, &ResourceRequest::navigation("/api/orders")), RouteClass::Api);
    }

    #[test]
    fn test_api_prefix_requires_the_slash() {
        let config = config();
        assert_ne!(classify(&config, &ResourceRequest::get("/apiary")), RouteClass::Api);
    }

    #[test]
    fn test_static_asset_exact_match() {
        let config = config();
        assert_eq!(classify(&config, &ResourceRequest::get("/manifest.json")), RouteClass::StaticAsset);
        assert_ne!(classify(&config, &ResourceRequest::get("/other/manifest.json")), RouteClass::StaticAsset);
    }

    #[test]
    fn test_static_asset_suffix_match() {
        let config = config();
        assert_eq!(classify(&config, &ResourceRequest::get("/css/app.css")), RouteClass::StaticAsset);
        assert_eq!(classify(&config, &ResourceRequest::get("/img/3.jpg")), RouteClass::StaticAsset);
        assert_eq!(classify(&config, &ResourceRequest::get("/fonts/inter.woff2")), RouteClass::StaticAsset);
    }

    #[test]
    fn test_query_is_ignored_for_classification() {
        let config = config();
        assert_eq!(classify(&config, &ResourceRequest::get("/css/app.css?v=2")), RouteClass::StaticAsset);
        assert_eq!(classify(&config, &ResourceRequest::get("/manifest.json?v=2")), RouteClass::StaticAsset);
    }

    #[test]
    fn test_navigation() {
        let config = config();
        assert_eq!(classify(&config, &ResourceRequest::navigation("/restaurant/3")), RouteClass::Navigation);
        assert_eq!(classify(&config, &ResourceRequest::navigation("/")), RouteClass::Navigation);
    }

    #[test]
    fn test_default() {
        let config = config();
        assert_eq!(classify(&config, &ResourceRequest::get("/restaurant/3")), RouteClass::Default);
        assert_eq!(classify(&config, &ResourceRequest::get("/feed.xml")), RouteClass::Default);
    }
}
