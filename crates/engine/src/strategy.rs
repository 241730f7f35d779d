//! The four caching strategies.
//!
//! [`Engine::handle_fetch`] classifies a request and runs the matching
//! strategy. All strategies share one invariant: a cache write is a side
//! effect performed after a definitive response is obtained, spawned on a
//! tracked background task, and never delays delivery of that response.

use bytes::Bytes;
use serde_json::json;

use crate::engine::{Engine, EngineState};
use crate::router::{ResourceRequest, RouteClass, classify};
use larder_client::GatewayResponse;
use larder_core::store::hash::normalize_path;
use larder_core::{CachedEntry, Error};

/// Fixed degradation payload for API requests that are offline and uncached.
const OFFLINE_ERROR: &str = "offline";
const OFFLINE_MESSAGE: &str = "You are offline and this content has not been cached yet.";

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Fresh from the backend.
    Network,
    /// The cached copy for this exact request.
    Cache,
    /// A substitute: the cached root page or the offline API payload.
    Fallback,
}

/// A response produced by the engine.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Lets the host label degraded content.
    pub served_from: ServedFrom,
}

impl EngineResponse {
    fn from_network(response: GatewayResponse) -> Self {
        Self {
            status: response.status,
            content_type: response.content_type,
            headers: response.headers,
            body: response.body,
            served_from: ServedFrom::Network,
        }
    }

    fn from_entry(entry: CachedEntry, served_from: ServedFrom) -> Self {
        let headers = entry
            .headers_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Self {
            status: entry.status,
            content_type: entry.content_type,
            headers,
            body: Bytes::from(entry.body),
            served_from,
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The defined contract for offline API degradation.
fn offline_api_response() -> EngineResponse {
    let body = json!({ "error": OFFLINE_ERROR, "message": OFFLINE_MESSAGE });
    EngineResponse {
        status: 503,
        content_type: Some("application/json".to_string()),
        headers: Vec::new(),
        body: Bytes::from(body.to_string()),
        served_from: ServedFrom::Fallback,
    }
}

impl Engine {
    /// Serve one intercepted request.
    ///
    /// Returns `Ok(None)` only for default-classified requests with no
    /// network and no cache: that layer declines to respond and the host
    /// surfaces its own network error. Every other class always produces
    /// a response or a real error.
    ///
    /// # Errors
    ///
    /// [`Error::NotActive`] before activation; [`Error::Offline`] when a
    /// cache-first asset or a navigation has no network and no fallback.
    pub async fn handle_fetch(&self, request: &ResourceRequest) -> Result<Option<EngineResponse>, Error> {
        if self.state() != EngineState::Active {
            return Err(Error::NotActive);
        }

        let path = normalize_path(&request.path);
        let class = classify(&self.config, request);
        tracing::debug!("fetch {} classified {:?}", path, class);

        match class {
            RouteClass::Api => self.network_first_api(&path).await.map(Some),
            RouteClass::StaticAsset => self.cache_first(&path).await.map(Some),
            RouteClass::Navigation => self.network_first_navigation(&path).await.map(Some),
            RouteClass::Default => self.network_first_generic(&path).await,
        }
    }

    /// Network-first for API calls.
    ///
    /// Any delivered response is returned and cached into the runtime
    /// generation; on network failure the best cached match is served,
    /// and with nothing cached the fixed `{error, message}` payload is.
    async fn network_first_api(&self, path: &str) -> Result<EngineResponse, Error> {
        match self.gateway.get(path).await {
            Ok(response) => {
                self.spawn_cache_write(&self.config.runtime_generation, path, &response);
                Ok(EngineResponse::from_network(response))
            }
            Err(e) => {
                tracing::debug!("network failed for {}: {}", path, e);
                match self.cached_or_none(path).await {
                    Some(entry) => Ok(EngineResponse::from_entry(entry, ServedFrom::Cache)),
                    None => Ok(offline_api_response()),
                }
            }
        }
    }

    /// Cache-first for enumerated static assets.
    ///
    /// A hit never touches the network. A miss fetches once, caches into
    /// the static generation, and returns the network response.
    async fn cache_first(&self, path: &str) -> Result<EngineResponse, Error> {
        if let Some(entry) = self.cached_or_none(path).await {
            return Ok(EngineResponse::from_entry(entry, ServedFrom::Cache));
        }

        match self.gateway.get(path).await {
            Ok(response) => {
                self.spawn_cache_write(&self.config.static_generation, path, &response);
                Ok(EngineResponse::from_network(response))
            }
            Err(e) => {
                tracing::debug!("network failed for {}: {}", path, e);
                Err(Error::Offline(path.to_string()))
            }
        }
    }

    /// Network-first for navigations, with a page fallback chain.
    ///
    /// On network failure: the cached exact match, else the cached root
    /// entry as the last-resort offline page, else offline error.
    async fn network_first_navigation(&self, path: &str) -> Result<EngineResponse, Error> {
        match self.gateway.get(path).await {
            Ok(response) => {
                self.spawn_cache_write(&self.config.runtime_generation, path, &response);
                Ok(EngineResponse::from_network(response))
            }
            Err(e) => {
                tracing::debug!("network failed for {}: {}", path, e);
                if let Some(entry) = self.cached_or_none(path).await {
                    return Ok(EngineResponse::from_entry(entry, ServedFrom::Cache));
                }
                if let Some(root) = self.cached_or_none("/").await {
                    return Ok(EngineResponse::from_entry(root, ServedFrom::Fallback));
                }
                Err(Error::Offline(path.to_string()))
            }
        }
    }

    /// Generic network-first for everything else.
    ///
    /// Only HTTP-ok responses are cached. With no network and no cached
    /// match this layer produces no response.
    async fn network_first_generic(&self, path: &str) -> Result<Option<EngineResponse>, Error> {
        match self.gateway.get(path).await {
            Ok(response) => {
                if response.is_ok() {
                    self.spawn_cache_write(&self.config.runtime_generation, path, &response);
                }
                Ok(Some(EngineResponse::from_network(response)))
            }
            Err(e) => {
                tracing::debug!("network failed for {}: {}", path, e);
                Ok(self
                    .cached_or_none(path)
                    .await
                    .map(|entry| EngineResponse::from_entry(entry, ServedFrom::Cache)))
            }
        }
    }

    /// Cross-generation cache lookup that degrades on store failure.
    ///
    /// A broken store must not turn a recoverable fetch into a crash, so
    /// lookup errors are logged and treated as a miss.
    async fn cached_or_none(&self, path: &str) -> Option<CachedEntry> {
        match self.store.lookup(path).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("cache lookup for {} failed: {}", path, e);
                None
            }
        }
    }

    /// Store a delivered response without blocking its delivery.
    fn spawn_cache_write(&self, generation: &str, path: &str, response: &GatewayResponse) {
        let headers_json = serde_json::to_string(&response.headers).ok();
        let entry = CachedEntry::new(
            path,
            response.status,
            response.content_type.clone(),
            headers_json,
            response.body.to_vec(),
        );
        let store = self.store.clone();
        let generation = generation.to_string();

        self.writes.spawn(async move {
            if let Err(e) = store.put_entry(&generation, &entry).await {
                tracing::warn!("background cache write for {} failed: {}", entry.path, e);
            }
        });
    }
}
