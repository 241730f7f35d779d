//! HTTP gateway to the backend the engine fronts.
//!
//! The engine never talks to reqwest directly. Everything goes through the
//! [`Gateway`] trait so fetch handling and replay can be exercised against
//! a programmable fake. The [`Error`] contract matters here: a gateway call
//! fails only for network-level reasons (connect, timeout, read); an HTTP
//! error status is still a delivered response and comes back as `Ok`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use url::Url;

use larder_core::{Error, config::EngineConfig};

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend origin, without a trailing slash (default: "http://localhost:1337")
    pub origin: String,

    /// User agent string (default: "larder/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:1337".to_string(),
            user_agent: "larder/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_bytes: 5 * 1024 * 1024,
            max_redirects: 5,
        }
    }
}

impl From<&EngineConfig> for GatewayConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            origin: config.origin.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
            max_redirects: 5,
        }
    }
}

/// A delivered backend response.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers as name/value pairs
    pub headers: Vec<(String, String)>,
    /// Response body bytes
    pub body: Bytes,
}

impl GatewayResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network access used by the engine.
///
/// `get` serves fetch handling, `post_json` serves order replay. Both
/// take root-relative paths; the implementation owns the origin.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get(&self, path: &str) -> Result<GatewayResponse, Error>;

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<GatewayResponse, Error>;
}

/// Gateway backed by a real HTTP client.
pub struct HttpGateway {
    http: Client,
    base: Url,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Create a gateway for the configured origin.
    pub fn new(config: GatewayConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        let base =
            Url::parse(&config.origin).map_err(|e| Error::Network(format!("invalid origin {}: {e}", config.origin)))?;

        Ok(Self { http, base, config })
    }

    fn join(&self, path: &str) -> Result<Url, Error> {
        self.base.join(path).map_err(|e| Error::InvalidPath(format!("{path}: {e}")))
    }

    async fn read_response(&self, response: reqwest::Response) -> Result<GatewayResponse, Error> {
        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        Ok(GatewayResponse { status, content_type, headers, body })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get(&self, path: &str) -> Result<GatewayResponse, Error> {
        let start = Instant::now();
        let url = self.join(path)?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("GET {url}: {e}")))?;

        let out = self.read_response(response).await?;

        tracing::debug!(
            "GET {} -> {} in {}ms ({} bytes)",
            path,
            out.status,
            start.elapsed().as_millis(),
            out.body.len()
        );

        Ok(out)
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<GatewayResponse, Error> {
        let start = Instant::now();
        let url = self.join(path)?;

        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("POST {url}: {e}")))?;

        let out = self.read_response(response).await?;

        tracing::debug!("POST {} -> {} in {}ms", path, out.status, start.elapsed().as_millis());

        Ok(out)
    }
}
