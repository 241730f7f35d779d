//! Engine configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LARDER_*)
//! 2. TOML config file (if LARDER_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Generation names, the seed manifest, and the static-asset list are all
//! per-instance configuration rather than baked-in constants, so one build
//! can serve several deployments.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Engine configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LARDER_*)
/// 2. TOML config file (if LARDER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the SQLite store database.
    ///
    /// Set via LARDER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the backend this engine fronts, without a trailing slash.
    ///
    /// Set via LARDER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the static cache generation seeded at install.
    ///
    /// Bump the version suffix to roll out a new asset set; activation
    /// purges generations under any other name.
    #[serde(default = "default_static_generation")]
    pub static_generation: String,

    /// Name of the runtime cache generation populated by fetch handling.
    #[serde(default = "default_runtime_generation")]
    pub runtime_generation: String,

    /// Root-relative paths fetched and cached verbatim at install.
    #[serde(default = "default_seed_manifest")]
    pub seed_manifest: Vec<String>,

    /// Static-asset patterns served cache-first.
    ///
    /// An entry starting with '/' must match the path exactly; anything
    /// else is a suffix match (".css", ".png", ...).
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Path prefix that marks a request as an API call.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Path orders are replayed to.
    #[serde(default = "default_orders_path")]
    pub orders_path: String,

    /// Deferred-sync tag that triggers order replay.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via LARDER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LARDER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via LARDER_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./larder.sqlite3")
}

fn default_origin() -> String {
    "http://localhost:1337".into()
}

fn default_static_generation() -> String {
    "larder-static-v1".into()
}

fn default_runtime_generation() -> String {
    "larder-runtime".into()
}

fn default_seed_manifest() -> Vec<String> {
    let mut manifest = vec![
        "/".to_string(),
        "/manifest.json".to_string(),
        "/icons/icon-192.png".to_string(),
        "/icons/icon-512.png".to_string(),
    ];
    for n in 1..=10 {
        manifest.push(format!("/img/{n}.jpg"));
    }
    manifest
}

fn default_static_assets() -> Vec<String> {
    ["/manifest.json", ".css", ".js", ".png", ".jpg", ".svg", ".webp", ".woff2"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_orders_path() -> String {
    "/api/orders".into()
}

fn default_sync_tag() -> String {
    "sync-orders".into()
}

fn default_user_agent() -> String {
    "larder/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            static_generation: default_static_generation(),
            runtime_generation: default_runtime_generation(),
            seed_manifest: default_seed_manifest(),
            static_assets: default_static_assets(),
            api_prefix: default_api_prefix(),
            orders_path: default_orders_path(),
            sync_tag: default_sync_tag(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl EngineConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LARDER_`
    /// 2. TOML file from `LARDER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LARDER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LARDER_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
