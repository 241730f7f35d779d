//! Configuration validation rules.
//!
//! This module provides validation logic for `EngineConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::EngineConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl EngineConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - a generation name is empty, or both generations share a name
    /// - `seed_manifest` is empty
    /// - `api_prefix` does not start and end with '/'
    /// - `orders_path` does not start with '/'
    /// - `origin` is empty or has a trailing slash
    /// - `timeout_ms` or `max_bytes` fall outside sane bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.static_generation.is_empty() {
            return Err(ConfigError::Invalid {
                field: "static_generation".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.runtime_generation.is_empty() {
            return Err(ConfigError::Invalid {
                field: "runtime_generation".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.static_generation == self.runtime_generation {
            return Err(ConfigError::Invalid {
                field: "runtime_generation".into(),
                reason: "must differ from static_generation".into(),
            });
        }

        if self.seed_manifest.is_empty() {
            return Err(ConfigError::Invalid {
                field: "seed_manifest".into(),
                reason: "must list at least one path to seed".into(),
            });
        }
        if !self.seed_manifest.iter().any(|p| p == "/") {
            tracing::warn!("seed_manifest does not include \"/\"; offline navigation has no root fallback");
        }

        if !self.api_prefix.starts_with('/') || !self.api_prefix.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "api_prefix".into(),
                reason: "must start and end with '/'".into(),
            });
        }
        if !self.orders_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "orders_path".into(),
                reason: "must be root-relative".into(),
            });
        }
        if !self.orders_path.starts_with(&self.api_prefix) {
            tracing::warn!(
                orders_path = %self.orders_path,
                api_prefix = %self.api_prefix,
                "orders_path is outside api_prefix; replayed orders will not be API-classified"
            );
        }

        if self.origin.is_empty() {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must not be empty".into() });
        }
        if self.origin.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: "must not have a trailing slash".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
