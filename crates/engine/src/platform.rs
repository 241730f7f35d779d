//! Host platform bridge.
//!
//! The engine never talks to the hosting application directly. Everything
//! user-visible (notifications, window opening) and every platform service
//! (deferred sync registration, client claiming) goes through the
//! [`Platform`] trait so the engine can run against a recording fake in
//! tests and against whatever bridge the real host provides.

use async_trait::async_trait;

use crate::notify::NotificationOptions;
use larder_core::Error;

/// Services the hosting application provides to the engine.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Display a notification under the given title.
    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<(), Error>;

    /// Close the notification carrying the given tag.
    async fn close_notification(&self, tag: &str) -> Result<(), Error>;

    /// Open (or focus) an application window at a root-relative path.
    async fn open_window(&self, path: &str) -> Result<(), Error>;

    /// Register a deferred-sync request under a tag.
    ///
    /// The host invokes [`Engine::handle_sync`](crate::Engine::handle_sync)
    /// with the same tag once connectivity is restored.
    async fn register_sync(&self, tag: &str) -> Result<(), Error>;

    /// Take control of all open clients so in-flight requests route
    /// through this engine instance immediately.
    async fn claim_clients(&self) -> Result<(), Error>;
}

/// Platform that surfaces every call through tracing.
///
/// The sidecar default: useful for a host that consumes the log stream,
/// and for running the engine without a real notification surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPlatform;

#[async_trait]
impl Platform for LogPlatform {
    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<(), Error> {
        tracing::info!(
            "notification: {} ({})",
            title,
            options.body.as_deref().unwrap_or_default()
        );
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<(), Error> {
        tracing::info!("close notification {}", tag);
        Ok(())
    }

    async fn open_window(&self, path: &str) -> Result<(), Error> {
        tracing::info!("open window at {}", path);
        Ok(())
    }

    async fn register_sync(&self, tag: &str) -> Result<(), Error> {
        tracing::info!("deferred sync registered under {}", tag);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        tracing::info!("claimed open clients");
        Ok(())
    }
}
