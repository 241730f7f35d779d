//! Unified error types for larder.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, the gateway, and the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("store migration failed: {0}")]
    MigrationFailed(String),

    /// A seed resource could not be fetched or stored during install.
    #[error("install seed failed for {path}: {reason}")]
    SeedFailed { path: String, reason: String },

    /// Network-level failure: connect, timeout, or read error.
    #[error("network error: {0}")]
    Network(String),

    /// Response body exceeded the configured byte cap.
    #[error("response too large: {0}")]
    TooLarge(String),

    /// Request path could not be normalized or resolved.
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// Offline with no cached fallback for the request.
    #[error("offline and nothing cached for {0}")]
    Offline(String),

    /// Activation was attempted before a completed install.
    #[error("engine is not installed")]
    NotInstalled,

    /// A request reached the engine before it claimed control.
    #[error("engine is not active")]
    NotActive,

    /// The control channel was closed before a reply arrived.
    #[error("control channel closed")]
    ChannelClosed,

    /// Stored payload or header data could not be (de)serialized.
    #[error("malformed stored payload: {0}")]
    Payload(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Payload(err.to_string())
    }
}
