//! Core types and shared functionality for larder.
//!
//! This crate provides:
//! - The SQLite-backed durable store (cache generations, order queue, favorites)
//! - Unified error types
//! - Engine configuration

pub mod config;
pub mod error;
pub mod store;

pub use config::{ConfigError, EngineConfig};
pub use error::Error;
pub use store::{CachedEntry, Favorite, OrderStatus, PendingOrder, StoreDb};
