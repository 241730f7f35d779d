//! SQLite-backed durable store for the offline engine.
//!
//! This module provides persistent storage with async access via
//! tokio-rusqlite. It holds three kinds of state:
//!
//! - Cache generations and their stored request/response entries
//! - The offline order queue consumed by replay
//! - Favorite restaurant bookmarks
//!
//! Schema migrations run automatically on open, and the database uses
//! WAL mode so several readers can share one store.

pub mod connection;
pub mod entries;
pub mod favorites;
pub mod hash;
pub mod migrations;
pub mod orders;

pub use crate::Error;

pub use connection::StoreDb;
pub use entries::CachedEntry;
pub use favorites::Favorite;
pub use orders::{OrderStatus, PendingOrder};
