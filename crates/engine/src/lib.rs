//! Offline-first caching and synchronization engine for larder.
//!
//! This crate provides:
//! - Install/activate lifecycle over versioned cache generations
//! - Request routing across four caching strategies
//! - Replay of the durable offline order queue
//! - Push and replay notifications behind a host platform bridge
//! - A JSON control channel for the hosting page

pub mod control;
pub mod engine;
pub mod lifecycle;
pub mod notify;
pub mod platform;
pub mod queue;
pub mod router;
pub mod strategy;
pub mod writes;

#[cfg(test)]
mod testutil;

pub use control::{ControlHandle, ControlReply, ControlRequest, spawn_control};
pub use engine::{Engine, EngineState};
pub use notify::{NotificationAction, NotificationClick, NotificationOptions};
pub use platform::{LogPlatform, Platform};
pub use queue::ReplayReport;
pub use router::{ResourceRequest, RouteClass};
pub use strategy::{EngineResponse, ServedFrom};
