//! Client code for larder.
//!
//! This crate provides the HTTP gateway the engine uses to reach the
//! backend it fronts, behind a trait so tests can substitute a fake.

pub mod gateway;

pub use gateway::{Gateway, GatewayConfig, GatewayResponse, HttpGateway};
