//! Fakes and fixtures shared by the engine tests.
//!
//! No test in this crate touches the network or a real notification
//! surface: [`FakeGateway`] answers with programmed responses and keeps a
//! call log, [`RecordingPlatform`] records every host-bridge call.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::engine::Engine;
use crate::notify::NotificationOptions;
use crate::platform::Platform;
use larder_client::{Gateway, GatewayResponse};
use larder_core::{EngineConfig, Error, StoreDb};

#[derive(Clone)]
enum Planned {
    Respond(GatewayResponse),
    Fail(String),
}

fn response(status: u16, content_type: &str, body: &[u8]) -> GatewayResponse {
    GatewayResponse {
        status,
        content_type: Some(content_type.to_string()),
        headers: vec![("content-type".to_string(), content_type.to_string())],
        body: Bytes::copy_from_slice(body),
    }
}

/// Gateway with programmable per-path outcomes and a call log.
#[derive(Default)]
pub(crate) struct FakeGateway {
    routes: Mutex<HashMap<String, Planned>>,
    post_plan: Mutex<VecDeque<Planned>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, serde_json::Value)>>,
}

impl FakeGateway {
    /// Serve `status`/`body` for GETs of `path`.
    pub fn ok(&self, path: &str, status: u16, content_type: &str, body: &[u8]) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Planned::Respond(response(status, content_type, body)));
    }

    /// Make every call fail like a dead connection.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Queue the outcome for the next unplanned POST: an HTTP status.
    pub fn plan_post_status(&self, status: u16) {
        self.post_plan
            .lock()
            .unwrap()
            .push_back(Planned::Respond(response(status, "application/json", b"{}")));
    }

    /// Queue the outcome for the next unplanned POST: a network failure.
    pub fn plan_post_failure(&self, reason: &str) {
        self.post_plan.lock().unwrap().push_back(Planned::Fail(reason.to_string()));
    }

    /// Every call so far, as "GET /path" / "POST /path" lines.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Every POST so far as (path, body) pairs, in call order.
    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn get(&self, path: &str) -> Result<GatewayResponse, Error> {
        self.calls.lock().unwrap().push(format!("GET {path}"));

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }

        let planned = self.routes.lock().unwrap().get(path).cloned();
        match planned {
            Some(Planned::Respond(response)) => Ok(response),
            Some(Planned::Fail(reason)) => Err(Error::Network(reason)),
            None => Ok(response(404, "text/plain", b"not found")),
        }
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<GatewayResponse, Error> {
        self.calls.lock().unwrap().push(format!("POST {path}"));
        self.posts.lock().unwrap().push((path.to_string(), body.clone()));

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }

        let planned = self.post_plan.lock().unwrap().pop_front();
        match planned {
            Some(Planned::Respond(response)) => Ok(response),
            Some(Planned::Fail(reason)) => Err(Error::Network(reason)),
            None => Ok(response(201, "application/json", b"{}")),
        }
    }
}

/// Platform that records every call for later assertions.
#[derive(Default)]
pub(crate) struct RecordingPlatform {
    notifications: Mutex<Vec<(String, NotificationOptions)>>,
    closed: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    syncs: Mutex<Vec<String>>,
    claims: AtomicUsize,
}

impl RecordingPlatform {
    pub fn notifications(&self) -> Vec<(String, NotificationOptions)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn syncs(&self) -> Vec<String> {
        self.syncs.lock().unwrap().clone()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<(), Error> {
        self.notifications.lock().unwrap().push((title.to_string(), options));
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<(), Error> {
        self.closed.lock().unwrap().push(tag.to_string());
        Ok(())
    }

    async fn open_window(&self, path: &str) -> Result<(), Error> {
        self.opened.lock().unwrap().push(path.to_string());
        Ok(())
    }

    async fn register_sync(&self, tag: &str) -> Result<(), Error> {
        self.syncs.lock().unwrap().push(tag.to_string());
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Config with a small two-entry seed manifest and short generation names.
pub(crate) fn seeded_config() -> EngineConfig {
    EngineConfig {
        static_generation: "static-v1".into(),
        runtime_generation: "runtime".into(),
        seed_manifest: vec!["/".to_string(), "/manifest.json".to_string()],
        ..Default::default()
    }
}

/// A gateway pre-loaded with the seed manifest routes, and a platform.
pub(crate) fn fakes() -> (Arc<FakeGateway>, Arc<RecordingPlatform>) {
    let gateway = Arc::new(FakeGateway::default());
    gateway.ok("/", 200, "text/html", b"<html>home</html>");
    gateway.ok("/manifest.json", 200, "application/json", br#"{"name":"resto"}"#);
    (gateway, Arc::new(RecordingPlatform::default()))
}

/// Fresh engine over an in-memory store. Not installed yet.
pub(crate) async fn test_engine() -> (Arc<FakeGateway>, Arc<RecordingPlatform>, Engine) {
    test_engine_with(seeded_config()).await
}

pub(crate) async fn test_engine_with(config: EngineConfig) -> (Arc<FakeGateway>, Arc<RecordingPlatform>, Engine) {
    let (gateway, platform) = fakes();
    let store = StoreDb::open_in_memory().await.expect("in-memory store");
    let engine = Engine::new(config, store, gateway.clone(), platform.clone());
    (gateway, platform, engine)
}

/// Installed and activated engine; the seed fetches are cleared from the
/// gateway call log so tests only see their own traffic.
pub(crate) async fn ready_engine() -> (Arc<FakeGateway>, Arc<RecordingPlatform>, Engine) {
    let (gateway, platform, engine) = test_engine().await;
    engine.install().await.expect("install");
    engine.activate().await.expect("activate");
    gateway.clear_calls();
    (gateway, platform, engine)
}
