//! Engine core.
//!
//! [`Engine`] owns the durable store, the network gateway, and the host
//! platform bridge. Each inbound event kind has one async handler method,
//! spread across the component modules:
//!
//! - install / activate — [`lifecycle`](crate::lifecycle)
//! - fetch — [`strategy`](crate::strategy)
//! - sync — [`queue`](crate::queue)
//! - push / notification click — [`notify`](crate::notify)
//! - message — [`control`](crate::control)
//!
//! Handlers share no mutable state beyond the lifecycle stage; everything
//! that must survive between events lives in the store.

use std::sync::{Arc, RwLock};

use crate::platform::Platform;
use crate::writes::BackgroundWrites;
use larder_client::Gateway;
use larder_core::{EngineConfig, StoreDb};

/// Lifecycle stage of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed; nothing seeded yet.
    Idle,
    /// Install finished; waiting for activation.
    Installed,
    /// In control of requests.
    Active,
}

/// The offline caching and synchronization engine.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) store: StoreDb,
    pub(crate) gateway: Arc<dyn Gateway>,
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) writes: BackgroundWrites,
    state: RwLock<EngineState>,
}

impl Engine {
    /// Build an engine over an opened store.
    ///
    /// The engine serves nothing until [`install`](Engine::install) and
    /// [`activate`](Engine::activate) have run.
    pub fn new(
        config: EngineConfig,
        store: StoreDb,
        gateway: Arc<dyn Gateway>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            platform,
            writes: BackgroundWrites::default(),
            state: RwLock::new(EngineState::Idle),
        }
    }

    /// Current lifecycle stage.
    pub fn state(&self) -> EngineState {
        // A poisoned lock cannot corrupt a Copy enum; recover the value.
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_state(&self, state: EngineState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// The configuration this instance was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The durable store, shared with the calling application.
    ///
    /// This is where the app inserts pending orders when a write fails
    /// offline, and where it keeps favorites.
    pub fn store(&self) -> &StoreDb {
        &self.store
    }

    /// Wait until every fire-and-forget cache write has landed.
    ///
    /// Responses never wait on cache writes, so shutdown (and tests)
    /// call this to let stragglers finish.
    pub async fn quiesce(&self) {
        self.writes.quiesce().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_engine;

    #[tokio::test]
    async fn test_new_engine_starts_idle() {
        let (_, _, engine) = test_engine().await;
        assert_eq!(engine.state(), EngineState::Idle);
    }
}
