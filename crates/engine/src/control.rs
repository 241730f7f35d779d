//! Control channel for the hosting page.
//!
//! A small request/reply command surface: force activation, report the
//! total cache size, clear stale caches. Commands arrive as JSON objects
//! tagged by `type`; unknown types are a forward-compatible no-op, never
//! an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::engine::{Engine, EngineState};
use larder_core::Error;

/// Commands accepted from the hosting page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlRequest {
    /// Force immediate activation of an installed-but-waiting engine.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    /// Sum the byte size of every stored response across all generations.
    #[serde(rename = "GET_CACHE_SIZE")]
    GetCacheSize,
    /// Delete every generation except the current static one.
    #[serde(rename = "CLEAR_CACHE")]
    ClearCache,
    /// Anything this engine version does not know. Silently ignored.
    #[serde(other)]
    Unknown,
}

/// Replies sent back over the channel.
///
/// Serializes to the bare wire shapes `{"size": n}` and
/// `{"success": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlReply {
    Size { size: u64 },
    Cleared { success: bool },
}

impl Engine {
    /// Handle one control command.
    ///
    /// Returns the reply to send, or `None` for commands that do not
    /// reply (`SKIP_WAITING` and unknown types).
    pub async fn handle_message(&self, request: ControlRequest) -> Result<Option<ControlReply>, Error> {
        match request {
            ControlRequest::SkipWaiting => {
                if self.state() == EngineState::Installed {
                    self.activate().await?;
                } else {
                    tracing::debug!("SKIP_WAITING ignored in state {:?}", self.state());
                }
                Ok(None)
            }
            ControlRequest::GetCacheSize => {
                let size = self.store.total_size().await?;
                Ok(Some(ControlReply::Size { size }))
            }
            ControlRequest::ClearCache => {
                let keep = [self.config.static_generation.as_str()];
                let removed = self.store.purge_generations_except(&keep).await?;
                tracing::info!("cache cleared, removed {} generations", removed.len());
                Ok(Some(ControlReply::Cleared { success: true }))
            }
            ControlRequest::Unknown => {
                tracing::debug!("ignoring unknown control message type");
                Ok(None)
            }
        }
    }
}

type ControlFrame = (ControlRequest, oneshot::Sender<Option<ControlReply>>);

/// Sender half of a spawned control loop.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<ControlFrame>,
}

impl ControlHandle {
    /// Send one command and wait for its reply.
    ///
    /// `None` means the command kind does not reply. Commands that fail
    /// inside the engine also resolve to `None`; the failure is logged on
    /// the engine side so the page never hangs on an error.
    pub async fn send(&self, request: ControlRequest) -> Result<Option<ControlReply>, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| Error::ChannelClosed)?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }
}

/// Serve control commands for an engine on a background task.
///
/// The loop ends when every handle is dropped. Each frame settles its
/// reply channel exactly once.
pub fn spawn_control(engine: Arc<Engine>) -> ControlHandle {
    let (tx, mut rx) = mpsc::channel::<ControlFrame>(16);

    tokio::spawn(async move {
        while let Some((request, reply_tx)) = rx.recv().await {
            let reply = match engine.handle_message(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!("control command failed: {}", e);
                    None
                }
            };
            // The page may have given up waiting; that is not our problem.
            let _ = reply_tx.send(reply);
        }
        tracing::debug!("control channel closed");
    });

    ControlHandle { tx }
}
