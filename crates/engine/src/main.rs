//! larder-sidecar entry point.
//!
//! Boots the engine over the configured store and serves the control
//! protocol on stdio: one JSON command per stdin line, one JSON reply per
//! stdout line. Logging goes to stderr to avoid interfering with the
//! protocol frames on stdout.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use larder_client::{GatewayConfig, HttpGateway};
use larder_core::{EngineConfig, StoreDb};
use larder_engine::{ControlHandle, ControlRequest, Engine, LogPlatform, spawn_control};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = EngineConfig::load()?;
    tracing::info!("Starting larder sidecar against {}", config.origin);

    let store = StoreDb::open(&config.db_path).await?;
    let gateway = Arc::new(HttpGateway::new(GatewayConfig::from(&config))?);
    let engine = Arc::new(Engine::new(config, store, gateway, Arc::new(LogPlatform)));

    engine.install().await?;
    engine.activate().await?;

    let handle = spawn_control(engine.clone());
    serve_stdio(handle).await?;

    engine.quiesce().await;
    tracing::info!("stdin closed, shutting down");

    Ok(())
}

/// Forward stdin command frames to the control loop until EOF.
///
/// Frames that do not parse are logged and skipped; a malformed line from
/// the host must not take the engine down. Commands without a reply
/// produce no output line.
async fn serve_stdio(handle: ControlHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: ControlRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("skipping unparseable control frame: {}", e);
                continue;
            }
        };

        if let Some(reply) = handle.send(request).await? {
            let frame = serde_json::to_string(&reply)?;
            stdout.write_all(frame.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
