// src/server/mod.rs

use crate::config::Config;
use crate::core::backend::BackendConnector;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod spawner;

pub use connection_loop::run as serve;
pub use context::ServerContext;
pub use initialization::setup;

/// The main bridge startup function, orchestrating all setup phases.
///
/// Returns once SIGINT or SIGTERM has been received and the connections
/// have been drained, or with an error once a background task has failed.
pub async fn run(config: Config, connector: Arc<dyn BackendConnector>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;

    // 1. Attach to the device, build the tag directory and bind the listener.
    let mut server_context = setup(config, connector).await?;

    // 2. Spawn background tasks.
    spawner::spawn_all(&mut server_context);

    // 3. Accept connections until a shutdown signal arrives.
    let shutdown = async move {
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
            _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),
        }
    };
    serve(server_context, shutdown).await
}
