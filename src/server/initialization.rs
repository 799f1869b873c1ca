// src/server/initialization.rs

//! Handles the bridge initialization process: attaching to the device
//! runtime, discovering tags and binding the listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::TagDirectory;
use crate::core::backend::{self, BackendConnector};
use crate::core::state::BridgeState;
use anyhow::{Result, anyhow};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Initializes all bridge components before starting the main loop.
///
/// Failing to attach to the device or to bind the listener is fatal: no
/// connection is ever accepted in that case.
pub async fn setup(config: Config, connector: Arc<dyn BackendConnector>) -> Result<ServerContext> {
    info!("Target instance: {}", config.instance);
    let (shutdown_tx, _) = broadcast::channel(1);

    let attachment = backend::attach(connector.as_ref(), &config.instance)
        .await
        .map_err(|e| anyhow!("Failed to attach to device runtime: {}", e))?;

    info!("Loading tag list...");
    let tags = attachment
        .device
        .tags()
        .await
        .map_err(|e| anyhow!("Failed to load tag list: {}", e))?;
    let directory = TagDirectory::build(&tags);
    log_directory(&directory);

    let listener = bind_listener(&config).await?;

    let state = Arc::new(BridgeState::new(
        config,
        attachment.instance,
        attachment.device,
        directory,
    ));
    info!(
        "Attached to '{}' with {} mapped byte(s).",
        state.instance.name,
        state.directory().len()
    );

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Logs the discovered mapping, or a warning when there is nothing to serve.
fn log_directory(directory: &TagDirectory) {
    if directory.is_empty() {
        warn!("No Marker Byte tags found! Create Byte tags in the Marker area for I/O access.");
        return;
    }
    info!("Auto-discovered Marker Byte tags:");
    for (offset, tag) in directory.iter() {
        info!("  %MB{} -> {}", offset, tag);
    }
}

/// Binds the listening socket, distinguishing a busy port from other failures.
async fn bind_listener(config: &Config) -> Result<TcpListener> {
    let addr = config.listen_addr();
    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!("Bridge listening on {}", addr);
            Ok(listener)
        }
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            error!("Port {} is already in use", config.port);
            error!("Another bridge instance may be running");
            Err(anyhow!("Failed to bind {}: port {} is already in use", addr, config.port))
        }
        Err(e) => Err(anyhow!("Failed to bind {}: {}", addr, e)),
    }
}
