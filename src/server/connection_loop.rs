// src/server/connection_loop.rs

//! Contains the main loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use crate::core::metrics;
use crate::core::state::ClientInfo;
use anyhow::{Result, anyhow};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// How long handlers get to notice the shutdown signal before being aborted.
const HANDLER_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);
const BACKGROUND_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Accepts connections until `shutdown` resolves, then drains.
///
/// Every accepted client gets its own task. The loop never waits on a handler,
/// and a failing handler never affects the listener or other clients.
///
/// Returns an error when a background task failed and forced the shutdown.
pub async fn run(mut ctx: ServerContext, shutdown: impl Future<Output = ()>) -> Result<()> {
    let mut client_tasks = JoinSet::new();
    let mut fatal = None;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections.");
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => {
                        error!("CRITICAL: Background task failed: {:#}. Shutting down.", e);
                        fatal = Some(e);
                        break;
                    }
                    Err(e) => {
                        error!("CRITICAL: Background task panicked: {e:?}. Shutting down.");
                        fatal = Some(anyhow!("Background task panicked: {e}"));
                        break;
                    }
                }
            },

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        let client_id = ctx.state.stats.connection_opened();
                        metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
                        metrics::CONNECTED_CLIENTS.inc();
                        ctx.state.clients.insert(client_id, ClientInfo::new(addr, client_id));
                        info!(
                            "Client#{} connected from {}. Active connections: {}",
                            client_id,
                            addr,
                            ctx.state.stats.active_connections()
                        );

                        if let Err(e) = socket.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }

                        let handler = ConnectionHandler::new(
                            socket,
                            addr,
                            ctx.state.clone(),
                            client_id,
                            ctx.shutdown_tx.subscribe(),
                        );
                        client_tasks.spawn(handler.run());
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    drop(ctx.listener);
    if ctx.shutdown_tx.send(()).is_err() {
        // No receivers: nothing is connected and no background task is running.
        info!("No tasks were listening for the shutdown signal.");
    }

    if tokio::time::timeout(HANDLER_DRAIN_TIMEOUT, async {
        while client_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Some client handlers did not stop in time, aborting them.");
    }
    client_tasks.shutdown().await;
    info!("All client connections closed.");

    if tokio::time::timeout(BACKGROUND_DRAIN_TIMEOUT, async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    }
    info!("Bridge shutdown complete.");

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
