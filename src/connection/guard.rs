// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::metrics;
use crate::core::state::BridgeState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// An RAII guard to ensure connection bookkeeping is always undone when a
/// connection handler's scope is exited, whatever the exit path.
pub struct ConnectionGuard {
    /// A shared reference to the bridge state.
    pub(crate) state: Arc<BridgeState>,
    /// The identifier assigned to the client at accept time.
    pub(crate) client_id: u64,
    /// The network address of the client.
    pub(crate) addr: SocketAddr,
}

impl ConnectionGuard {
    /// Creates a new `ConnectionGuard`.
    pub(crate) fn new(state: Arc<BridgeState>, client_id: u64, addr: SocketAddr) -> Self {
        Self {
            state,
            client_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    /// Decrements the active-connection counter and removes the client from
    /// the client map.
    fn drop(&mut self) {
        metrics::CONNECTED_CLIENTS.dec();
        let removed = self.state.clients.remove(&self.client_id);
        let remaining = self.state.stats.connection_closed();
        match removed {
            Some((_, client)) => info!(
                "{} ({}) disconnected after {:.1?}. Active connections: {}",
                client,
                client.addr,
                client.created.elapsed(),
                remaining
            ),
            None => {
                debug!(
                    "Client#{} ({}) was not in the client map upon cleanup.",
                    self.client_id, self.addr
                );
                info!(
                    "Client#{} ({}) disconnected. Active connections: {}",
                    self.client_id, self.addr, remaining
                );
            }
        }
    }
}
