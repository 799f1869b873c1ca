// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use crate::core::BridgeError;
use crate::core::protocol::LineCodec;
use crate::core::state::BridgeState;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// Manages the full lifecycle of a client connection.
///
/// The handler owns the connection's `ConnectionGuard`, so the active-connection
/// count is released when the handler is dropped, including when its task is
/// aborted during shutdown before it ever ran.
pub struct ConnectionHandler {
    framed: Framed<TcpStream, LineCodec>,
    addr: SocketAddr,
    state: Arc<BridgeState>,
    client_id: u64,
    shutdown_rx: broadcast::Receiver<()>,
    _guard: ConnectionGuard,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler` for an accepted socket.
    pub fn new(
        socket: TcpStream,
        addr: SocketAddr,
        state: Arc<BridgeState>,
        client_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let codec = LineCodec::new(state.config.max_line_length);
        let guard = ConnectionGuard::new(state.clone(), client_id, addr);
        Self {
            framed: Framed::new(socket, codec),
            addr,
            state,
            client_id,
            shutdown_rx,
            _guard: guard,
        }
    }

    /// The main event loop for the connection: one response line per request line.
    ///
    /// Every failure ends only this connection, so nothing is returned.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                // Prioritize the shutdown signal over pending input.
                biased;
                _ = self.shutdown_rx.recv() => {
                    info!("Client#{} received shutdown signal.", self.client_id);
                    break;
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(line)) => {
                            if let Err(e) = self.process_line(&line).await {
                                self.log_connection_error(&e);
                                break;
                            }
                        }
                        Some(Err(BridgeError::LineTooLong(max))) => {
                            warn!(
                                "Client#{} sent a line longer than {} bytes, closing.",
                                self.client_id, max
                            );
                            if let Err(e) = self
                                .framed
                                .send(BridgeError::LineTooLong(max).to_response())
                                .await
                            {
                                debug!(
                                    "Client#{} did not receive the line length error: {}",
                                    self.client_id, e
                                );
                            }
                            break;
                        }
                        Some(Err(e)) => {
                            self.log_connection_error(&e);
                            break;
                        }
                        None => {
                            debug!("Connection from {} closed by peer.", self.addr);
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Peer disconnects are routine; anything else is worth a warning.
    fn log_connection_error(&self, e: &BridgeError) {
        if is_normal_disconnect(e) {
            debug!("Connection from {} closed by peer: {}", self.addr, e);
        } else {
            warn!("Connection error for Client#{}: {}", self.client_id, e);
        }
    }

    /// Dispatches a request line and sends its response.
    async fn process_line(&mut self, line: &str) -> Result<(), BridgeError> {
        debug!("Client#{} RX: {}", self.client_id, line);
        let response = self.state.dispatcher.handle_line(line).await;
        self.state.stats.increment_total_commands();
        debug!("Client#{} TX: {}", self.client_id, response);
        self.framed.send(response).await
    }
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &BridgeError) -> bool {
    matches!(e, BridgeError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
