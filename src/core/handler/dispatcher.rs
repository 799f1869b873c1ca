// src/core/handler/dispatcher.rs

//! Turns request lines into response lines.
//!
//! The dispatcher is the boundary where typed errors become protocol text:
//! every path out of [`Dispatcher::handle_line`] is a response string, and no
//! request failure ever escapes to the connection handler.

use crate::core::accessor::BitAccessor;
use crate::core::metrics;
use crate::core::protocol::Command;
use crate::core::{BridgeError, TagDirectory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Parses and executes commands against a shared [`BitAccessor`].
#[derive(Clone)]
pub struct Dispatcher {
    accessor: Arc<BitAccessor>,
}

impl Dispatcher {
    pub fn new(accessor: Arc<BitAccessor>) -> Self {
        Self { accessor }
    }

    pub fn directory(&self) -> &Arc<TagDirectory> {
        self.accessor.directory()
    }

    /// Handles one request line and produces exactly one response line.
    pub async fn handle_line(&self, line: &str) -> String {
        let start = Instant::now();
        let response = match Command::try_from(line) {
            Ok(command) => self.execute(command).await,
            Err(e) => {
                debug!("Rejected request {:?}: {}", line, e);
                metrics::COMMAND_ERRORS_TOTAL
                    .with_label_values(&["parse"])
                    .inc();
                e.to_response()
            }
        };
        metrics::COMMANDS_PROCESSED_TOTAL.inc();
        metrics::COMMAND_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());
        response
    }

    /// Executes a parsed command. Failures are rendered as `ERROR: <reason>`.
    pub async fn execute(&self, command: Command) -> String {
        let result = match &command {
            Command::Read(address) => self
                .accessor
                .read_bit(address)
                .await
                .map(|bit| if bit { "1" } else { "0" }.to_string()),
            Command::Write(address, value) => self
                .accessor
                .write_bit(address, *value)
                .await
                .map(|()| "OK".to_string()),
        };

        match result {
            Ok(response) => {
                debug!("{} -> {}", command, response);
                response
            }
            Err(e) => {
                debug!("{} on {} failed: {}", command.name(), command.address(), e);
                metrics::COMMAND_ERRORS_TOTAL
                    .with_label_values(&[error_kind(&e)])
                    .inc();
                e.to_response()
            }
        }
    }
}

/// Label used for the error counter.
fn error_kind(e: &BridgeError) -> &'static str {
    match e {
        BridgeError::InvalidBitOffset(_) => "bit_offset",
        BridgeError::UnmappedAddress { .. } => "unmapped",
        BridgeError::Backend(_) => "backend",
        _ => "parse",
    }
}
