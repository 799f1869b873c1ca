// src/core/errors.rs

//! Defines the error types shared by the protocol engine.

use crate::core::backend::BackendError;
use std::sync::Arc;
use thiserror::Error;

/// Every failure a request or a connection can run into.
///
/// The `Display` text of the request-level variants is exactly what the client
/// sees after the `ERROR: ` prefix, so the messages are part of the wire protocol.
#[derive(Error, Debug, Clone)]
pub enum BridgeError {
    #[error("Invalid command format (need: ACTION AREA BYTE BIT [VALUE])")]
    InvalidFormat,

    #[error("Unknown command (use READ or WRITE)")]
    UnknownCommand,

    #[error("Invalid number format in command")]
    InvalidNumber,

    #[error("Bit offset must be 0-7, got {0}")]
    InvalidBitOffset(i32),

    #[error("No tag mapped for %{area}B{byte}")]
    UnmappedAddress { area: String, byte: i32 },

    /// A device read or write failed. Carries the backend's own message.
    #[error("{0}")]
    Backend(String),

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Line exceeds maximum length of {0} bytes")]
    LineTooLong(usize),
}

impl BridgeError {
    /// Renders the error as a single response line for the client.
    pub fn to_response(&self) -> String {
        format!("ERROR: {self}")
    }
}

impl PartialEq for BridgeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BridgeError::Io(e1), BridgeError::Io(e2)) => e1.to_string() == e2.to_string(),
            (BridgeError::InvalidBitOffset(b1), BridgeError::InvalidBitOffset(b2)) => b1 == b2,
            (
                BridgeError::UnmappedAddress { area: a1, byte: b1 },
                BridgeError::UnmappedAddress { area: a2, byte: b2 },
            ) => a1 == a2 && b1 == b2,
            (BridgeError::Backend(s1), BridgeError::Backend(s2)) => s1 == s2,
            (BridgeError::LineTooLong(l1), BridgeError::LineTooLong(l2)) => l1 == l2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Io(Arc::new(e))
    }
}

impl From<BackendError> for BridgeError {
    fn from(e: BackendError) -> Self {
        BridgeError::Backend(e.to_string())
    }
}

impl From<std::num::ParseIntError> for BridgeError {
    fn from(_: std::num::ParseIntError) -> Self {
        BridgeError::InvalidNumber
    }
}
