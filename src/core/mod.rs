// src/core/mod.rs

//! The protocol engine: addressing, tag resolution, bit access and dispatch.

pub mod accessor;
pub mod address;
pub mod backend;
pub mod directory;
pub mod errors;
pub mod handler;
pub mod metrics;
pub mod protocol;
pub mod state;

pub use address::{Address, Area};
pub use directory::TagDirectory;
pub use errors::BridgeError;
pub use protocol::Command;
