// src/core/state/mod.rs

//! Defines the central `BridgeState` struct and the state components it owns.

mod client;
mod core;
mod stats;

pub use client::{ClientInfo, ClientMap};
pub use core::BridgeState;
pub use stats::StatsState;
