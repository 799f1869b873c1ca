// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: framing request
//! lines, dispatching them and writing the responses back.

mod guard;
mod handler;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
