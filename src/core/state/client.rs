// src/core/state/client.rs

//! Contains state definitions related to client connections.

use dashmap::DashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub type ClientMap = Arc<DashMap<u64, ClientInfo>>;

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub addr: SocketAddr,
    pub client_id: u64,
    pub created: Instant,
}

impl ClientInfo {
    pub fn new(addr: SocketAddr, client_id: u64) -> Self {
        Self {
            addr,
            client_id,
            created: Instant::now(),
        }
    }
}

impl fmt::Display for ClientInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client#{}", self.client_id)
    }
}
