// src/core/state/stats.rs

//! Contains state definitions and logic for connection and command statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Holds all counters shared between the listener and the connection handlers.
#[derive(Debug)]
pub struct StatsState {
    /// The number of clients currently connected.
    active_connections: AtomicUsize,
    /// The total number of connections accepted since startup.
    total_connections: AtomicU64,
    /// The total number of request lines answered since startup.
    total_commands: AtomicU64,
    /// Source of client identifiers. Never reused, even after disconnects.
    next_client_id: AtomicU64,
}

impl Default for StatsState {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsState {
    /// Creates a new `StatsState` with zeroed counters.
    pub fn new() -> Self {
        Self {
            active_connections: AtomicUsize::new(0),
            total_connections: AtomicU64::new(0),
            total_commands: AtomicU64::new(0),
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Registers an accepted connection and returns its client identifier.
    pub fn connection_opened(&self) -> u64 {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::AcqRel);
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a closed connection and returns the remaining active count.
    pub fn connection_closed(&self) -> usize {
        // Saturate instead of wrapping if a close is ever recorded twice.
        let previous = self
            .active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn increment_total_commands(&self) {
        self.total_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_commands(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }
}
