// src/core/metrics.rs

//! Defines and registers Prometheus metrics for bridge monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};

lazy_static! {
    /// The number of clients currently connected to the bridge.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("bitbridge_connected_clients", "Number of currently connected clients.").unwrap();
    /// The number of marker bytes mapped at startup.
    pub static ref MAPPED_BYTES: Gauge =
        register_gauge!("bitbridge_mapped_bytes", "Number of marker byte tags in the directory.").unwrap();

    /// The total number of connections accepted since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("bitbridge_connections_received_total", "Total number of connections received.").unwrap();
    /// The total number of request lines answered since startup.
    pub static ref COMMANDS_PROCESSED_TOTAL: Counter =
        register_counter!("bitbridge_commands_processed_total", "Total number of commands processed.").unwrap();
    /// Requests answered with an `ERROR:` line, labeled by failure kind.
    pub static ref COMMAND_ERRORS_TOTAL: CounterVec =
        register_counter_vec!("bitbridge_command_errors_total", "Total number of failed commands, labeled by kind.", &["kind"]).unwrap();

    /// A histogram of command execution latencies.
    pub static ref COMMAND_LATENCY_SECONDS: Histogram =
        register_histogram!("bitbridge_command_latency_seconds", "Latency of command processing in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| format!("# failed to encode metrics: {e}\n"))
}
