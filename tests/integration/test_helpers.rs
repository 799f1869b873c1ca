// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use bitbridge::config::Config;
use bitbridge::core::TagDirectory;
use bitbridge::core::backend::{DeviceBackend, InstanceInfo, SimulatedDevice, SimulatedRuntime};
use bitbridge::core::state::BridgeState;
use bitbridge::server::{self, ServerContext};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Name of the simulated instance used by the tests.
pub const TEST_INSTANCE: &str = "TestPlant";

/// Set up minimal tracing for tests (ignore error if already initialized).
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// TestContext provides a dispatcher wired to a simulated device, without sockets.
pub struct TestContext {
    pub state: Arc<BridgeState>,
    pub device: Arc<SimulatedDevice>,
}

impl TestContext {
    /// Creates a context whose device holds `marker_bytes` marker byte tags.
    pub async fn new(marker_bytes: usize) -> Self {
        init_tracing();
        let (_runtime, device) = SimulatedRuntime::with_marker_bytes(TEST_INSTANCE, marker_bytes);
        let tags = device.tags().await.expect("simulated tags");
        let directory = TagDirectory::build(&tags);
        let state = Arc::new(BridgeState::new(
            Config::default(),
            InstanceInfo {
                id: 1,
                name: TEST_INSTANCE.to_string(),
            },
            device.clone(),
            directory,
        ));
        Self { state, device }
    }

    /// Sends one request line through the dispatcher.
    pub async fn execute(&self, line: &str) -> String {
        self.state.dispatcher.handle_line(line).await
    }

    /// Raw byte value of marker byte `offset`.
    pub fn byte(&self, offset: usize) -> u8 {
        self.device
            .peek(&format!("MarkerByte{offset}"))
            .expect("mapped marker byte")
    }

    pub fn set_byte(&self, offset: usize, value: u8) {
        assert!(self.device.poke(&format!("MarkerByte{offset}"), value));
    }
}

/// A running bridge bound to an ephemeral local port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<BridgeState>,
    pub device: Arc<SimulatedDevice>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn start(marker_bytes: usize) -> Self {
        init_tracing();
        let (runtime, device) = SimulatedRuntime::with_marker_bytes(TEST_INSTANCE, marker_bytes);
        let ctx: ServerContext = server::setup(test_config(), Arc::new(runtime))
            .await
            .expect("bridge setup");
        let addr = ctx.local_addr().expect("bound address");
        let state = ctx.state.clone();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server::serve(ctx, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            state,
            device,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Triggers shutdown and waits for the accept loop to drain.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("server stopped in time")
                .expect("server task did not panic")
                .expect("server stopped cleanly");
        }
    }

    /// Polls until the active connection count equals `expected`.
    pub async fn wait_for_active(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.state.stats.active_connections() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {expected} active connections, found {}",
                self.state.stats.active_connections()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// A configuration bound to loopback on an OS-assigned port.
#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        instance: TEST_INSTANCE.to_string(),
        ..Config::default()
    }
}
