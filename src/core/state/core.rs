// src/core/state/core.rs

//! Defines the central `BridgeState` struct, holding all shared bridge-wide state.

use super::client::ClientMap;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::TagDirectory;
use crate::core::accessor::BitAccessor;
use crate::core::backend::{DeviceBackend, InstanceInfo};
use crate::core::handler::Dispatcher;
use crate::core::metrics;
use std::sync::Arc;

/// The state shared by the listener and every connection handler.
///
/// Everything here is either immutable after construction (configuration,
/// instance, directory) or internally synchronized (stats, client map,
/// per-byte write locks inside the accessor).
pub struct BridgeState {
    pub config: Config,
    /// The device instance the bridge is attached to.
    pub instance: InstanceInfo,
    pub dispatcher: Dispatcher,
    pub stats: StatsState,
    pub clients: ClientMap,
}

impl BridgeState {
    pub fn new(
        config: Config,
        instance: InstanceInfo,
        device: Arc<dyn DeviceBackend>,
        directory: TagDirectory,
    ) -> Self {
        metrics::MAPPED_BYTES.set(directory.len() as f64);
        let accessor = Arc::new(BitAccessor::new(Arc::new(directory), device));
        Self {
            config,
            instance,
            dispatcher: Dispatcher::new(accessor),
            stats: StatsState::new(),
            clients: ClientMap::default(),
        }
    }

    pub fn directory(&self) -> &Arc<TagDirectory> {
        self.dispatcher.directory()
    }
}
