// src/core/backend/simulated.rs

//! An in-process device runtime.
//!
//! Instances and their tags come from the `[simulation]` section of the
//! configuration. Each instance keeps its byte memory in a `DashMap`, so
//! concurrent connections can read and write tags without a global lock.

use super::{
    BackendConnector, BackendError, DeviceBackend, InstanceInfo, OperatingState, TagArea,
    TagDataType, TagInfo,
};
use crate::config::SimulationConfig;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// One simulated device instance.
#[derive(Debug)]
pub struct SimulatedDevice {
    name: String,
    tags: Vec<TagInfo>,
    memory: DashMap<String, (TagDataType, u8)>,
    state: RwLock<OperatingState>,
    writes: AtomicU64,
    /// When set, every byte read and write yields to the scheduler once the
    /// value has been taken, the way a runtime round trip would.
    yield_on_io: AtomicBool,
}

impl SimulatedDevice {
    /// Creates a powered-on device with the given tags, all zeroed.
    pub fn new(name: impl Into<String>, tags: Vec<TagInfo>) -> Self {
        let memory = tags
            .iter()
            .map(|t| (t.name.clone(), (t.data_type, 0)))
            .collect();
        Self {
            name: name.into(),
            tags,
            memory,
            state: RwLock::new(OperatingState::Run),
            writes: AtomicU64::new(0),
            yield_on_io: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw byte stored for a tag, bypassing type and state checks.
    pub fn peek(&self, tag: &str) -> Option<u8> {
        self.memory.get(tag).map(|cell| cell.1)
    }

    /// Overwrites the raw byte stored for a tag, bypassing type and state checks.
    pub fn poke(&self, tag: &str, value: u8) -> bool {
        match self.memory.get_mut(tag) {
            Some(mut cell) => {
                cell.1 = value;
                true
            }
            None => false,
        }
    }

    pub fn set_operating_state(&self, state: OperatingState) {
        *self.state.write() = state;
    }

    /// Makes every `read_u8` and `write_u8` suspend once before returning.
    pub fn set_yield_on_io(&self, enabled: bool) {
        self.yield_on_io.store(enabled, Ordering::Relaxed);
    }

    /// Number of successful `write_u8` calls served so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn ensure_online(&self) -> Result<(), BackendError> {
        if *self.state.read() == OperatingState::Off {
            return Err(BackendError::Offline(self.name.clone()));
        }
        Ok(())
    }

    async fn io_latency(&self) {
        if self.yield_on_io.load(Ordering::Relaxed) {
            tokio::task::yield_now().await;
        }
    }

    fn check_byte(tag: &str, data_type: TagDataType) -> Result<(), BackendError> {
        if data_type != TagDataType::Byte {
            return Err(BackendError::TypeMismatch {
                tag: tag.to_string(),
                expected: TagDataType::Byte,
                actual: data_type,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceBackend for SimulatedDevice {
    async fn tags(&self) -> Result<Vec<TagInfo>, BackendError> {
        Ok(self.tags.clone())
    }

    async fn read_u8(&self, tag: &str) -> Result<u8, BackendError> {
        self.ensure_online()?;
        let value = {
            let cell = self
                .memory
                .get(tag)
                .ok_or_else(|| BackendError::UnknownTag(tag.to_string()))?;
            Self::check_byte(tag, cell.0)?;
            cell.1
        };
        self.io_latency().await;
        Ok(value)
    }

    async fn write_u8(&self, tag: &str, value: u8) -> Result<(), BackendError> {
        self.ensure_online()?;
        {
            let mut cell = self
                .memory
                .get_mut(tag)
                .ok_or_else(|| BackendError::UnknownTag(tag.to_string()))?;
            Self::check_byte(tag, cell.0)?;
            cell.1 = value;
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.io_latency().await;
        Ok(())
    }

    fn operating_state(&self) -> OperatingState {
        *self.state.read()
    }
}

/// A registry of simulated instances, addressed by sequential ids starting at 1.
#[derive(Debug, Default)]
pub struct SimulatedRuntime {
    devices: Vec<Arc<SimulatedDevice>>,
}

impl SimulatedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the runtime described by the `[simulation]` configuration section.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut runtime = Self::new();
        for instance in &config.instances {
            let tags = instance
                .tags
                .iter()
                .map(|t| TagInfo::new(t.name.clone(), t.area, t.data_type))
                .collect();
            let device = runtime.add_instance(&instance.name, tags);
            for tag in &instance.tags {
                device.poke(&tag.name, tag.initial);
            }
            device.set_operating_state(instance.operating_state);
        }
        runtime
    }

    /// Registers a new instance and returns a handle to it.
    pub fn add_instance(&mut self, name: &str, tags: Vec<TagInfo>) -> Arc<SimulatedDevice> {
        let device = Arc::new(SimulatedDevice::new(name, tags));
        self.devices.push(device.clone());
        device
    }

    /// Convenience for an instance holding `count` marker bytes named `MarkerByte<n>`.
    pub fn with_marker_bytes(name: &str, count: usize) -> (Self, Arc<SimulatedDevice>) {
        let mut runtime = Self::new();
        let tags = (0..count)
            .map(|i| TagInfo::new(format!("MarkerByte{i}"), TagArea::Marker, TagDataType::Byte))
            .collect();
        let device = runtime.add_instance(name, tags);
        (runtime, device)
    }
}

#[async_trait]
impl BackendConnector for SimulatedRuntime {
    async fn instances(&self) -> Result<Vec<InstanceInfo>, BackendError> {
        Ok(self
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| InstanceInfo {
                id: i as u32 + 1,
                name: d.name().to_string(),
            })
            .collect())
    }

    async fn connect(&self, id: u32) -> Result<Arc<dyn DeviceBackend>, BackendError> {
        let index = id
            .checked_sub(1)
            .ok_or(BackendError::UnknownInstance(id))? as usize;
        let device = self
            .devices
            .get(index)
            .ok_or(BackendError::UnknownInstance(id))?;
        Ok(device.clone())
    }
}
