// src/core/backend/mod.rs

//! The seam between the protocol engine and the controlled device runtime.
//!
//! The bridge only ever needs five things from a device runtime: list the
//! running instances, connect to one, list its tags, and read or write a single
//! unsigned byte by tag name. Those are captured by [`BackendConnector`] and
//! [`DeviceBackend`]; everything else about the runtime stays behind them.

pub mod simulated;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::{info, warn};

pub use simulated::{SimulatedDevice, SimulatedRuntime};

/// The memory region a tag lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize)]
pub enum TagArea {
    Input,
    Output,
    Marker,
    DataBlock,
    Counter,
    Timer,
}

/// The value type a tag is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize)]
pub enum TagDataType {
    Bool,
    Byte,
    Char,
    Word,
    Int,
    DWord,
    DInt,
    Real,
}

/// Operating state reported by a device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize)]
pub enum OperatingState {
    Off,
    Stop,
    Startup,
    #[default]
    Run,
}

/// A tag as enumerated by the device runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub area: TagArea,
    pub data_type: TagDataType,
}

impl TagInfo {
    pub fn new(name: impl Into<String>, area: TagArea, data_type: TagDataType) -> Self {
        Self {
            name: name.into(),
            area,
            data_type,
        }
    }
}

/// A device instance registered with the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub id: u32,
    pub name: String,
}

/// Failures raised by the device runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("No device instances found")]
    NoInstances,

    #[error("No device instance with id {0}")]
    UnknownInstance(u32),

    #[error("Tag '{0}' does not exist")]
    UnknownTag(String),

    #[error("Tag '{tag}' has data type {actual}, expected {expected}")]
    TypeMismatch {
        tag: String,
        expected: TagDataType,
        actual: TagDataType,
    },

    #[error("Instance '{0}' is powered off")]
    Offline(String),
}

/// A connected device instance.
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Refreshes and returns the tag list, in the order the runtime reports it.
    async fn tags(&self) -> Result<Vec<TagInfo>, BackendError>;

    /// Reads an unsigned byte by tag name.
    async fn read_u8(&self, tag: &str) -> Result<u8, BackendError>;

    /// Writes an unsigned byte by tag name.
    async fn write_u8(&self, tag: &str, value: u8) -> Result<(), BackendError>;

    fn operating_state(&self) -> OperatingState;
}

/// Entry point into a device runtime.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    /// Lists the registered instances.
    async fn instances(&self) -> Result<Vec<InstanceInfo>, BackendError>;

    /// Opens a connection to the instance with the given id.
    async fn connect(&self, id: u32) -> Result<Arc<dyn DeviceBackend>, BackendError>;
}

/// The outcome of attaching to a device instance at startup.
pub struct Attachment {
    pub instance: InstanceInfo,
    pub device: Arc<dyn DeviceBackend>,
    /// Set when the requested instance was not found and the first one was used.
    pub fallback: bool,
}

/// Picks the instance named `selector`, falling back to the first registered
/// instance when no name matches.
pub fn select_instance<'a>(
    instances: &'a [InstanceInfo],
    selector: &str,
) -> Option<(&'a InstanceInfo, bool)> {
    instances
        .iter()
        .find(|i| i.name == selector)
        .map(|i| (i, false))
        .or_else(|| instances.first().map(|i| (i, true)))
}

/// Enumerates instances, selects one and connects to it.
pub async fn attach(
    connector: &dyn BackendConnector,
    selector: &str,
) -> Result<Attachment, BackendError> {
    info!("Searching for device instances...");
    let instances = connector.instances().await?;

    info!("Found {} instance(s):", instances.len());
    for instance in &instances {
        let marker = if instance.name == selector { " [TARGET]" } else { "" };
        info!("  - {} (ID: {}){}", instance.name, instance.id, marker);
    }

    let (instance, fallback) =
        select_instance(&instances, selector).ok_or(BackendError::NoInstances)?;
    if fallback {
        warn!(
            "Instance '{}' not found, falling back to first available: {}",
            selector, instance.name
        );
    }

    info!("Connecting to: {}...", instance.name);
    let device = connector.connect(instance.id).await?;
    info!(
        "Connected to '{}', operating state: {}",
        instance.name,
        device.operating_state()
    );

    Ok(Attachment {
        instance: instance.clone(),
        device,
        fallback,
    })
}
