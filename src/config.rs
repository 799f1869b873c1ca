// src/config.rs

//! Manages bridge configuration: loading, defaults and validation.

use crate::core::backend::{OperatingState, TagArea, TagDataType};
use crate::core::protocol::DEFAULT_MAX_LINE_LENGTH;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use tracing::warn;

/// Configuration for the Prometheus metrics exporter.
#[derive(Deserialize, Debug, Clone)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    9464
}

/// A tag of a simulated instance.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SimulatedTagConfig {
    pub name: String,
    pub area: TagArea,
    pub data_type: TagDataType,
    /// Initial byte value of the tag.
    #[serde(default)]
    pub initial: u8,
}

impl SimulatedTagConfig {
    fn new(name: &str, area: TagArea, data_type: TagDataType) -> Self {
        Self {
            name: name.to_string(),
            area,
            data_type,
            initial: 0,
        }
    }
}

/// One simulated device instance.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SimulatedInstanceConfig {
    pub name: String,
    #[serde(default)]
    pub operating_state: OperatingState,
    #[serde(default)]
    pub tags: Vec<SimulatedTagConfig>,
}

/// Describes the in-process device runtime the bridge attaches to.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub instances: Vec<SimulatedInstanceConfig>,
}

impl Default for SimulationConfig {
    /// A single instance named like the default selector, with four marker
    /// bytes interleaved with tags the directory must skip.
    fn default() -> Self {
        use TagArea::*;
        use TagDataType::*;
        Self {
            instances: vec![SimulatedInstanceConfig {
                name: default_instance(),
                operating_state: OperatingState::Run,
                tags: vec![
                    SimulatedTagConfig::new("Start_Button", Input, Bool),
                    SimulatedTagConfig::new("Gesture_Byte", Marker, Byte),
                    SimulatedTagConfig::new("Status_Byte", Marker, Byte),
                    SimulatedTagConfig::new("Conveyor_Speed", Marker, Word),
                    SimulatedTagConfig::new("Aux_Byte_2", Marker, Byte),
                    SimulatedTagConfig::new("Lamp_Output", Output, Byte),
                    SimulatedTagConfig::new("Aux_Byte_3", Marker, Byte),
                ],
            }],
        }
    }
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_instance")]
    instance: String,
    #[serde(default = "default_max_line_length")]
    max_line_length: usize,
    #[serde(default)]
    metrics: MetricsConfig,
    #[serde(default)]
    simulation: SimulationConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_instance() -> String {
    "GestureControl".to_string()
}
fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}

/// The fully resolved bridge configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    /// Fixed for the lifetime of the process.
    pub port: u16,
    pub log_level: String,
    /// Name of the device instance to attach to.
    pub instance: String,
    pub max_line_length: usize,
    pub metrics: MetricsConfig,
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            instance: default_instance(),
            max_line_length: default_max_line_length(),
            metrics: MetricsConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates the configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in '{path}'"))
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let config = Config {
            host: raw_config.host,
            port: raw_config.port,
            log_level: raw_config.log_level,
            instance: raw_config.instance,
            max_line_length: raw_config.max_line_length,
            metrics: raw_config.metrics,
            simulation: raw_config.simulation,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the resolved configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.instance.trim().is_empty() {
            return Err(anyhow!("instance cannot be empty"));
        }
        if self.max_line_length == 0 {
            return Err(anyhow!("max_line_length cannot be 0"));
        }
        if self.metrics.enabled && self.metrics.port == self.port {
            return Err(anyhow!(
                "metrics.port ({}) must differ from the bridge port",
                self.metrics.port
            ));
        }

        for instance in &self.simulation.instances {
            let mut seen = HashSet::new();
            for tag in &instance.tags {
                if !seen.insert(tag.name.as_str()) {
                    return Err(anyhow!(
                        "duplicate tag '{}' in simulated instance '{}'",
                        tag.name,
                        instance.name
                    ));
                }
            }
        }

        if self.simulation.instances.is_empty() {
            warn!("No simulated instances configured. Attaching to the device will fail.");
        }
        Ok(())
    }

    /// Applies command-line overrides, then re-validates the result.
    pub fn apply_overrides(&mut self, port: Option<u16>, instance: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(instance) = instance {
            self.instance = instance.to_string();
        }
        self.validate()
            .context("Invalid configuration after command-line overrides")
    }

    /// The `host:port` string the listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
