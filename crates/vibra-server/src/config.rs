//! Server configuration, loaded from a TOML file.
//!
//! ```toml
//! control_addr = "0.0.0.0:8000"
//! telemetry_addr = "0.0.0.0:8001"
//! transport = "websocket"
//! output = "headless"
//! device_type = "necklace"
//!
//! [engine]
//! actuator_count = 6
//! sample_rate = 44100.0
//! carrier_frequency = 250.0
//! mapping = [0, 1, 2, 3, 6, 7]
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vibra::{EngineConfig, OutputMode, Transport, VibraEngineBuilder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub engine: EngineConfig,
    pub control_addr: String,
    pub telemetry_addr: String,
    pub transport: Transport,
    pub output: OutputMode,
    /// Block size for headless output.
    pub block_frames: usize,
    /// Device channel count for headless output. Defaults to the mapping's.
    pub device_channels: Option<usize>,
    /// Prefer an output device whose name contains this string.
    pub preferred_device: Option<String>,
    /// Reject control messages addressed to a different device type.
    pub device_type: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            control_addr: "127.0.0.1:8000".into(),
            telemetry_addr: "127.0.0.1:8001".into(),
            transport: Transport::default(),
            output: OutputMode::default(),
            block_frames: 512,
            device_channels: None,
            preferred_device: None,
            device_type: None,
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn builder(&self) -> VibraEngineBuilder {
        let mut builder = vibra::VibraEngine::builder()
            .config(self.engine.clone())
            .output(self.output)
            .block_frames(self.block_frames);
        if let Some(channels) = self.device_channels {
            builder = builder.device_channels(channels);
        }
        if let Some(name) = &self.preferred_device {
            builder = builder.preferred_device(name.clone());
        }
        if let Some(device) = &self.device_type {
            builder = builder.device_filter(device.clone());
        }
        builder
    }
}
