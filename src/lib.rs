//! # Vibra - Multi-channel Haptic Carrier Engine
//!
//! Drives an array of vibrotactile actuators wired to a multichannel audio
//! interface. Each actuator receives the same sine carrier, scaled by a
//! per-actuator amplitude that changes segment by segment as control
//! messages arrive.
//!
//! ## Architecture
//!
//! Vibra is an umbrella crate that coordinates:
//! - **vibra-core** - Segment queue, channel mapping, phase-continuous renderer,
//!   telemetry window, headless and CPAL output
//! - **vibra-control** - Control protocol, command ingest, WebSocket/NDJSON
//!   listeners, telemetry endpoint
//!
//! ## Quick Start
//!
//! ```ignore
//! use vibra::prelude::*;
//!
//! let engine = VibraEngine::builder()
//!     .actuators(6)
//!     .carrier_frequency(250.0)
//!     .build()?;
//!
//! let control = engine.bind_control("127.0.0.1:8000", Transport::WebSocket).await?;
//! let telemetry = engine.bind_telemetry("127.0.0.1:8001").await?;
//! tokio::spawn(control.run());
//! tokio::spawn(telemetry.run());
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Headless output, WebSocket control
//! - `audio-io` - CPAL device output
//! - `websocket` - WebSocket control connections

/// Re-export of vibra-core for direct access
pub use vibra_core as core;

/// Re-export of vibra-control for direct access
pub use vibra_control as control;

pub use vibra_core::{
    ChannelMapper, EngineConfig, EngineHandle, EngineStats, HeadlessOutput, Renderer, Segment,
    StatsSnapshot, TelemetryRecord, TelemetryWindow, MAX_ACTUATORS,
};

pub use vibra_control::{
    CommandIngest, ControlMessage, ControlServer, IngestError, ProtocolError, Receipt,
    TelemetryServer, Transport,
};

#[cfg(feature = "audio-io")]
pub use vibra_core::{list_output_devices, select_output_device, AudioOutput};

mod error;
pub use error::{Error, Result};

mod builder;
pub use builder::{OutputMode, VibraEngineBuilder};

mod engine;
pub use engine::VibraEngine;

pub mod prelude {
    pub use crate::{
        ControlMessage, EngineConfig, Error, OutputMode, Result, Segment, TelemetryRecord,
        Transport, VibraEngine, VibraEngineBuilder,
    };
}
