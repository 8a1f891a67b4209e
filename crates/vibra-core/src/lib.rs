//! Multi-channel haptic carrier engine.
//!
//! A fixed-frequency sine carrier is amplitude-modulated per actuator by a
//! queue of timed segments and rendered as interleaved frames for a
//! multichannel output device.
//!
//! # Primary API
//!
//! - [`Engine`]: Validates configuration and owns the render and ingest halves
//! - [`EngineHandle`]: Ingest side (enqueue, telemetry, counters)
//! - [`Renderer`]: Real-time render callback
//! - [`TelemetryWindow`]: Time-windowed log of received commands
//! - [`HeadlessOutput`]: Clock-driven render thread without audio hardware
//!
//! # Feature-gated APIs
//!
//! - `"audio-io"`: CPAL device selection and [`AudioOutput`]
//!
//! # Example
//!
//! ```ignore
//! use vibra_core::{Engine, EngineConfig, Segment};
//!
//! let (handle, renderer) = Engine::initialize(EngineConfig::default(), 8)?.into_parts();
//! handle.enqueue(Segment::new(4410, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.5]))?;
//! let output = HeadlessOutput::start(renderer, 44_100.0, 512)?;
//! ```

/// Upper bound on actuators per engine. Amplitude vectors up to this length
/// are stored inline.
pub const MAX_ACTUATORS: usize = 32;

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::EngineConfig;

mod mapping;
pub use mapping::ChannelMapper;

mod phase;
pub use phase::PhaseAccumulator;

pub mod segment;
pub use segment::{segment_queue, Amplitudes, Segment, SegmentConsumer, SegmentProducer};

mod stats;
pub use stats::{AtomicCounter, EngineStats, StatsSnapshot};

pub mod telemetry;
pub use telemetry::{TelemetryRecord, TelemetryWindow};

mod render;
pub use render::Renderer;

mod engine;
pub use engine::{Engine, EngineHandle};

pub mod output;
pub use output::{BlockObserver, HeadlessOutput};

#[cfg(feature = "audio-io")]
pub use output::{list_output_devices, select_output_device, AudioOutput, SelectedDevice};
