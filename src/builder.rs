//! Builder for configuring and constructing a `VibraEngine`.

use crate::engine::{Output, VibraEngine};
use crate::Result;
use serde::{Deserialize, Serialize};
use vibra_control::CommandIngest;
use vibra_core::{Engine, EngineConfig, HeadlessOutput};

/// What drives the render callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Clock thread, no audio device.
    #[default]
    Headless,
    /// CPAL output stream on a device with enough channels.
    #[cfg(feature = "audio-io")]
    Device,
    /// Nothing; the caller takes the renderer with
    /// [`VibraEngine::take_renderer`] and drives it.
    Manual,
}

/// The device channel count defaults to the highest mapped channel + 1 for
/// headless and manual output, and to whatever the selected device reports
/// for device output. With device output the sample rate follows the device
/// when the requested rate is not supported.
///
/// # Example
///
/// ```ignore
/// use vibra::prelude::*;
///
/// let engine = VibraEngine::builder()
///     .actuators(6)
///     .carrier_frequency(250.0)
///     .mapping(vec![0, 1, 2, 3, 6, 7])
///     .build()?;
/// ```
pub struct VibraEngineBuilder {
    config: EngineConfig,
    output: OutputMode,
    block_frames: usize,
    device_channels: Option<usize>,
    preferred_device: Option<String>,
    device_filter: Option<String>,
}

impl Default for VibraEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            output: OutputMode::default(),
            block_frames: 512,
            device_channels: None,
            preferred_device: None,
            device_filter: None,
        }
    }
}

impl VibraEngineBuilder {
    /// Replace the whole engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 6
    pub fn actuators(mut self, count: usize) -> Self {
        self.config.actuator_count = count;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 250 Hz
    pub fn carrier_frequency(mut self, hz: f64) -> Self {
        self.config.carrier_frequency = hz;
        self
    }

    /// Default: 10 000 ms
    pub fn window_size_ms(mut self, ms: f64) -> Self {
        self.config.window_size_ms = ms;
        self
    }

    /// Logical actuator `i` drives physical channel `mapping[i]`.
    pub fn mapping(mut self, mapping: Vec<usize>) -> Self {
        self.config.mapping = Some(mapping);
        self
    }

    /// Default: 256
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Block size for headless output. Default: 512
    pub fn block_frames(mut self, frames: usize) -> Self {
        self.block_frames = frames;
        self
    }

    /// Override the device channel count for headless and manual output.
    pub fn device_channels(mut self, channels: usize) -> Self {
        self.device_channels = Some(channels);
        self
    }

    /// Prefer an output device whose name contains `name`.
    pub fn preferred_device(mut self, name: impl Into<String>) -> Self {
        self.preferred_device = Some(name.into());
        self
    }

    /// Only accept control messages for this device id (or with no id).
    pub fn device_filter(mut self, device: impl Into<String>) -> Self {
        self.device_filter = Some(device.into());
        self
    }

    pub fn build(self) -> Result<VibraEngine> {
        #[allow(unused_mut)]
        let mut config = self.config;
        config.validate()?;
        let required = config.required_channels();

        let (handle, output) = match self.output {
            OutputMode::Headless => {
                let channels = self.device_channels.unwrap_or(required);
                let (handle, renderer) = Engine::initialize(config, channels)?.into_parts();
                let sample_rate = handle.sample_rate();
                let output = HeadlessOutput::start(renderer, sample_rate, self.block_frames)?;
                (handle, Output::Headless(output))
            }

            #[cfg(feature = "audio-io")]
            OutputMode::Device => {
                let selected = vibra_core::select_output_device(
                    required,
                    self.preferred_device.as_deref(),
                    config.sample_rate,
                )?;
                if selected.sample_rate != config.sample_rate {
                    tracing::warn!(
                        requested = config.sample_rate,
                        actual = selected.sample_rate,
                        "running at the device sample rate"
                    );
                    config.sample_rate = selected.sample_rate;
                }
                let (handle, renderer) =
                    Engine::initialize(config, selected.channels)?.into_parts();
                let stats = handle.stats().clone();
                let output = vibra_core::AudioOutput::start(selected, renderer, stats)?;
                (handle, Output::Device(output))
            }

            OutputMode::Manual => {
                let channels = self.device_channels.unwrap_or(required);
                let (handle, renderer) = Engine::initialize(config, channels)?.into_parts();
                (handle, Output::Manual(Some(renderer)))
            }
        };

        #[cfg(not(feature = "audio-io"))]
        if let Some(name) = &self.preferred_device {
            tracing::debug!(device = %name, "preferred device ignored without audio-io");
        }

        let mut ingest = CommandIngest::new(handle.clone());
        if let Some(device) = self.device_filter {
            ingest = ingest.with_device_filter(device);
        }

        Ok(VibraEngine::from_parts(handle, output, ingest))
    }
}
