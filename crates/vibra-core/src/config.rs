//! Engine configuration.

use crate::{Error, Result, MAX_ACTUATORS};
use serde::{Deserialize, Serialize};

/// Configuration for the synthesis engine.
///
/// `mapping` is the logical-actuator to physical-channel table. `None` means
/// identity (actuator `i` drives channel `i`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub actuator_count: usize,
    pub sample_rate: f64,
    pub carrier_frequency: f64,
    pub window_size_ms: f64,
    pub mapping: Option<Vec<usize>>,
    pub queue_capacity: usize,
    /// Frames pre-allocated for [`Renderer::render`](crate::Renderer::render).
    pub max_block_frames: usize,
    /// Hard cap on telemetry records, independent of the time window.
    pub max_telemetry_records: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            actuator_count: 6,
            sample_rate: 44100.0,
            carrier_frequency: 250.0,
            window_size_ms: 10_000.0,
            mapping: None,
            queue_capacity: 256,
            max_block_frames: 8192,
            max_telemetry_records: 100_000,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.actuator_count == 0 || self.actuator_count > MAX_ACTUATORS {
            return Err(Error::InvalidActuatorCount(self.actuator_count));
        }
        if !self.sample_rate.is_finite() || self.sample_rate < 1000.0 || self.sample_rate > 384000.0
        {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (1000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !self.carrier_frequency.is_finite()
            || self.carrier_frequency <= 0.0
            || self.carrier_frequency >= self.sample_rate / 2.0
        {
            return Err(Error::InvalidConfig(format!(
                "carrier_frequency {} must be in (0, {}) Hz",
                self.carrier_frequency,
                self.sample_rate / 2.0
            )));
        }
        if !self.window_size_ms.is_finite() || self.window_size_ms <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "window_size_ms {} must be positive",
                self.window_size_ms
            )));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue_capacity must be at least 1".into()));
        }
        if self.max_block_frames == 0 {
            return Err(Error::InvalidConfig(
                "max_block_frames must be at least 1".into(),
            ));
        }
        if self.max_telemetry_records == 0 {
            return Err(Error::InvalidConfig(
                "max_telemetry_records must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The effective mapping table, expanding `None` to identity.
    pub fn mapping_table(&self) -> Vec<usize> {
        match &self.mapping {
            Some(table) => table.clone(),
            None => (0..self.actuator_count).collect(),
        }
    }

    /// Physical channels the device must expose for this mapping.
    pub fn required_channels(&self) -> usize {
        self.mapping_table()
            .iter()
            .max()
            .map_or(self.actuator_count, |&max| max + 1)
    }

    /// `round(duration_ms * sample_rate / 1000)`.
    pub fn duration_to_samples(&self, duration_ms: f64) -> u64 {
        (duration_ms * self.sample_rate / 1000.0).round() as u64
    }
}
