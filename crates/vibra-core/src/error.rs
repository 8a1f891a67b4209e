//! Error types for vibra-core.

use thiserror::Error;

/// Error type for vibra-core operations.
///
/// Every variant is a startup-time failure. Nothing in the render path
/// produces an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid actuator count: {0}. Must be between 1 and {max}", max = crate::MAX_ACTUATORS)]
    InvalidActuatorCount(usize),

    #[error("Mapping has {mapped} entries but {actuators} actuators are configured")]
    MappingCardinality { mapped: usize, actuators: usize },

    #[error("Actuator {actuator} maps to channel {channel}, device has {device_channels}")]
    ChannelOutOfRange {
        actuator: usize,
        channel: usize,
        device_channels: usize,
    },

    #[error("Actuators {first} and {second} both map to channel {channel}")]
    DuplicateChannel {
        first: usize,
        second: usize,
        channel: usize,
    },

    #[error("No output device with at least {required} channels")]
    NoSuitableDevice { required: usize },

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[cfg(feature = "audio-io")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "audio-io")]
    #[error("Failed to query supported stream configs")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[cfg(feature = "audio-io")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "audio-io")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "audio-io")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "audio-io")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
