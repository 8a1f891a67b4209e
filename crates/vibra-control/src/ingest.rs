//! Command ingest: validate, enqueue, record.

use crate::protocol::{decode, Command, ControlMessage, ProtocolError};
use thiserror::Error;
use vibra_core::{EngineHandle, Segment, TelemetryRecord};

/// Outcome of an accepted command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Receipt {
    /// Segment length after `round(duration_ms * sample_rate / 1000)`.
    pub samples: u64,
    pub timestamp: f64,
}

/// Why a command did not reach the segment queue.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Valid command dropped because the queue was full (drop-newest).
    #[error("Segment queue full ({capacity} segments), command dropped")]
    Overflow { capacity: usize },
}

impl IngestError {
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}

/// Turns raw control messages into queued segments and telemetry records.
///
/// Cheap to clone; each control connection gets its own copy.
#[derive(Clone)]
pub struct CommandIngest {
    handle: EngineHandle,
    device_filter: Option<String>,
}

impl CommandIngest {
    pub fn new(handle: EngineHandle) -> Self {
        Self {
            handle,
            device_filter: None,
        }
    }

    /// Reject messages that name a device other than `device`. Messages
    /// without a device field are always accepted.
    pub fn with_device_filter(mut self, device: impl Into<String>) -> Self {
        self.device_filter = Some(device.into());
        self
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    pub fn device_filter(&self) -> Option<&str> {
        self.device_filter.as_deref()
    }

    /// Process one raw message.
    pub fn receive(&self, raw: &str) -> Result<Receipt, IngestError> {
        let decoded = decode(raw, self.handle.actuator_count());
        self.process(decoded)
    }

    /// Process an already-parsed message.
    pub fn receive_message(&self, message: ControlMessage) -> Result<Receipt, IngestError> {
        let validated = message.validate(self.handle.actuator_count());
        self.process(validated)
    }

    fn process(&self, decoded: Result<Command, ProtocolError>) -> Result<Receipt, IngestError> {
        let command = match decoded.and_then(|c| self.check_device(c)) {
            Ok(command) => command,
            Err(err) => {
                self.handle.stats().rejected.incr();
                tracing::warn!("rejected control message: {err}");
                return Err(err.into());
            }
        };

        let samples = self.handle.config().duration_to_samples(command.duration_ms);
        let queued = self
            .handle
            .enqueue(Segment {
                remaining_samples: samples,
                amplitudes: command.amplitudes.clone(),
            })
            .is_ok();

        // Overflowed commands were still received and stay visible to telemetry.
        self.handle.telemetry().record(TelemetryRecord {
            timestamp: command.timestamp,
            amplitudes: command.amplitudes.to_vec(),
            duration_ms: command.duration_ms,
            device_id: command.device,
        });

        if !queued {
            let capacity = self.handle.queue_capacity();
            tracing::warn!(
                timestamp = command.timestamp,
                capacity,
                "segment queue full, dropping command"
            );
            return Err(IngestError::Overflow { capacity });
        }

        self.handle.stats().accepted.incr();
        tracing::debug!(
            timestamp = command.timestamp,
            duration_ms = command.duration_ms,
            samples,
            "queued segment"
        );

        Ok(Receipt {
            samples,
            timestamp: command.timestamp,
        })
    }

    fn check_device(&self, command: Command) -> Result<Command, ProtocolError> {
        match (&self.device_filter, &command.device) {
            (Some(expected), Some(got)) if expected != got => Err(ProtocolError::DeviceMismatch {
                expected: expected.clone(),
                got: got.clone(),
            }),
            _ => Ok(command),
        }
    }
}
