//! Wire protocol for control messages.
//!
//! One JSON object per command:
//!
//! ```text
//! {"duration": 120, "amplitudes": [1, 0, 0, 0.5, 0, 0], "timestamp": 1718200000123, "device": "necklace"}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vibra_core::Amplitudes;

/// A control message as it appears on the wire. Every field is optional at
/// this level so that missing fields can be reported by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitudes: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(
        default,
        alias = "device_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub device: Option<String>,
}

/// Why a control message was rejected. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Expected {expected} amplitudes, got {got}")]
    WrongAmplitudeCount { expected: usize, got: usize },

    #[error("Duration must be positive, got {0} ms")]
    NonPositiveDuration(f64),

    #[error("Non-finite value in field: {0}")]
    NonFinite(&'static str),

    #[error("Message for device {got:?}, this engine drives {expected:?}")]
    DeviceMismatch { expected: String, got: String },
}

/// A validated command, ready to become a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub duration_ms: f64,
    pub amplitudes: Amplitudes,
    pub timestamp: f64,
    pub device: Option<String>,
}

impl ControlMessage {
    pub fn new(duration: f64, amplitudes: &[f64], timestamp: f64) -> Self {
        Self {
            duration: Some(duration),
            amplitudes: Some(amplitudes.to_vec()),
            timestamp: Some(timestamp),
            device: None,
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        // A struct of numbers, strings and vectors always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Check every field against an engine with `actuator_count` actuators.
    pub fn validate(self, actuator_count: usize) -> Result<Command, ProtocolError> {
        let duration_ms = self.duration.ok_or(ProtocolError::MissingField("duration"))?;
        let amplitudes = self
            .amplitudes
            .ok_or(ProtocolError::MissingField("amplitudes"))?;
        let timestamp = self
            .timestamp
            .ok_or(ProtocolError::MissingField("timestamp"))?;

        if amplitudes.len() != actuator_count {
            return Err(ProtocolError::WrongAmplitudeCount {
                expected: actuator_count,
                got: amplitudes.len(),
            });
        }
        if !duration_ms.is_finite() {
            return Err(ProtocolError::NonFinite("duration"));
        }
        if duration_ms <= 0.0 {
            return Err(ProtocolError::NonPositiveDuration(duration_ms));
        }
        if !timestamp.is_finite() {
            return Err(ProtocolError::NonFinite("timestamp"));
        }

        let amplitudes: Amplitudes = amplitudes.iter().map(|&a| a as f32).collect();
        if amplitudes.iter().any(|a| !a.is_finite()) {
            return Err(ProtocolError::NonFinite("amplitudes"));
        }

        Ok(Command {
            duration_ms,
            amplitudes,
            timestamp,
            device: self.device,
        })
    }
}

/// Parse and validate in one step.
pub fn decode(raw: &str, actuator_count: usize) -> Result<Command, ProtocolError> {
    ControlMessage::parse(raw)?.validate(actuator_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid() {
        let cmd = decode(
            r#"{"duration": 10, "amplitudes": [1, 0, 0, 0, 0, 0], "timestamp": 1000}"#,
            6,
        )
        .unwrap();
        assert_eq!(cmd.duration_ms, 10.0);
        assert_eq!(cmd.amplitudes.as_slice(), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(cmd.timestamp, 1000.0);
        assert_eq!(cmd.device, None);
    }

    #[test]
    fn test_device_field_and_alias() {
        let cmd = decode(
            r#"{"duration": 5, "amplitudes": [0.5], "timestamp": 1, "device": "necklace"}"#,
            1,
        )
        .unwrap();
        assert_eq!(cmd.device.as_deref(), Some("necklace"));

        let cmd = decode(
            r#"{"duration": 5, "amplitudes": [0.5], "timestamp": 1, "device_id": "bracelet"}"#,
            1,
        )
        .unwrap();
        assert_eq!(cmd.device.as_deref(), Some("bracelet"));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            decode(r#"{"amplitudes": [1, 2, 3]}"#, 6),
            Err(ProtocolError::MissingField("duration"))
        );
        assert_eq!(
            decode(r#"{"duration": 1, "timestamp": 0}"#, 6),
            Err(ProtocolError::MissingField("amplitudes"))
        );
        assert_eq!(
            decode(r#"{"duration": 1, "amplitudes": [1]}"#, 1),
            Err(ProtocolError::MissingField("timestamp"))
        );
    }

    #[test]
    fn test_wrong_amplitude_count() {
        assert_eq!(
            decode(r#"{"duration": 1, "amplitudes": [1, 2, 3], "timestamp": 0}"#, 6),
            Err(ProtocolError::WrongAmplitudeCount {
                expected: 6,
                got: 3
            })
        );
    }

    #[test]
    fn test_non_positive_duration() {
        assert_eq!(
            decode(r#"{"duration": 0, "amplitudes": [1], "timestamp": 0}"#, 1),
            Err(ProtocolError::NonPositiveDuration(0.0))
        );
        assert!(matches!(
            decode(r#"{"duration": -3, "amplitudes": [1], "timestamp": 0}"#, 1),
            Err(ProtocolError::NonPositiveDuration(_))
        ));
    }

    #[test]
    fn test_malformed_payloads() {
        for raw in [
            "",
            "not json",
            "[1, 2, 3]",
            r#"{"duration": "ten", "amplitudes": [1], "timestamp": 0}"#,
            r#"{"duration": 1, "amplitudes": ["a"], "timestamp": 0}"#,
        ] {
            assert!(
                matches!(decode(raw, 1), Err(ProtocolError::Malformed(_))),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_amplitude_overflowing_f32_is_rejected() {
        assert_eq!(
            decode(r#"{"duration": 1, "amplitudes": [1e300], "timestamp": 0}"#, 1),
            Err(ProtocolError::NonFinite("amplitudes"))
        );
    }

    #[test]
    fn test_to_json_omits_missing_fields() {
        let json = ControlMessage::new(10.0, &[1.0, 0.0], 5.0).to_json();
        assert_eq!(json, r#"{"duration":10.0,"amplitudes":[1.0,0.0],"timestamp":5.0}"#);

        let json = ControlMessage::new(1.0, &[0.5], 2.0)
            .with_device("overear")
            .to_json();
        assert!(json.ends_with(r#""device":"overear"}"#));
    }
}
