//! Test helpers and fixtures for vibra integration tests
//!
//! Engines are built with [`OutputMode::Manual`] so the test owns the
//! renderer and drives every block itself (no clock thread, no hardware).
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations
//! - `DSP_EPSILON` (1e-4): Carrier samples after long runs
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection

#![allow(dead_code)]

pub mod tolerances;

use vibra::prelude::*;
use vibra::Renderer;

/// Sample rate of the end-to-end protocol example.
pub const TEST_SAMPLE_RATE: f64 = 2000.0;

/// Carrier of the end-to-end protocol example.
pub const TEST_CARRIER: f64 = 200.0;

/// Build an engine the test drives by hand.
pub fn manual_engine(actuators: usize, sample_rate: f64, carrier: f64) -> (VibraEngine, Renderer) {
    manual_engine_with(
        VibraEngine::builder()
            .actuators(actuators)
            .sample_rate(sample_rate)
            .carrier_frequency(carrier),
    )
}

/// Build an engine from a prepared builder, forcing manual output.
pub fn manual_engine_with(builder: VibraEngineBuilder) -> (VibraEngine, Renderer) {
    let mut engine = builder
        .output(OutputMode::Manual)
        .build()
        .expect("Failed to create test engine");
    let renderer = engine.take_renderer().expect("Renderer already taken");
    (engine, renderer)
}

/// A control message as the wire carries it.
pub fn message(duration_ms: f64, amplitudes: &[f64], timestamp: f64) -> String {
    ControlMessage::new(duration_ms, amplitudes, timestamp).to_json()
}

/// Expected carrier value `sin(phase_start + n * increment)`.
pub fn carrier(phase_start: f64, increment: f64, n: usize) -> f32 {
    (phase_start + n as f64 * increment).sin() as f32
}

/// Extract one channel column from an interleaved buffer.
pub fn column(interleaved: &[f32], channels: usize, channel: usize) -> Vec<f32> {
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame[channel])
        .collect()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert signal is silent within threshold.
pub fn assert_is_silent(samples: &[f32], threshold: f32, context: &str) {
    let max_val = peak(samples);
    assert!(
        max_val <= threshold,
        "{}: Expected silence (threshold {}), but peak was {}",
        context,
        threshold,
        max_val
    );
}

/// Assert two signals are equal within tolerance, with detailed error message.
pub fn assert_signals_equal(a: &[f32], b: &[f32], epsilon: f32, context: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", context);
    let first_diff = a
        .iter()
        .zip(b.iter())
        .position(|(x, y)| (x - y).abs() > epsilon);
    if let Some(i) = first_diff {
        panic!(
            "{}: Signals differ - first diff at sample {}: {} vs {}",
            context, i, a[i], b[i]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_extraction() {
        let interleaved = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
        assert_eq!(column(&interleaved, 3, 1), vec![1.0, 11.0]);
    }

    #[test]
    fn test_peak() {
        assert_eq!(peak(&[0.1, -0.7, 0.3]), 0.7);
        assert_eq!(peak(&[]), 0.0);
    }
}
