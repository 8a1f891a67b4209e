//! Tolerance constants for synthesis tests.

/// Floating point rounding errors (exact gain, single `sin` evaluation).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Carrier samples after many phase wraps (f64 accumulator, f32 output).
pub const DSP_EPSILON: f32 = 1e-4;

/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;
