//! Persistent carrier phase.

use core::f64::consts::TAU;

/// Phase accumulator for the sine carrier.
///
/// `sample(k) = sin(phase + k * increment)`. The phase only moves when
/// [`advance`](Self::advance) is called, so it stays frozen across silence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseAccumulator {
    phase: f64,
    increment: f64,
}

impl PhaseAccumulator {
    pub fn new(carrier_frequency: f64, sample_rate: f64) -> Self {
        Self {
            phase: 0.0,
            increment: TAU * carrier_frequency / sample_rate,
        }
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    #[inline]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Carrier value `k` samples past the current phase.
    #[inline]
    pub fn sample(&self, k: u64) -> f32 {
        (self.phase + k as f64 * self.increment).sin() as f32
    }

    /// Advance by `samples` and wrap into `[0, 2π)`.
    #[inline]
    pub fn advance(&mut self, samples: u64) {
        self.phase = (self.phase + samples as f64 * self.increment).rem_euclid(TAU);
    }
}
