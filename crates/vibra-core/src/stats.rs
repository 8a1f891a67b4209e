//! Lock-free engine counters, shared by the ingest, render and device domains.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache-line aligned monotonic counter.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new(value: u64) -> Self {
        Self {
            value: AtomicU64::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn incr(&self) {
        self.add(1);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::AcqRel);
    }
}

/// Counters for every non-fatal condition the engine absorbs.
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Commands turned into queued segments.
    pub accepted: AtomicCounter,
    /// Commands dropped by validation.
    pub rejected: AtomicCounter,
    /// Valid commands dropped because the queue was full.
    pub overflowed: AtomicCounter,
    pub segments_completed: AtomicCounter,
    pub frames_rendered: AtomicCounter,
    /// Frames rendered with no segment available.
    pub silent_frames: AtomicCounter,
    /// Under/overruns and stream errors reported by the device layer.
    pub device_errors: AtomicCounter,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.get(),
            rejected: self.rejected.get(),
            overflowed: self.overflowed.get(),
            segments_completed: self.segments_completed.get(),
            frames_rendered: self.frames_rendered.get(),
            silent_frames: self.silent_frames.get(),
            device_errors: self.device_errors.get(),
        }
    }
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub overflowed: u64,
    pub segments_completed: u64,
    pub frames_rendered: u64,
    pub silent_frames: u64,
    pub device_errors: u64,
}
