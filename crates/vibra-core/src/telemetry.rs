//! Time-windowed log of received commands.
//!
//! Written by the ingest domain, read on demand by the telemetry query domain.
//! The render domain never touches it, so a plain mutex with short critical
//! sections is enough.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One received command as seen by the telemetry reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: f64,
    pub amplitudes: Vec<f32>,
    #[serde(rename = "duration")]
    pub duration_ms: f64,
    #[serde(rename = "device", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

#[derive(Debug)]
struct WindowState {
    records: VecDeque<TelemetryRecord>,
    latest: Option<f64>,
    /// False once a record arrived with a timestamp below `latest`.
    ordered: bool,
}

/// Records received within the last `window_size` time units.
///
/// Invariant: every stored record satisfies
/// `timestamp > latest_timestamp_seen - window_size`.
#[derive(Debug)]
pub struct TelemetryWindow {
    state: Mutex<WindowState>,
    window_size: f64,
    max_records: usize,
}

impl TelemetryWindow {
    pub fn new(window_size: f64) -> Self {
        Self::with_max_records(window_size, usize::MAX)
    }

    pub fn with_max_records(window_size: f64, max_records: usize) -> Self {
        Self {
            state: Mutex::new(WindowState {
                records: VecDeque::new(),
                latest: None,
                ordered: true,
            }),
            window_size,
            max_records: max_records.max(1),
        }
    }

    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    /// Insert at the tail without pruning.
    pub fn append(&self, record: TelemetryRecord) {
        let mut state = self.state.lock();
        Self::append_locked(&mut state, record, self.max_records);
    }

    /// Drop every record with `timestamp <= reference_time - window_size`
    /// from the head. Returns the number of records removed.
    pub fn prune(&self, reference_time: f64) -> usize {
        let mut state = self.state.lock();
        Self::prune_locked(&mut state, reference_time - self.window_size)
    }

    /// Append and prune in one critical section.
    ///
    /// The pruning reference is the latest timestamp seen so far, so an
    /// out-of-order record cannot pull the window backwards. A record that is
    /// already outside the window is not stored; returns `false` in that case.
    pub fn record(&self, record: TelemetryRecord) -> bool {
        let mut state = self.state.lock();
        let reference = match state.latest {
            Some(latest) => latest.max(record.timestamp),
            None => record.timestamp,
        };
        let cutoff = reference - self.window_size;

        let stored = record.timestamp > cutoff;
        if stored {
            Self::append_locked(&mut state, record, self.max_records);
        }
        Self::prune_locked(&mut state, cutoff);
        stored
    }

    /// Owned copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<TelemetryRecord> {
        let state = self.state.lock();
        state.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    pub fn latest_timestamp(&self) -> Option<f64> {
        self.state.lock().latest
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.latest = None;
        state.ordered = true;
    }

    fn append_locked(state: &mut WindowState, record: TelemetryRecord, max_records: usize) {
        state.latest = Some(match state.latest {
            Some(latest) => {
                if record.timestamp < latest {
                    state.ordered = false;
                }
                latest.max(record.timestamp)
            }
            None => record.timestamp,
        });
        state.records.push_back(record);
        while state.records.len() > max_records {
            state.records.pop_front();
        }
    }

    fn prune_locked(state: &mut WindowState, cutoff: f64) -> usize {
        let before = state.records.len();
        if state.ordered {
            while state
                .records
                .front()
                .is_some_and(|r| r.timestamp <= cutoff)
            {
                state.records.pop_front();
            }
        } else {
            state.records.retain(|r| r.timestamp > cutoff);
            if state.records.is_empty() {
                state.ordered = true;
            }
        }
        before - state.records.len()
    }
}
