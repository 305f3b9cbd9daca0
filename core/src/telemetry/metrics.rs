use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counters accumulated since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frames: u64,
    pub no_target_frames: u64,
    pub faults: u64,
    pub reconnects: u64,
    pub chirp_clamps: u64,
    pub index_faults: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    // Counters are plain integers, so a poisoned lock still holds valid values.
    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        apply(&mut self.lock());
    }

    pub fn record_frame(&self, has_target: bool) {
        self.update(|m| {
            m.frames += 1;
            if !has_target {
                m.no_target_frames += 1;
            }
        });
    }

    pub fn record_fault(&self) {
        self.update(|m| m.faults += 1);
    }

    pub fn record_reconnect(&self) {
        self.update(|m| m.reconnects += 1);
    }

    pub fn record_clamp(&self) {
        self.update(|m| m.chirp_clamps += 1);
    }

    pub fn record_index_faults(&self, count: u64) {
        if count > 0 {
            self.update(|m| m.index_faults += count);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        *self.lock()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
