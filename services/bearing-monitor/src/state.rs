//! Shared state for the applied snapshot and poll bookkeeping

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::snapshot::{TemperatureSnapshot, TemperatureStatus};

/// A change in alarm level between two applied snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous: TemperatureStatus,
    pub current: TemperatureStatus,
    pub timestamp_epoch_ms: u64,
}

/// Shared state written by the poller and read by the display layer
#[derive(Debug)]
pub struct SharedState {
    pub snapshot: TemperatureSnapshot,
    /// Sequence number of the tick whose response produced `snapshot`; 0 before any
    pub applied_sequence: u64,
    pub last_attempt_epoch_ms: u64,
    pub last_success_epoch_ms: Option<u64>,
    pub consecutive_errors: u32,
    pub last_error: Option<String>,
    /// Sequence number of the newest tick counted as a failure
    pub last_failed_sequence: u64,
    pub history: VecDeque<StatusChange>,
    pub history_max_size: usize,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(history_max_size: usize) -> Self {
        Self {
            snapshot: TemperatureSnapshot::default(),
            applied_sequence: 0,
            last_attempt_epoch_ms: 0,
            last_success_epoch_ms: None,
            consecutive_errors: 0,
            last_error: None,
            last_failed_sequence: 0,
            history: VecDeque::with_capacity(history_max_size),
            history_max_size,
            started_at: Instant::now(),
        }
    }

    pub fn record_attempt(&mut self, now_ms: u64) {
        self.last_attempt_epoch_ms = now_ms;
    }

    /// Replace the snapshot with the response of tick `sequence`.
    ///
    /// Returns false, leaving everything untouched, when a newer tick has
    /// already been applied. The error count is only reset when this tick is
    /// newer than the last counted failure.
    pub fn apply_snapshot(
        &mut self,
        sequence: u64,
        snapshot: TemperatureSnapshot,
        now_ms: u64,
    ) -> bool {
        if sequence <= self.applied_sequence {
            return false;
        }

        let previous = self.snapshot.status;
        if previous != snapshot.status {
            self.add_change(StatusChange {
                previous,
                current: snapshot.status,
                timestamp_epoch_ms: now_ms,
            });
        }

        self.snapshot = snapshot;
        self.applied_sequence = sequence;
        self.last_success_epoch_ms = Some(now_ms);
        if sequence > self.last_failed_sequence {
            self.consecutive_errors = 0;
            self.last_error = None;
        }
        true
    }

    /// Record a failed tick, returning the consecutive error count.
    ///
    /// Failures of ticks older than the applied snapshot are ignored.
    pub fn record_failure(&mut self, sequence: u64, error: String) -> u32 {
        if sequence > self.applied_sequence {
            self.consecutive_errors += 1;
            self.last_error = Some(error);
            self.last_failed_sequence = self.last_failed_sequence.max(sequence);
        }
        self.consecutive_errors
    }

    fn add_change(&mut self, change: StatusChange) {
        if self.history_max_size == 0 {
            return;
        }
        if self.history.len() >= self.history_max_size {
            self.history.pop_front();
        }
        self.history.push_back(change);
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(history_max_size)))
}
