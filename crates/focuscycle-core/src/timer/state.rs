use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Mode;

/// Mutable session state, owned by [`TimerEngine`](super::TimerEngine).
///
/// Invariants held after every engine operation:
/// - `is_paused` implies `is_running`
/// - `remaining_secs <= duration_secs`
/// - in `Idle`, both countdown values are zero and nothing is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub mode: Mode,
    /// Last timed mode entered or paused in.
    pub previous_mode: Mode,
    pub is_running: bool,
    pub is_paused: bool,
    pub cycle_count: u32,
    pub remaining_secs: u64,
    pub duration_secs: u64,
    pub session_start_at: Option<DateTime<Utc>>,
    pub pre_alert_raised: bool,
}

impl SessionState {
    /// The `Idle` baseline. `cycle_count` is carried over.
    pub fn idle(cycle_count: u32) -> Self {
        Self {
            mode: Mode::Idle,
            previous_mode: Mode::Work,
            is_running: false,
            is_paused: false,
            cycle_count,
            remaining_secs: 0,
            duration_secs: 0,
            session_start_at: None,
            pre_alert_raised: false,
        }
    }

    /// Running, unpaused and in a timed mode.
    pub fn is_counting(&self) -> bool {
        self.is_running && !self.is_paused && self.mode.is_timed()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            is_running: self.is_running,
            is_paused: self.is_paused,
            cycle_count: self.cycle_count,
            remaining_secs: self.remaining_secs,
            duration_secs: self.duration_secs,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle(0)
    }
}

/// Read-only view of the session for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub is_running: bool,
    pub is_paused: bool,
    pub cycle_count: u32,
    pub remaining_secs: u64,
    pub duration_secs: u64,
}

impl Snapshot {
    /// 0.0 .. 1.0 fraction of the current session already elapsed.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / self.duration_secs as f64)
    }

    /// `mm:ss` rendering of the remaining time.
    pub fn remaining_clock(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}
