use serde::{Deserialize, Serialize};

use super::Mode;

/// Durations and policies for the work/break cycle.
///
/// Values are kept exactly as loaded, including zero or negative numbers.
/// The accessors clamp them at the point of use, so a bad settings file
/// degrades to safe bounds instead of failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: i64,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: i64,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: i64,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: i64,
    #[serde(default = "default_true")]
    pub auto_start_break: bool,
    #[serde(default)]
    pub auto_start_work: bool,
    #[serde(default = "default_pre_break_alert_seconds")]
    pub pre_break_alert_seconds: i64,
}

fn default_work_minutes() -> i64 {
    25
}
fn default_short_break_minutes() -> i64 {
    5
}
fn default_long_break_minutes() -> i64 {
    15
}
fn default_long_break_interval() -> i64 {
    4
}
fn default_pre_break_alert_seconds() -> i64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_interval: default_long_break_interval(),
            auto_start_break: true,
            auto_start_work: false,
            pre_break_alert_seconds: default_pre_break_alert_seconds(),
        }
    }
}

impl TimerConfig {
    /// Countdown length for `mode` in seconds. Timed modes last at least a minute.
    pub fn duration_secs(&self, mode: Mode) -> u64 {
        let minutes = match mode {
            Mode::Idle => return 0,
            Mode::Work => self.work_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        };
        (minutes.max(1) as u64).saturating_mul(60)
    }

    /// Every n-th work session is followed by a long break; never below 1.
    pub fn long_break_every(&self) -> u32 {
        self.long_break_interval.clamp(1, u32::MAX as i64) as u32
    }

    pub fn pre_alert_secs(&self) -> u64 {
        self.pre_break_alert_seconds.max(0) as u64
    }

    /// Whether the countdown keeps running after leaving `from`.
    pub fn auto_start_after(&self, from: Mode) -> bool {
        match from {
            Mode::Work => self.auto_start_break,
            Mode::ShortBreak | Mode::LongBreak => self.auto_start_work,
            Mode::Idle => false,
        }
    }
}
