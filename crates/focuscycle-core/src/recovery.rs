//! Crash-recovery codec.
//!
//! Converts [`SessionState`] to and from [`PersistedRuntimeState`], the flat
//! record a store writes every few seconds and reads once at startup.
//!
//! Restoring trusts the persisted `remaining_seconds`: the countdown resumes
//! where it was saved and only the session anchor is recomputed. Process
//! downtime is charged against the session only when
//! [`RecoveryOptions::catch_up`] is on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, SessionState, TimerConfig};

/// Current on-disk layout of [`PersistedRuntimeState`].
pub const SCHEMA_VERSION: u32 = 1;

/// Longest countdown a record may carry. Anything above is corrupt.
pub const MAX_SESSION_SECS: u64 = u32::MAX as u64;

fn legacy_schema_version() -> u32 {
    1
}

fn default_previous_mode() -> Mode {
    Mode::Work
}

/// At-rest form of the session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRuntimeState {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    pub mode: Mode,
    #[serde(default = "default_previous_mode")]
    pub previous_mode: Mode,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub cycle_count: u32,
    #[serde(default)]
    pub remaining_seconds: u64,
    #[serde(default)]
    pub duration_seconds: u64,
    pub saved_at: DateTime<Utc>,
}

impl PersistedRuntimeState {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Decode a stored record. Anything unreadable is "no prior state".
    pub fn from_json(json: &str) -> Option<Self> {
        let record: Self = match serde_json::from_str(json) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("discarding unreadable runtime state: {e}");
                return None;
            }
        };
        if record.schema_version > SCHEMA_VERSION {
            tracing::warn!(
                "discarding runtime state with schema version {} (supported: {})",
                record.schema_version,
                SCHEMA_VERSION
            );
            return None;
        }
        if record.duration_seconds > MAX_SESSION_SECS || record.remaining_seconds > MAX_SESSION_SECS {
            tracing::warn!(
                "discarding runtime state with out-of-range countdown ({}s of {}s)",
                record.remaining_seconds,
                record.duration_seconds
            );
            return None;
        }
        Some(record)
    }
}

/// Knobs for [`from_persisted`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryOptions {
    /// Subtract the time since `saved_at` from a running session, so a
    /// session that ran out while the process was down completes on the
    /// first tick after recovery.
    #[serde(default)]
    pub catch_up: bool,
}

pub fn to_persisted(state: &SessionState, saved_at: DateTime<Utc>) -> PersistedRuntimeState {
    PersistedRuntimeState {
        schema_version: SCHEMA_VERSION,
        mode: state.mode,
        previous_mode: state.previous_mode,
        is_running: state.is_running,
        is_paused: state.is_paused,
        cycle_count: state.cycle_count,
        remaining_seconds: state.remaining_secs,
        duration_seconds: state.duration_secs,
        saved_at,
    }
}

/// Rebuild session state from a record and normalize it.
///
/// `config` is consulted only when a timed record has lost its duration.
pub fn from_persisted(
    record: &PersistedRuntimeState,
    config: &TimerConfig,
    now: DateTime<Utc>,
    options: RecoveryOptions,
) -> SessionState {
    if record.mode == Mode::Idle {
        if record.is_running || record.is_paused || record.duration_seconds > 0 {
            tracing::warn!("idle runtime state carried an active countdown; resetting to idle");
        }
        let mut state = SessionState::idle(record.cycle_count);
        if record.previous_mode.is_timed() {
            state.previous_mode = record.previous_mode;
        }
        return state;
    }

    let mut state = SessionState {
        mode: record.mode,
        previous_mode: if record.previous_mode.is_timed() {
            record.previous_mode
        } else {
            record.mode
        },
        is_running: record.is_running,
        is_paused: record.is_paused,
        cycle_count: record.cycle_count,
        remaining_secs: record.remaining_seconds,
        duration_secs: record.duration_seconds,
        session_start_at: None,
        pre_alert_raised: false,
    };

    if !state.is_running && state.is_paused {
        tracing::warn!("runtime state was paused but not running; clearing pause");
        state.is_paused = false;
    }

    if state.duration_secs == 0 || state.duration_secs > MAX_SESSION_SECS {
        tracing::warn!(
            "runtime state for {} had an unusable duration ({}s); using configured length",
            state.mode,
            state.duration_secs
        );
        state.duration_secs = config.duration_secs(state.mode);
        state.remaining_secs = state.duration_secs;
    }

    if state.remaining_secs > state.duration_secs {
        tracing::warn!(
            "runtime state remaining {}s exceeded duration {}s; clamping",
            state.remaining_secs,
            state.duration_secs
        );
        state.remaining_secs = state.duration_secs;
    }

    if options.catch_up && state.is_counting() {
        let downtime = (now - record.saved_at).num_seconds().max(0) as u64;
        if downtime > 0 {
            tracing::debug!("charging {downtime}s of downtime against {}", state.mode);
            state.remaining_secs = state.remaining_secs.saturating_sub(downtime);
        }
    }

    let elapsed = state.duration_secs - state.remaining_secs;
    let anchor = i64::try_from(elapsed)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ago| now.checked_sub_signed(ago));
    if anchor.is_none() {
        tracing::warn!("session start {elapsed}s before {now} is out of range; anchoring at now");
    }
    state.session_start_at = Some(anchor.unwrap_or(now));
    state
}
