//! Session state machine.
//!
//! The engine counts down in whole seconds and has no thread of its own:
//! the caller invokes `tick()` once per second, and commands and ticks must
//! come from one sequential context (see [`TimerService`](crate::TimerService)).
//!
//! ## Transitions
//!
//! ```text
//! Idle --start--> Work --(zero | skip)--> ShortBreak | LongBreak --(zero | skip)--> Work
//!   ^                                                                                 |
//!   +------------------------------------ reset --------------------------------------+
//! ```
//!
//! Every n-th work session (n = `long_break_interval`) is followed by a long
//! break. `cycle_count` counts finished work sessions, whether they ran out
//! or were skipped.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default());
//! engine.events_mut().on_session_completed(|entry| println!("{entry:?}"));
//! engine.start();
//! // Once per second:
//! engine.tick();
//! ```

use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::config::TimerConfig;
use super::session::SessionLogEntry;
use super::state::{SessionState, Snapshot};
use super::Mode;
use crate::events::EventBus;
use crate::recovery::{self, PersistedRuntimeState, RecoveryOptions};
use crate::storage::StateStore;

/// Core session state machine.
///
/// Commands never fail. Each returns `true` when it changed the state and
/// `false` when its preconditions did not hold.
pub struct TimerEngine {
    config: TimerConfig,
    state: SessionState,
    events: EventBus,
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    /// Create an idle engine on the system clock.
    pub fn new(config: TimerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: TimerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            state: SessionState::default(),
            events: EventBus::new(),
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn cycle_count(&self) -> u32 {
        self.state.cycle_count
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn is_counting(&self) -> bool {
        self.state.is_counting()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> bool {
        if self.state.is_running {
            return false;
        }
        if self.state.mode == Mode::Idle {
            self.switch_to(Mode::Work, false);
        }
        self.state.is_running = true;
        self.state.is_paused = false;
        tracing::debug!("started {}", self.state.mode);
        self.emit_state();
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.state.is_running || self.state.is_paused || self.state.mode == Mode::Idle {
            return false;
        }
        self.state.is_paused = true;
        self.state.previous_mode = self.state.mode;
        tracing::debug!("paused {} at {}s", self.state.mode, self.state.remaining_secs);
        self.emit_state();
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.state.is_running || !self.state.is_paused {
            return false;
        }
        self.state.is_paused = false;
        tracing::debug!("resumed {} at {}s", self.state.mode, self.state.remaining_secs);
        self.emit_state();
        true
    }

    /// Abandon the current session and move to the next one.
    pub fn skip(&mut self) -> bool {
        if self.state.mode == Mode::Idle && !self.state.is_running {
            return false;
        }
        tracing::debug!("skipping {} with {}s left", self.state.mode, self.state.remaining_secs);
        self.finish_session(false);
        self.advance();
        self.emit_state();
        true
    }

    /// Return to `Idle`, discarding the session in progress. Keeps `cycle_count`.
    pub fn reset(&mut self) -> bool {
        self.state = SessionState::idle(self.state.cycle_count);
        tracing::debug!("reset to idle");
        self.emit_state();
        true
    }

    /// Replace the configuration. The current countdown keeps its length;
    /// new durations apply from the next mode switch.
    pub fn update_config(&mut self, config: TimerConfig) {
        self.config = config;
    }

    /// Advance the countdown by one second. No-op unless counting.
    pub fn tick(&mut self) {
        if !self.state.is_counting() {
            return;
        }

        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);

        let alert_at = self.config.pre_alert_secs();
        if !self.state.pre_alert_raised
            && alert_at > 0
            && self.state.mode.is_break()
            && self.state.remaining_secs <= alert_at
        {
            self.state.pre_alert_raised = true;
            tracing::debug!("pre-break alert at {}s", self.state.remaining_secs);
            self.events.emit_pre_break_alert();
        }

        let snapshot = self.state.snapshot();
        tracing::trace!("tick {} {}", snapshot.mode, snapshot.remaining_clock());
        self.events.emit_tick(&snapshot);

        if self.state.remaining_secs == 0 {
            self.finish_session(true);
            self.advance();
            self.emit_state();
        }
    }

    // ── Recovery ─────────────────────────────────────────────────────

    pub fn to_persisted(&self) -> PersistedRuntimeState {
        recovery::to_persisted(&self.state, self.clock.now())
    }

    /// Replace the state with a persisted record and announce it once.
    pub fn restore(&mut self, record: &PersistedRuntimeState, options: RecoveryOptions) {
        self.state = recovery::from_persisted(record, &self.config, self.clock.now(), options);
        tracing::info!(
            "restored {} ({}s of {}s, running: {}, paused: {}, cycles: {})",
            self.state.mode,
            self.state.remaining_secs,
            self.state.duration_secs,
            self.state.is_running,
            self.state.is_paused,
            self.state.cycle_count
        );
        self.emit_state();
    }

    /// Load once from `store` and restore if a record exists.
    pub fn recover(&mut self, store: &dyn StateStore, options: RecoveryOptions) -> bool {
        match store.load() {
            Some(record) => {
                self.restore(&record, options);
                true
            }
            None => {
                tracing::debug!("no runtime state to recover");
                false
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish_session(&mut self, completed: bool) {
        let Some(start_at) = self.state.session_start_at else {
            return;
        };
        if self.state.duration_secs == 0 {
            return;
        }
        let entry = SessionLogEntry::new(self.state.mode, start_at, self.clock.now(), completed);
        tracing::debug!("{} session finished (completed: {completed})", entry.mode);
        self.events.emit_session_completed(&entry);
    }

    fn advance(&mut self) {
        let from = self.state.mode;
        let next = match from {
            Mode::Work => {
                if self.state.cycle_count.saturating_add(1) % self.config.long_break_every() == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Work,
            Mode::Idle => return,
        };
        self.switch_to(next, true);
        self.state.is_paused = false;
        if !self.config.auto_start_after(from) {
            self.state.is_running = false;
        }
    }

    fn switch_to(&mut self, next: Mode, count_cycle: bool) {
        if count_cycle && self.state.mode == Mode::Work {
            // Restored counts can sit at the ceiling.
            self.state.cycle_count = self.state.cycle_count.saturating_add(1);
        }
        self.state.mode = next;
        self.state.previous_mode = next;
        self.state.duration_secs = self.config.duration_secs(next);
        self.state.remaining_secs = self.state.duration_secs;
        self.state.session_start_at = Some(self.clock.now());
        self.state.pre_alert_raised = false;
        tracing::debug!("switched to {} (cycle {})", next, self.state.cycle_count);
        self.events.emit_session_switched(next);
    }

    fn emit_state(&mut self) {
        let snapshot = self.state.snapshot();
        self.events.emit_state_changed(&snapshot);
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
