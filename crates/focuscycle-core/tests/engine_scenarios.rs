//! Scenario tests for the session state machine.
//!
//! These drive the engine through full work/break cycles and check the
//! emitted events along the way.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use focuscycle_core::recovery::{from_persisted, to_persisted};
use focuscycle_core::timer::{Clock, ManualClock};
use focuscycle_core::{Event, Mode, RecoveryOptions, SessionLogEntry, TimerConfig, TimerEngine};
use proptest::prelude::*;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap())
}

fn engine_with(config: TimerConfig) -> (TimerEngine, std::sync::mpsc::Receiver<Event>) {
    let mut engine = TimerEngine::with_clock(config, Arc::new(clock()));
    let (tx, rx) = std::sync::mpsc::channel();
    engine.events_mut().forward(tx);
    (engine, rx)
}

fn completions(rx: &std::sync::mpsc::Receiver<Event>) -> Vec<SessionLogEntry> {
    rx.try_iter()
        .filter_map(|e| match e {
            Event::SessionCompleted { entry } => Some(entry),
            _ => None,
        })
        .collect()
}

fn tick_n(engine: &mut TimerEngine, n: u64) {
    for _ in 0..n {
        engine.tick();
    }
}

#[test]
fn fourth_work_session_leads_to_long_break() {
    let config = TimerConfig {
        work_minutes: 25,
        short_break_minutes: 5,
        long_break_minutes: 15,
        long_break_interval: 4,
        auto_start_break: true,
        ..TimerConfig::default()
    };
    let (mut engine, _rx) = engine_with(config);

    let mut breaks = Vec::new();
    for _ in 0..4 {
        engine.start();
        assert_eq!(engine.mode(), Mode::Work);
        engine.skip();
        breaks.push(engine.mode());
        engine.skip();
    }
    assert_eq!(
        breaks,
        vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
    );
    assert_eq!(engine.cycle_count(), 4);
}

#[test]
fn long_break_every_fourth_over_three_rounds() {
    let (mut engine, _rx) = engine_with(TimerConfig::default());
    engine.start();
    for n in 1..=12u32 {
        assert_eq!(engine.mode(), Mode::Work);
        engine.skip();
        let expected = if n % 4 == 0 { Mode::LongBreak } else { Mode::ShortBreak };
        assert_eq!(engine.mode(), expected, "after work session {n}");
        assert_eq!(engine.cycle_count(), n);
        engine.skip();
        assert_eq!(engine.cycle_count(), n, "break must not count a cycle");
    }
}

#[test]
fn natural_fourth_completion_yields_long_break() {
    let config = TimerConfig {
        work_minutes: 1,
        short_break_minutes: 1,
        long_break_minutes: 2,
        auto_start_break: true,
        auto_start_work: true,
        ..TimerConfig::default()
    };
    let (mut engine, rx) = engine_with(config);
    engine.start();
    // Three full work+short-break rounds, then the fourth work session.
    tick_n(&mut engine, 3 * 120 + 60);
    assert_eq!(engine.mode(), Mode::LongBreak);
    assert_eq!(engine.state().duration_secs, 120);

    let done = completions(&rx);
    assert_eq!(done.len(), 7);
    assert!(done.iter().all(|e| e.completed));
}

#[test]
fn completed_and_skipped_entries_are_flagged() {
    let config = TimerConfig {
        work_minutes: 1,
        ..TimerConfig::default()
    };
    let (mut engine, rx) = engine_with(config);

    engine.start();
    tick_n(&mut engine, 60);
    engine.skip();

    let done = completions(&rx);
    assert_eq!(done.len(), 2);
    assert_eq!(done[0].mode, Mode::Work);
    assert!(done[0].completed);
    assert_eq!(done[1].mode, Mode::ShortBreak);
    assert!(!done[1].completed);
}

#[test]
fn auto_start_disabled_positions_without_running() {
    let config = TimerConfig {
        auto_start_break: false,
        ..TimerConfig::default()
    };
    let (mut engine, _rx) = engine_with(config);
    engine.start();
    engine.skip();
    assert_eq!(engine.mode(), Mode::ShortBreak);
    assert!(!engine.state().is_running);
    assert_eq!(engine.state().remaining_secs, 5 * 60);

    tick_n(&mut engine, 5);
    assert_eq!(engine.state().remaining_secs, 5 * 60);

    assert!(engine.start());
    assert_eq!(engine.mode(), Mode::ShortBreak);
}

#[test]
fn pause_freezes_remaining_until_next_tick() {
    let (mut engine, _rx) = engine_with(TimerConfig::default());
    engine.start();
    tick_n(&mut engine, 110);
    assert_eq!(engine.snapshot().remaining_clock(), "23:10");

    engine.pause();
    tick_n(&mut engine, 30);
    engine.resume();
    assert_eq!(engine.snapshot().remaining_secs, 23 * 60 + 10);

    engine.tick();
    assert_eq!(engine.snapshot().remaining_secs, 23 * 60 + 9);
}

#[test]
fn pre_break_alert_fires_once_at_threshold() {
    let (mut engine, rx) = engine_with(TimerConfig::default());
    engine.start();
    engine.skip();
    assert_eq!(engine.mode(), Mode::ShortBreak);

    tick_n(&mut engine, 300 - 11);
    assert_eq!(engine.state().remaining_secs, 11);
    assert!(!rx.try_iter().any(|e| e == Event::PreBreakAlert));

    // The 00:10 tick raises the alert, announced just ahead of that tick.
    engine.tick();
    let events: Vec<Event> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Event::PreBreakAlert);
    assert!(matches!(&events[1], Event::Tick { snapshot } if snapshot.remaining_secs == 10));
    assert!(engine.state().pre_alert_raised);

    tick_n(&mut engine, 10);
    assert_eq!(engine.mode(), Mode::Work);
    let later_alerts = rx
        .try_iter()
        .filter(|e| matches!(e, Event::PreBreakAlert))
        .count();
    assert_eq!(later_alerts, 0);
}

#[test]
fn no_pre_alert_during_work_or_when_disabled() {
    let config = TimerConfig {
        work_minutes: 1,
        short_break_minutes: 1,
        pre_break_alert_seconds: 0,
        auto_start_work: true,
        ..TimerConfig::default()
    };
    let (mut engine, rx) = engine_with(config);
    engine.start();
    tick_n(&mut engine, 120);
    assert!(!rx.try_iter().any(|e| matches!(e, Event::PreBreakAlert)));

    let (mut engine, rx) = engine_with(TimerConfig {
        work_minutes: 1,
        ..TimerConfig::default()
    });
    engine.start();
    tick_n(&mut engine, 59);
    assert!(!rx.try_iter().any(|e| matches!(e, Event::PreBreakAlert)));
}

#[test]
fn start_from_idle_emits_one_switch_then_state() {
    let (mut engine, rx) = engine_with(TimerConfig::default());
    engine.start();
    let events: Vec<Event> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Event::SessionSwitched { mode: Mode::Work });
    assert!(matches!(&events[1], Event::StateChanged { snapshot } if snapshot.is_running));
}

#[test]
fn skip_emits_completion_switch_state_in_order() {
    let (mut engine, rx) = engine_with(TimerConfig::default());
    engine.start();
    rx.try_iter().for_each(drop);

    engine.skip();
    let events: Vec<Event> = rx.try_iter().collect();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], Event::SessionCompleted { entry } if !entry.completed));
    assert_eq!(events[1], Event::SessionSwitched { mode: Mode::ShortBreak });
    assert!(matches!(&events[2], Event::StateChanged { .. }));
}

#[test]
fn final_tick_emits_tick_before_completion() {
    let (mut engine, rx) = engine_with(TimerConfig {
        work_minutes: 1,
        ..TimerConfig::default()
    });
    engine.start();
    tick_n(&mut engine, 59);
    rx.try_iter().for_each(drop);

    engine.tick();
    let kinds: Vec<&'static str> = rx
        .try_iter()
        .map(|e| match e {
            Event::Tick { .. } => "tick",
            Event::StateChanged { .. } => "state",
            Event::SessionSwitched { .. } => "switch",
            Event::SessionCompleted { .. } => "completed",
            Event::PreBreakAlert => "alert",
        })
        .collect();
    assert_eq!(kinds, vec!["tick", "completed", "switch", "state"]);
}

#[test]
fn noop_commands_emit_nothing() {
    let (mut engine, rx) = engine_with(TimerConfig::default());
    assert!(!engine.pause());
    assert!(!engine.resume());
    assert!(!engine.skip());
    engine.tick();
    assert_eq!(rx.try_iter().count(), 0);
}

// ── Properties ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Start,
    Pause,
    Resume,
    Skip,
    Reset,
    Tick(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Pause),
        Just(Op::Resume),
        Just(Op::Skip),
        Just(Op::Reset),
        (1u64..130).prop_map(Op::Tick),
    ]
}

fn small_config() -> impl Strategy<Value = TimerConfig> {
    (
        -1i64..3,
        -1i64..3,
        -1i64..3,
        -1i64..6,
        any::<bool>(),
        any::<bool>(),
        -5i64..90,
    )
        .prop_map(|(w, s, l, i, ab, aw, p)| TimerConfig {
            work_minutes: w,
            short_break_minutes: s,
            long_break_minutes: l,
            long_break_interval: i,
            auto_start_break: ab,
            auto_start_work: aw,
            pre_break_alert_seconds: p,
        })
}

fn apply(engine: &mut TimerEngine, op: &Op) {
    match op {
        Op::Start => {
            engine.start();
        }
        Op::Pause => {
            engine.pause();
        }
        Op::Resume => {
            engine.resume();
        }
        Op::Skip => {
            engine.skip();
        }
        Op::Reset => {
            engine.reset();
        }
        Op::Tick(n) => {
            // Check the countdown bounds after every single tick.
            for _ in 0..*n {
                engine.tick();
                let s = engine.state();
                assert!(s.remaining_secs <= s.duration_secs);
            }
        }
    }
}

proptest! {
    #[test]
    fn invariants_hold_for_any_command_sequence(
        config in small_config(),
        ops in prop::collection::vec(op(), 1..60),
    ) {
        let (mut engine, _rx) = engine_with(config);
        for op in &ops {
            let before_mode = engine.mode();
            let before_cycles = engine.cycle_count();
            apply(&mut engine, op);
            let s = engine.state();

            prop_assert!(!s.is_paused || s.is_running);
            prop_assert!(s.remaining_secs <= s.duration_secs);
            if s.mode == Mode::Idle {
                prop_assert_eq!(s.remaining_secs, 0);
                prop_assert_eq!(s.duration_secs, 0);
                prop_assert!(!s.is_running);
            } else {
                prop_assert!(s.duration_secs >= 60);
            }

            let gained = s.cycle_count - before_cycles;
            match op {
                Op::Skip => {
                    let expected = u32::from(before_mode == Mode::Work);
                    prop_assert_eq!(gained, expected);
                    if before_mode == Mode::Work {
                        prop_assert!(s.mode.is_break());
                    }
                }
                Op::Tick(_) => {}
                _ => {
                    prop_assert_eq!(gained, 0);
                }
            }
        }
    }

    #[test]
    fn persisted_roundtrip_preserves_reachable_state(
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let config = TimerConfig {
            work_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 2,
            ..TimerConfig::default()
        };
        let clock = clock();
        let (mut engine, _rx) = engine_with(config.clone());
        for op in &ops {
            apply(&mut engine, op);
        }
        let original = engine.state().clone();
        let record = to_persisted(&original, clock.now());
        let back = from_persisted(&record, &config, clock.now(), RecoveryOptions::default());

        prop_assert_eq!(back.mode, original.mode);
        prop_assert_eq!(back.is_running, original.is_running);
        prop_assert_eq!(back.is_paused, original.is_paused);
        prop_assert_eq!(back.cycle_count, original.cycle_count);
        prop_assert_eq!(back.remaining_secs, original.remaining_secs);
        prop_assert_eq!(back.duration_secs, original.duration_secs);
        prop_assert!(!back.pre_alert_raised);
    }
}
