//! Event emission for the session state machine.
//!
//! Each event kind has its own subscriber list. Emitting calls every
//! subscriber of that kind synchronously, in registration order, before the
//! engine continues. There is no queue and no retry.
//!
//! ## Subscriber contract
//!
//! Subscribers run on the engine's execution context. They must return
//! quickly and must not panic: a blocking subscriber stalls the countdown,
//! and a panic propagates out of the command or tick that emitted it.
//! Forward to a channel ([`EventBus::forward`]) for anything slow.

use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

use crate::timer::{Mode, SessionLogEntry, Snapshot};

/// Owned form of every event the engine emits, for consumers that prefer
/// one channel over five callback lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Tick { snapshot: Snapshot },
    StateChanged { snapshot: Snapshot },
    SessionSwitched { mode: Mode },
    SessionCompleted { entry: SessionLogEntry },
    PreBreakAlert,
}

/// Handle returned by every `on_*` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SnapshotFn = Box<dyn FnMut(&Snapshot) + Send>;
type ModeFn = Box<dyn FnMut(Mode) + Send>;
type EntryFn = Box<dyn FnMut(&SessionLogEntry) + Send>;
type AlertFn = Box<dyn FnMut() + Send>;

/// Per-kind subscriber lists.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    tick: Vec<(SubscriptionId, SnapshotFn)>,
    state_changed: Vec<(SubscriptionId, SnapshotFn)>,
    session_switched: Vec<(SubscriptionId, ModeFn)>,
    session_completed: Vec<(SubscriptionId, EntryFn)>,
    pre_break_alert: Vec<(SubscriptionId, AlertFn)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    // ── Registration ─────────────────────────────────────────────────

    pub fn on_tick(&mut self, f: impl FnMut(&Snapshot) + Send + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.tick.push((id, Box::new(f)));
        id
    }

    pub fn on_state_changed(
        &mut self,
        f: impl FnMut(&Snapshot) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.state_changed.push((id, Box::new(f)));
        id
    }

    pub fn on_session_switched(
        &mut self,
        f: impl FnMut(Mode) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.session_switched.push((id, Box::new(f)));
        id
    }

    pub fn on_session_completed(
        &mut self,
        f: impl FnMut(&SessionLogEntry) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.session_completed.push((id, Box::new(f)));
        id
    }

    pub fn on_pre_break_alert(&mut self, f: impl FnMut() + Send + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.pre_break_alert.push((id, Box::new(f)));
        id
    }

    /// Subscribe to every kind, sending owned [`Event`]s into `sender`.
    ///
    /// Sends to a dropped receiver are ignored. Returns one id per kind.
    pub fn forward(&mut self, sender: Sender<Event>) -> Vec<SubscriptionId> {
        let tx = sender.clone();
        let tick = self.on_tick(move |s| {
            let _ = tx.send(Event::Tick { snapshot: s.clone() });
        });
        let tx = sender.clone();
        let state = self.on_state_changed(move |s| {
            let _ = tx.send(Event::StateChanged { snapshot: s.clone() });
        });
        let tx = sender.clone();
        let switched = self.on_session_switched(move |mode| {
            let _ = tx.send(Event::SessionSwitched { mode });
        });
        let tx = sender.clone();
        let completed = self.on_session_completed(move |entry| {
            let _ = tx.send(Event::SessionCompleted { entry: entry.clone() });
        });
        let tx = sender;
        let alert = self.on_pre_break_alert(move || {
            let _ = tx.send(Event::PreBreakAlert);
        });
        vec![tick, state, switched, completed, alert]
    }

    /// Remove a subscriber. Returns false if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        fn remove<T>(list: &mut Vec<(SubscriptionId, T)>, id: SubscriptionId) -> bool {
            let before = list.len();
            list.retain(|(sid, _)| *sid != id);
            list.len() != before
        }
        remove(&mut self.tick, id)
            || remove(&mut self.state_changed, id)
            || remove(&mut self.session_switched, id)
            || remove(&mut self.session_completed, id)
            || remove(&mut self.pre_break_alert, id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tick.len()
            + self.state_changed.len()
            + self.session_switched.len()
            + self.session_completed.len()
            + self.pre_break_alert.len()
    }

    // ── Emission ─────────────────────────────────────────────────────

    pub(crate) fn emit_tick(&mut self, snapshot: &Snapshot) {
        for (_, f) in self.tick.iter_mut() {
            f(snapshot);
        }
    }

    pub(crate) fn emit_state_changed(&mut self, snapshot: &Snapshot) {
        for (_, f) in self.state_changed.iter_mut() {
            f(snapshot);
        }
    }

    pub(crate) fn emit_session_switched(&mut self, mode: Mode) {
        for (_, f) in self.session_switched.iter_mut() {
            f(mode);
        }
    }

    pub(crate) fn emit_session_completed(&mut self, entry: &SessionLogEntry) {
        for (_, f) in self.session_completed.iter_mut() {
            f(entry);
        }
    }

    pub(crate) fn emit_pre_break_alert(&mut self) {
        for (_, f) in self.pre_break_alert.iter_mut() {
            f();
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("tick", &self.tick.len())
            .field("state_changed", &self.state_changed.len())
            .field("session_switched", &self.session_switched.len())
            .field("session_completed", &self.session_completed.len())
            .field("pre_break_alert", &self.pre_break_alert.len())
            .finish()
    }
}
