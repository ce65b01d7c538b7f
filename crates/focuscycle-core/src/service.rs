//! Single-owner driver for [`TimerEngine`].
//!
//! One tokio task owns the engine. Commands arrive on an unbounded channel
//! and ticks come from a one-second interval on the same task, so no tick
//! ever overlaps a command. Any number of [`TimerHandle`] clones, from any
//! thread, marshal work onto that task.
//!
//! Stopping the loop (via [`TimerHandle::shutdown`] or dropping every
//! handle) is the only cancellation: the interval is simply not polled again.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::recovery::{PersistedRuntimeState, RecoveryOptions};
use crate::timer::{Snapshot, TimerConfig, TimerEngine};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

enum Command {
    Start,
    Pause,
    Resume,
    Skip,
    Reset,
    UpdateConfig(TimerConfig),
    Restore(PersistedRuntimeState, RecoveryOptions),
    Snapshot(oneshot::Sender<Snapshot>),
    Persisted(oneshot::Sender<PersistedRuntimeState>),
    Shutdown,
}

/// Cloneable handle to a running [`TimerService`].
///
/// Commands are fire-and-forget. Queries return `None` once the service has
/// stopped.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl TimerHandle {
    fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            tracing::debug!("timer service stopped; command dropped");
        }
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    pub fn skip(&self) {
        self.send(Command::Skip);
    }

    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    pub fn update_config(&self, config: TimerConfig) {
        self.send(Command::UpdateConfig(config));
    }

    pub fn restore(&self, record: PersistedRuntimeState, options: RecoveryOptions) {
        self.send(Command::Restore(record, options));
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(Command::Snapshot(tx)).ok()?;
        rx.await.ok()
    }

    pub async fn persisted(&self) -> Option<PersistedRuntimeState> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(Command::Persisted(tx)).ok()?;
        rx.await.ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct TimerService;

impl TimerService {
    /// Move `engine` onto a new task. Must be called inside a tokio runtime.
    ///
    /// The join handle yields the engine back when the loop stops.
    pub fn spawn(engine: TimerEngine) -> (TimerHandle, JoinHandle<TimerEngine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(engine, rx));
        (TimerHandle { tx }, task)
    }
}

async fn run(mut engine: TimerEngine, mut rx: mpsc::UnboundedReceiver<Command>) -> TimerEngine {
    let mut ticker = time::interval_at(time::Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                let was_counting = engine.is_counting();
                match cmd {
                    Command::Start => {
                        engine.start();
                    }
                    Command::Pause => {
                        engine.pause();
                    }
                    Command::Resume => {
                        engine.resume();
                    }
                    Command::Skip => {
                        engine.skip();
                    }
                    Command::Reset => {
                        engine.reset();
                    }
                    Command::UpdateConfig(config) => engine.update_config(config),
                    Command::Restore(record, options) => engine.restore(&record, options),
                    Command::Snapshot(reply) => {
                        let _ = reply.send(engine.snapshot());
                    }
                    Command::Persisted(reply) => {
                        let _ = reply.send(engine.to_persisted());
                    }
                    Command::Shutdown => break,
                }
                if !was_counting && engine.is_counting() {
                    // A full second before the first tick of a fresh count.
                    ticker.reset();
                }
            }
            _ = ticker.tick() => engine.tick(),
        }
    }

    tracing::debug!("timer service stopped");
    engine
}
