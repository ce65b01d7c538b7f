use std::sync::mpsc;

use clap::Subcommand;
use focuscycle_core::{Config, Database, Event, StateStore, TimerEngine};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a work session, or continue the stopped one
    Start,
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Abandon the current session and move to the next
    Skip,
    /// Reset to idle state
    Reset,
    /// Print current timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    let mut engine = TimerEngine::new(config.timer);
    let (tx, rx) = mpsc::channel();
    engine.events_mut().forward(tx);
    engine.recover(&db, config.recovery.options());

    let applied = match action {
        TimerAction::Start => Some(engine.start()),
        TimerAction::Pause => Some(engine.pause()),
        TimerAction::Resume => Some(engine.resume()),
        TimerAction::Skip => Some(engine.skip()),
        TimerAction::Reset => Some(engine.reset()),
        TimerAction::Status => None,
    };
    if applied == Some(false) {
        tracing::info!("nothing to do in {}", engine.mode());
    }

    for event in rx.try_iter() {
        if let Event::SessionCompleted { entry } = event {
            db.record_session(&entry)?;
        }
    }
    db.save(&engine.to_persisted())?;

    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}
