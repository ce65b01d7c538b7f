//! Foreground session: the timer service plus storage wiring.

use std::path::Path;

use clap::Args;
use focuscycle_core::{
    Config, Database, Event, Mode, SessionLogEntry, StateStore, TimerEngine, TimerHandle,
    TimerService,
};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

#[derive(Args)]
pub struct RunArgs {
    /// Note attached to work sessions finished during this run
    #[arg(long)]
    pub note: Option<String>,
    /// Tag id attached to work sessions (repeatable)
    #[arg(long = "tag", value_name = "ID")]
    pub tags: Vec<String>,
    /// Start the timer immediately
    #[arg(long)]
    pub start: bool,
}

/// Note and tags stamped onto finished work sessions.
#[derive(Debug, Default)]
struct WorkLabels {
    note: String,
    tag_ids: Vec<String>,
}

impl WorkLabels {
    fn apply(&self, entry: SessionLogEntry) -> SessionLogEntry {
        if entry.mode != Mode::Work {
            return entry;
        }
        entry
            .with_note(self.note.as_str())
            .with_tags(self.tag_ids.iter().cloned())
    }
}

/// Map user-supplied tag ids to configured, active tags.
fn resolve_tags(config: &Config, ids: &[String]) -> Result<Vec<String>, String> {
    ids.iter()
        .map(|id| match config.find_tag(id) {
            Some(tag) if !tag.archived => Ok(tag.id.clone()),
            Some(tag) => Err(format!("tag '{}' is archived", tag.name)),
            None => Err(format!("unknown tag: {id}")),
        })
        .collect()
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_loop(args))
}

async fn run_loop(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = Config::path()?;
    let mut config = Config::load_from(&config_path)?;
    let labels = WorkLabels {
        note: args.note.unwrap_or_default(),
        tag_ids: resolve_tags(&config, &args.tags)?,
    };
    let db = Database::open()?;

    let mut engine = TimerEngine::new(config.timer.clone());
    let (tx, rx) = std::sync::mpsc::channel();
    engine.events_mut().forward(tx);
    engine.recover(&db, config.recovery.options());

    // Subscribers run on the service task; storage work happens here.
    let (event_tx, mut events) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        for event in rx {
            if event_tx.send(event).is_err() {
                break;
            }
        }
    });

    let (handle, task) = TimerService::spawn(engine);
    if args.start {
        handle.start();
    }

    let mut save_every = time::interval(config.recovery.save_interval());
    save_every.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                tracing::info!("interrupted");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if handle_event(&db, &labels, event)? {
                    save(&db, &handle).await?;
                }
            }
            _ = save_every.tick() => {
                save(&db, &handle).await?;
                reload_timer_config(&config_path, &mut config, &handle);
            }
        }
    }

    handle.shutdown();
    let engine = task.await?;
    db.save(&engine.to_persisted())?;
    drop(engine);

    // Completions emitted just before shutdown are still in flight.
    while let Some(event) = events.recv().await {
        handle_event(&db, &labels, event)?;
    }
    Ok(())
}

/// Print or store one event. Returns true when the state changed.
fn handle_event(
    db: &Database,
    labels: &WorkLabels,
    event: Event,
) -> Result<bool, Box<dyn std::error::Error>> {
    match event {
        Event::Tick { snapshot } => {
            println!(
                "{:<11} {}  cycle {}",
                snapshot.mode.label(),
                snapshot.remaining_clock(),
                snapshot.cycle_count
            );
        }
        Event::StateChanged { snapshot } => {
            tracing::info!(
                "{} {} (running: {}, paused: {})",
                snapshot.mode,
                snapshot.remaining_clock(),
                snapshot.is_running,
                snapshot.is_paused
            );
            return Ok(true);
        }
        Event::SessionSwitched { mode } => {
            tracing::info!("now in {}", mode.label());
        }
        Event::SessionCompleted { entry } => {
            let entry = labels.apply(entry);
            let id = db.record_session(&entry)?;
            tracing::info!(
                "{} session #{id} {} after {}s",
                entry.mode.label(),
                if entry.completed { "completed" } else { "skipped" },
                entry.duration_secs()
            );
        }
        Event::PreBreakAlert => {
            tracing::info!("break is almost over");
        }
    }
    Ok(false)
}

async fn save(db: &Database, handle: &TimerHandle) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(record) = handle.persisted().await {
        db.save(&record)?;
    }
    Ok(())
}

/// Pick up `[timer]` edits made while running.
fn reload_timer_config(path: &Path, config: &mut Config, handle: &TimerHandle) {
    let fresh = match Config::load_from(path) {
        Ok(fresh) => fresh,
        Err(e) => {
            tracing::warn!("keeping current configuration: {e}");
            return;
        }
    };
    if fresh.timer != config.timer {
        tracing::info!("timer configuration changed; applying from the next session");
        handle.update_config(fresh.timer.clone());
    }
    *config = fresh;
}
