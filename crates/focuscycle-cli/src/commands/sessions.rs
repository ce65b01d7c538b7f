use chrono::Local;
use clap::Subcommand;
use focuscycle_core::Database;

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List recent sessions, newest first
    List {
        /// Maximum number of sessions
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SessionsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionsAction::List { limit, json } => {
            let records = db.recent_sessions(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            if records.is_empty() {
                println!("No sessions recorded.");
                return Ok(());
            }
            for record in records {
                let entry = &record.entry;
                let status = if entry.completed { "done" } else { "skipped" };
                let minutes = entry.duration_secs() / 60;
                let mut line = format!(
                    "{:>5}  {}  {:<11} {:>3}m  {status}",
                    record.id,
                    entry.start_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    entry.mode.label(),
                    minutes
                );
                if !entry.note.is_empty() {
                    line.push_str(&format!("  \"{}\"", entry.note));
                }
                println!("{line}");
            }
        }
    }
    Ok(())
}
