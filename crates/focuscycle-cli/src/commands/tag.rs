use clap::Subcommand;
use focuscycle_core::storage::TagAxis;
use focuscycle_core::{Config, TaskTag};

#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    Add {
        /// Display name
        name: String,
        /// Grouping axis: work_type, client or other
        #[arg(long, default_value = "work_type")]
        axis: String,
        /// Color as a hex string (e.g. "#E4572E")
        #[arg(long)]
        color: Option<String>,
    },
    /// List tags
    List {
        /// Include archived tags
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Archive a tag so it can no longer be attached
    Archive {
        /// Tag id
        id: String,
    },
}

pub fn run(action: TagAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        TagAction::Add { name, axis, color } => {
            if name.trim().is_empty() {
                return Err("tag name must not be empty".into());
            }
            let axis = TagAxis::parse(&axis).ok_or_else(|| format!("unknown axis: {axis}"))?;
            let mut tag = TaskTag::new(name, axis);
            if let Some(color) = color.filter(|c| !c.trim().is_empty()) {
                tag.color_hex = color.trim().to_string();
            }
            config.tags.push(tag.clone());
            config.save()?;
            println!("{}", tag.id);
        }
        TagAction::List { all, json } => {
            let tags: Vec<&TaskTag> = if all {
                config.tags.iter().collect()
            } else {
                config.active_tags().collect()
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else if tags.is_empty() {
                println!("No tags.");
            } else {
                for tag in tags {
                    let archived = if tag.archived { " (archived)" } else { "" };
                    println!("{}  {}  {}{archived}", tag.id, tag.color_hex, tag.name);
                }
            }
        }
        TagAction::Archive { id } => {
            let tag = config
                .tags
                .iter_mut()
                .find(|t| t.id.eq_ignore_ascii_case(&id))
                .ok_or_else(|| format!("unknown tag: {id}"))?;
            tag.archived = true;
            let name = tag.name.clone();
            config.save()?;
            println!("archived {name}");
        }
    }
    Ok(())
}
