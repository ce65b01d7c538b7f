mod config;
pub mod database;
mod tags;

pub use config::{Config, RecoveryConfig};
pub use database::{Database, SessionRecord};
pub use tags::{TagAxis, TaskTag};

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::Result;
use crate::recovery::PersistedRuntimeState;

/// Returns the data directory, creating it if needed.
///
/// `FOCUSCYCLE_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/focuscycle[-dev]/`, with `FOCUSCYCLE_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSCYCLE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSCYCLE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focuscycle-dev")
            } else {
                base_dir.join("focuscycle")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Where the runtime record lives between process runs.
///
/// `load` never fails: a missing, unreadable or corrupt record is "no prior
/// state", and the implementation logs why.
pub trait StateStore {
    fn load(&self) -> Option<PersistedRuntimeState>;
    fn save(&self, state: &PersistedRuntimeState) -> Result<()>;
}

/// In-memory [`StateStore`], useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    slot: Mutex<Option<PersistedRuntimeState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedRuntimeState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Option<PersistedRuntimeState> {
        self.slot.lock().ok()?.clone()
    }

    fn save(&self, state: &PersistedRuntimeState) -> Result<()> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(state.clone());
        Ok(())
    }
}
