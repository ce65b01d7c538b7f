//! SQLite-based session log and key-value store.
//!
//! Provides persistent storage for:
//! - Finished and abandoned sessions, appended from `SessionCompleted` events
//! - The persisted runtime record used for crash recovery (kv table)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{data_dir, StateStore};
use crate::error::{DatabaseError, Result};
use crate::recovery::PersistedRuntimeState;
use crate::timer::{Mode, SessionLogEntry};

const RUNTIME_STATE_KEY: &str = "runtime_state";

/// A stored session log entry with its row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub entry: SessionLogEntry,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/focuscycle/focuscycle.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("focuscycle.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    mode        TEXT NOT NULL,
                    started_at  TEXT NOT NULL,
                    ended_at    TEXT NOT NULL,
                    completed   INTEGER NOT NULL,
                    note        TEXT NOT NULL DEFAULT '',
                    tag_ids     TEXT NOT NULL DEFAULT '[]'
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Append a session log entry.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, entry: &SessionLogEntry) -> Result<i64> {
        let tag_ids = serde_json::to_string(&entry.tag_ids)?;
        self.conn.execute(
            "INSERT INTO sessions (mode, started_at, ended_at, completed, note, tag_ids)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.mode.as_str(),
                entry.start_at.to_rfc3339(),
                entry.end_at.to_rfc3339(),
                entry.completed,
                entry.note,
                tag_ids,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    ///
    /// Rows that no longer decode (unknown mode, bad timestamp) are skipped.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, started_at, ended_at, completed, note, tag_ids
             FROM sessions
             ORDER BY ended_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, mode, started_at, ended_at, completed, note, tag_ids) = row?;
            match decode_session(&mode, &started_at, &ended_at, &tag_ids) {
                Ok((mode, start_at, end_at, tag_ids)) => records.push(SessionRecord {
                    id,
                    entry: SessionLogEntry {
                        start_at,
                        end_at,
                        mode,
                        completed,
                        note,
                        tag_ids,
                    },
                }),
                Err(e) => tracing::warn!("skipping session row {id}: {e}"),
            }
        }
        Ok(records)
    }

    pub fn session_count(&self) -> Result<u64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, u64>(0))?;
        Ok(n)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn decode_session(
    mode: &str,
    started_at: &str,
    ended_at: &str,
    tag_ids: &str,
) -> Result<(Mode, DateTime<Utc>, DateTime<Utc>, Vec<String>), DatabaseError> {
    let corrupt = |message: String| DatabaseError::CorruptRow {
        table: "sessions".into(),
        message,
    };
    let mode = Mode::parse(mode).ok_or_else(|| corrupt(format!("unknown mode '{mode}'")))?;
    let start_at = DateTime::parse_from_rfc3339(started_at)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);
    let end_at = DateTime::parse_from_rfc3339(ended_at)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);
    let tag_ids = serde_json::from_str(tag_ids).unwrap_or_default();
    Ok((mode, start_at, end_at, tag_ids))
}

impl StateStore for Database {
    fn load(&self) -> Option<PersistedRuntimeState> {
        match self.kv_get(RUNTIME_STATE_KEY) {
            Ok(Some(json)) => PersistedRuntimeState::from_json(&json),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("could not read runtime state: {e}");
                None
            }
        }
    }

    fn save(&self, state: &PersistedRuntimeState) -> Result<()> {
        self.kv_set(RUNTIME_STATE_KEY, &state.to_json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(minute: u32, completed: bool) -> SessionLogEntry {
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 8, minute, 0).unwrap();
        SessionLogEntry::new(Mode::Work, start, start + Duration::minutes(25), completed)
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        db.record_session(&entry(0, true).with_note("draft").with_tags(["t1"]))
            .unwrap();
        db.record_session(&entry(30, false)).unwrap();

        let rows = db.recent_sessions(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entry, entry(30, false));
        assert_eq!(rows[1].entry.note, "draft");
        assert_eq!(rows[1].entry.tag_ids, vec!["t1".to_string()]);
        assert!(rows[1].entry.completed);
        assert_eq!(db.session_count().unwrap(), 2);
    }

    #[test]
    fn recent_sessions_respects_limit() {
        let db = Database::open_memory().unwrap();
        for m in 0..5 {
            db.record_session(&entry(m, true)).unwrap();
        }
        assert_eq!(db.recent_sessions(3).unwrap().len(), 3);
    }

    #[test]
    fn corrupt_rows_are_skipped() {
        let db = Database::open_memory().unwrap();
        db.record_session(&entry(0, true)).unwrap();
        db.conn
            .execute(
                "INSERT INTO sessions (mode, started_at, ended_at, completed) VALUES ('nap', 'x', 'y', 1)",
                [],
            )
            .unwrap();
        assert_eq!(db.recent_sessions(10).unwrap().len(), 1);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn state_store_treats_garbage_as_absent() {
        let db = Database::open_memory().unwrap();
        assert!(StateStore::load(&db).is_none());
        db.kv_set(RUNTIME_STATE_KEY, "{ not json").unwrap();
        assert!(StateStore::load(&db).is_none());
    }

    #[test]
    fn state_store_roundtrip() {
        let db = Database::open_memory().unwrap();
        let record = PersistedRuntimeState {
            schema_version: crate::recovery::SCHEMA_VERSION,
            mode: Mode::LongBreak,
            previous_mode: Mode::LongBreak,
            is_running: true,
            is_paused: true,
            cycle_count: 4,
            remaining_seconds: 321,
            duration_seconds: 900,
            saved_at: Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
        };
        StateStore::save(&db, &record).unwrap();
        assert_eq!(StateStore::load(&db), Some(record));
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focuscycle.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.record_session(&entry(0, true)).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.session_count().unwrap(), 1);
    }
}
