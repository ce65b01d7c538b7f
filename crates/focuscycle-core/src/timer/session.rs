use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Mode;

/// Record of one finished or abandoned session.
///
/// The engine emits it with an empty note and no tags; the presentation
/// layer attaches those before handing it to the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub mode: Mode,
    /// True only when the countdown reached zero on its own.
    pub completed: bool,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl SessionLogEntry {
    pub fn new(mode: Mode, start_at: DateTime<Utc>, end_at: DateTime<Utc>, completed: bool) -> Self {
        Self {
            start_at,
            end_at,
            mode,
            completed,
            note: String::new(),
            tag_ids: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into().trim().to_string();
        self
    }

    /// Attach tag ids, sorted and de-duplicated.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = tags.into_iter().map(Into::into).collect();
        ids.sort_by_key(|id| id.to_lowercase());
        ids.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        self.tag_ids = ids;
        self
    }

    /// Wall time covered by the entry, never negative.
    pub fn duration_secs(&self) -> u64 {
        (self.end_at - self.start_at).num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry() -> SessionLogEntry {
        let start = Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap();
        SessionLogEntry::new(Mode::Work, start, start + Duration::minutes(25), true)
    }

    #[test]
    fn duration_is_end_minus_start() {
        assert_eq!(entry().duration_secs(), 25 * 60);
    }

    #[test]
    fn inverted_range_has_zero_duration() {
        let mut e = entry();
        std::mem::swap(&mut e.start_at, &mut e.end_at);
        assert_eq!(e.duration_secs(), 0);
    }

    #[test]
    fn tags_are_sorted_case_insensitively_and_deduped() {
        let e = entry().with_tags(["b", "A", "a", "c"]);
        assert_eq!(e.tag_ids, vec!["A".to_string(), "b".into(), "c".into()]);
    }

    #[test]
    fn note_is_trimmed() {
        assert_eq!(entry().with_note("  wrote tests \n").note, "wrote tests");
    }

    #[test]
    fn legacy_json_without_note_or_tags_parses() {
        let json = r#"{"start_at":"2026-05-04T10:00:00Z","end_at":"2026-05-04T10:25:00Z","mode":"work","completed":false}"#;
        let e: SessionLogEntry = serde_json::from_str(json).unwrap();
        assert!(e.note.is_empty());
        assert!(e.tag_ids.is_empty());
        assert!(!e.completed);
    }
}
