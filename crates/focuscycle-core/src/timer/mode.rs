use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the work/break cycle.
///
/// `Idle` is the only untimed mode: it has no countdown and is left only
/// through `start()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Work,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub fn is_break(self) -> bool {
        matches!(self, Mode::ShortBreak | Mode::LongBreak)
    }

    pub fn is_timed(self) -> bool {
        self != Mode::Idle
    }

    /// Human-readable label used by the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Work => "Work",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    /// Stable identifier used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Work => "work",
            Mode::ShortBreak => "short_break",
            Mode::LongBreak => "long_break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Mode::Idle),
            "work" => Some(Mode::Work),
            "short_break" => Some(Mode::ShortBreak),
            "long_break" => Some(Mode::LongBreak),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_breaks_are_breaks() {
        assert!(Mode::ShortBreak.is_break());
        assert!(Mode::LongBreak.is_break());
        assert!(!Mode::Work.is_break());
        assert!(!Mode::Idle.is_break());
    }

    #[test]
    fn storage_ids_parse_back() {
        for mode in [Mode::Idle, Mode::Work, Mode::ShortBreak, Mode::LongBreak] {
            assert_eq!(Mode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(Mode::parse("focus"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Mode::LongBreak).unwrap();
        assert_eq!(json, "\"long_break\"");
    }
}
