use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a session behaves once built.
///
/// Training gives immediate per-answer feedback and runs a review pass over
/// flagged questions at the end of the main pass. Exam suppresses feedback
/// until finish and is time-bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Training,
    Exam,
}

impl SessionMode {
    /// Stable lowercase name, used in storage keys and persisted rows.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Training => "training",
            SessionMode::Exam => "exam",
        }
    }

    /// Returns true when per-answer feedback is visible before finish.
    #[must_use]
    pub fn reveals_feedback(&self) -> bool {
        matches!(self, SessionMode::Training)
    }

    /// Returns true when the mode runs against a time budget.
    #[must_use]
    pub fn is_timed(&self) -> bool {
        matches!(self, SessionMode::Exam)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError {
    raw: String,
}

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown session mode: {}", self.raw)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for SessionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(SessionMode::Training),
            "exam" => Ok(SessionMode::Exam),
            other => Err(ParseModeError {
                raw: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_name_roundtrip() {
        for mode in [SessionMode::Training, SessionMode::Exam] {
            let parsed: SessionMode = mode.as_str().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn unknown_mode_fails_to_parse() {
        assert!("speedrun".parse::<SessionMode>().is_err());
    }

    #[test]
    fn exam_is_timed_training_is_not() {
        assert!(SessionMode::Exam.is_timed());
        assert!(!SessionMode::Training.is_timed());
        assert!(SessionMode::Training.reveals_feedback());
        assert!(!SessionMode::Exam.reveals_feedback());
    }
}
