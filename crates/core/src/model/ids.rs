use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::SessionMode;

/// Unique identifier for a Question
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(u64);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for an Answer option within a Question
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnswerId(u64);

impl AnswerId {
    /// Creates a new `AnswerId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnswerId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an ID from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(QuestionId::new)
            .map_err(|_| ParseIdError {
                kind: "QuestionId".to_string(),
            })
    }
}

impl FromStr for AnswerId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(AnswerId::new)
            .map_err(|_| ParseIdError {
                kind: "AnswerId".to_string(),
            })
    }
}

/// Opaque key identifying which content/topic combination a session belongs to.
///
/// The caller supplies the base scope (certification, topic, or mixed query).
/// The engine appends the mode name, so training and exam progress never share
/// a storage slot even when the caller passes one shared base scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionScope(String);

impl SessionScope {
    /// Creates a scope from the caller-supplied base key.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Returns the base scope key as supplied by the caller.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.0
    }

    /// Returns the storage key for one mode's persisted progress.
    #[must_use]
    pub fn storage_key(&self, mode: SessionMode) -> String {
        format!("{}:{}", self.0, mode.as_str())
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_display() {
        let id = QuestionId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_question_id_from_str() {
        let id: QuestionId = "123".parse().unwrap();
        assert_eq!(id, QuestionId::new(123));
    }

    #[test]
    fn test_question_id_from_str_invalid() {
        let result = "not-a-number".parse::<QuestionId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_answer_id_display() {
        let id = AnswerId::new(99);
        assert_eq!(id.to_string(), "99");
    }

    #[test]
    fn test_answer_id_from_str() {
        let id: AnswerId = "456".parse().unwrap();
        assert_eq!(id, AnswerId::new(456));
    }

    #[test]
    fn test_id_roundtrip() {
        let original = QuestionId::new(42);
        let serialized = original.to_string();
        let deserialized: QuestionId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn scope_keys_separate_modes() {
        let scope = SessionScope::new("aws-saa:networking");
        assert_eq!(
            scope.storage_key(SessionMode::Training),
            "aws-saa:networking:training"
        );
        assert_eq!(
            scope.storage_key(SessionMode::Exam),
            "aws-saa:networking:exam"
        );
    }
}
