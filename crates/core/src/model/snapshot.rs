use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{AnswerId, QuestionId};

/// Persisted progress of one interrupted session, keyed by `scope:mode`.
///
/// Written on every state mutation, read once at session start, deleted when
/// the session finishes or is restarted. Every field carries a serde default
/// so snapshots written by older builds still deserialize; a snapshot that no
/// longer matches the current question order is discarded, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Active question order at the time of save; the restore key.
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,

    /// Selected answer per question.
    #[serde(default)]
    pub marked: BTreeMap<QuestionId, AnswerId>,

    /// Questions flagged for a second pass, in flag order.
    #[serde(default)]
    pub review_later: Vec<QuestionId>,

    /// Current position into the active question list.
    #[serde(default)]
    pub position: usize,

    /// Remaining time budget for a timed mode; `None` when untimed.
    #[serde(default)]
    pub remaining_secs: Option<u32>,

    /// Wall-clock anchor of the running clock at save time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl ProgressSnapshot {
    /// Returns true when this snapshot was taken over exactly the given
    /// question order (same length, same ids, same positions).
    #[must_use]
    pub fn matches_order(&self, question_ids: &[QuestionId]) -> bool {
        self.question_ids.len() == question_ids.len()
            && self.question_ids.iter().zip(question_ids).all(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(n: u64) -> QuestionId {
        QuestionId::new(n)
    }

    #[test]
    fn matches_only_identical_order() {
        let snapshot = ProgressSnapshot {
            question_ids: vec![qid(1), qid(2), qid(3)],
            ..ProgressSnapshot::default()
        };

        assert!(snapshot.matches_order(&[qid(1), qid(2), qid(3)]));
        assert!(!snapshot.matches_order(&[qid(1), qid(3), qid(2)]));
        assert!(!snapshot.matches_order(&[qid(1), qid(2)]));
        assert!(!snapshot.matches_order(&[qid(1), qid(2), qid(3), qid(4)]));
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let snapshot: ProgressSnapshot = serde_json::from_str(r#"{"position": 2}"#).unwrap();
        assert_eq!(snapshot.position, 2);
        assert!(snapshot.question_ids.is_empty());
        assert!(snapshot.marked.is_empty());
        assert!(snapshot.review_later.is_empty());
        assert_eq!(snapshot.remaining_secs, None);
        assert_eq!(snapshot.started_at, None);
    }

    #[test]
    fn json_roundtrip_preserves_state() {
        let mut marked = BTreeMap::new();
        marked.insert(qid(2), AnswerId::new(20));
        let snapshot = ProgressSnapshot {
            question_ids: vec![qid(1), qid(2)],
            marked,
            review_later: vec![qid(1)],
            position: 1,
            remaining_secs: Some(300),
            started_at: Some(crate::time::fixed_now()),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ProgressSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
