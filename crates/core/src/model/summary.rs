use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::model::ids::{AnswerId, QuestionId};
use crate::model::SessionMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("summary total must be > 0")]
    EmptyTotal,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Result of one finished session.
///
/// Produced exactly once per finish. The denominator is always the full
/// active question set: an unanswered question scores like a wrong one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    attempt_id: Uuid,
    mode: SessionMode,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total: u32,
    correct: u32,
    answers: BTreeMap<QuestionId, AnswerId>,
    time_expired: bool,
}

impl SessionSummary {
    /// Builds a summary for a freshly finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError` when the time range is inverted, the
    /// total is zero, or the correct count exceeds the total.
    pub fn new(
        mode: SessionMode,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total: u32,
        correct: u32,
        answers: BTreeMap<QuestionId, AnswerId>,
        time_expired: bool,
    ) -> Result<Self, SessionSummaryError> {
        Self::from_persisted(
            Uuid::new_v4(),
            mode,
            started_at,
            completed_at,
            total,
            correct,
            answers,
            time_expired,
        )
    }

    /// Rehydrate a summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Same validation as [`SessionSummary::new`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        attempt_id: Uuid,
        mode: SessionMode,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total: u32,
        correct: u32,
        answers: BTreeMap<QuestionId, AnswerId>,
        time_expired: bool,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if total == 0 {
            return Err(SessionSummaryError::EmptyTotal);
        }
        if correct > total {
            return Err(SessionSummaryError::CorrectExceedsTotal { correct, total });
        }

        Ok(Self {
            attempt_id,
            mode,
            started_at,
            completed_at,
            total,
            correct,
            answers,
            time_expired,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Selected answer per question, for per-question result display.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, AnswerId> {
        &self.answers
    }

    #[must_use]
    pub fn time_expired(&self) -> bool {
        self.time_expired
    }

    /// Score as a rounded percentage of the full question set.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn score_pct(&self) -> u8 {
        let pct = f64::from(self.correct) * 100.0 / f64::from(self.total);
        pct.round() as u8
    }

    /// Wall-clock duration of the finishing run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.completed_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn answers(pairs: &[(u64, u64)]) -> BTreeMap<QuestionId, AnswerId> {
        pairs
            .iter()
            .map(|(q, a)| (QuestionId::new(*q), AnswerId::new(*a)))
            .collect()
    }

    #[test]
    fn score_rounds_to_nearest_percent() {
        let now = fixed_now();
        let summary = SessionSummary::new(
            SessionMode::Exam,
            now,
            now,
            3,
            2,
            answers(&[(1, 10), (2, 20)]),
            false,
        )
        .unwrap();
        // 2/3 = 66.66..% rounds to 67
        assert_eq!(summary.score_pct(), 67);
    }

    #[test]
    fn perfect_run_scores_hundred() {
        let now = fixed_now();
        let summary = SessionSummary::new(
            SessionMode::Exam,
            now,
            now + Duration::seconds(90),
            5,
            5,
            answers(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]),
            false,
        )
        .unwrap();
        assert_eq!(summary.score_pct(), 100);
        assert_eq!(summary.elapsed(), Duration::seconds(90));
    }

    #[test]
    fn inverted_time_range_rejected() {
        let now = fixed_now();
        let err = SessionSummary::new(
            SessionMode::Training,
            now,
            now - Duration::seconds(1),
            1,
            0,
            BTreeMap::new(),
            false,
        )
        .unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn correct_above_total_rejected() {
        let now = fixed_now();
        let err =
            SessionSummary::new(SessionMode::Exam, now, now, 2, 3, BTreeMap::new(), true)
                .unwrap_err();
        assert_eq!(
            err,
            SessionSummaryError::CorrectExceedsTotal { correct: 3, total: 2 }
        );
    }

    #[test]
    fn zero_total_rejected() {
        let now = fixed_now();
        let err =
            SessionSummary::new(SessionMode::Exam, now, now, 0, 0, BTreeMap::new(), false)
                .unwrap_err();
        assert_eq!(err, SessionSummaryError::EmptyTotal);
    }
}
