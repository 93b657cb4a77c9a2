use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{SessionMode, SessionScope, SessionSummary};
use storage::repository::SummaryRepository;

use crate::error::SessionError;

/// Row shape for an attempt history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptListItem {
    pub mode: SessionMode,
    pub completed_at: DateTime<Utc>,
    pub score_pct: u8,
    pub correct: u32,
    pub total: u32,
    pub time_expired: bool,
}

impl AttemptListItem {
    fn from_summary(summary: &SessionSummary) -> Self {
        Self {
            mode: summary.mode(),
            completed_at: summary.completed_at(),
            score_pct: summary.score_pct(),
            correct: summary.correct(),
            total: summary.total(),
            time_expired: summary.time_expired(),
        }
    }
}

/// Read-side service over recorded attempt summaries.
#[derive(Clone)]
pub struct SummaryHistoryService {
    summaries: Arc<dyn SummaryRepository>,
}

impl SummaryHistoryService {
    #[must_use]
    pub fn new(summaries: Arc<dyn SummaryRepository>) -> Self {
        Self { summaries }
    }

    /// Most recent attempts for a scope, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn recent(
        &self,
        scope: &SessionScope,
        limit: u32,
    ) -> Result<Vec<AttemptListItem>, SessionError> {
        let summaries = self.summaries.list_summaries(scope, limit).await?;
        Ok(summaries.iter().map(AttemptListItem::from_summary).collect())
    }
}
