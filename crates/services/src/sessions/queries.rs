use chrono::{DateTime, Utc};
use std::collections::HashSet;

use quiz_core::model::{
    ProgressSnapshot, Question, SessionMode, SessionScope, SessionSettings,
};
use storage::repository::{QuestionRepository, SnapshotStore, StorageError};

use super::plan::{SessionBuilder, SessionPlan, Shuffle};
use super::session::QuizSession;
use crate::error::SessionError;

/// Storage-backed session construction and resumption.
pub(crate) struct SessionQueries;

impl SessionQueries {
    /// Fetch the pool once and build or resume a session.
    ///
    /// A stored snapshot whose question ids still resolve against the pool
    /// (and whose length equals what a fresh build would draw) is the source
    /// of truth for question order, so re-entering a mode does not reshuffle
    /// a session in progress. Any mismatch silently discards the snapshot
    /// and a clean, freshly shuffled session starts instead.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unauthenticated` when the pool source requires
    /// sign-in, `SessionError::EmptyPool` when the scope has no questions,
    /// or `SessionError::Storage` for other fetch failures.
    pub async fn start_from_storage(
        scope: &SessionScope,
        mode: SessionMode,
        settings: SessionSettings,
        shuffle: Shuffle,
        questions: &dyn QuestionRepository,
        snapshots: &dyn SnapshotStore,
        now: DateTime<Utc>,
    ) -> Result<QuizSession, SessionError> {
        let pool = questions
            .fetch_pool(scope)
            .await
            .map_err(map_pool_error)?;
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let key = scope.storage_key(mode);
        let stored = match snapshots.load(&key).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to load session snapshot");
                None
            }
        };

        if let Some(snapshot) = stored {
            if let Some(active) = resolve_snapshot_order(&pool, &snapshot, &settings, mode) {
                let plan = SessionPlan { questions: active };
                let mut session =
                    QuizSession::new(scope.clone(), mode, settings, pool, plan, now);
                session.restore(&snapshot, now);
                return Ok(session);
            }
        }

        let plan = SessionBuilder::new(&settings)
            .with_shuffle(shuffle)
            .build(&pool, mode)?;
        Ok(QuizSession::new(scope.clone(), mode, settings, pool, plan, now))
    }
}

/// Rebuild the active question list from a snapshot's stored order.
///
/// Returns `None` when the snapshot cannot apply: wrong length for the
/// current pool and limit, duplicate ids, or ids that no longer exist in the
/// pool (content changed underneath the saved session).
fn resolve_snapshot_order(
    pool: &[Question],
    snapshot: &ProgressSnapshot,
    settings: &SessionSettings,
    mode: SessionMode,
) -> Option<Vec<Question>> {
    let cap = settings
        .config_for(mode)
        .question_limit()
        .map_or(pool.len(), |limit| usize::try_from(limit).unwrap_or(usize::MAX));
    let target_len = pool.len().min(cap);
    if snapshot.question_ids.len() != target_len {
        return None;
    }

    let mut seen = HashSet::with_capacity(target_len);
    let mut active = Vec::with_capacity(target_len);
    for id in &snapshot.question_ids {
        if !seen.insert(*id) {
            return None;
        }
        let question = pool.iter().find(|q| q.id() == *id)?;
        active.push(question.clone());
    }
    Some(active)
}

fn map_pool_error(err: StorageError) -> SessionError {
    match err {
        StorageError::Unauthorized => SessionError::Unauthenticated,
        other => SessionError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Answer, AnswerId, QuestionId};

    fn build_question(id: u64) -> Question {
        let answers = vec![
            Answer::new(AnswerId::new(1), "right", true).unwrap(),
            Answer::new(AnswerId::new(2), "wrong", false).unwrap(),
        ];
        Question::new(QuestionId::new(id), format!("Q{id}"), answers, None).unwrap()
    }

    fn snapshot_of(ids: &[u64]) -> ProgressSnapshot {
        ProgressSnapshot {
            question_ids: ids.iter().map(|id| QuestionId::new(*id)).collect(),
            ..ProgressSnapshot::default()
        }
    }

    #[test]
    fn snapshot_order_resolves_against_pool() {
        let pool: Vec<_> = (1..=3).map(build_question).collect();
        let settings = SessionSettings::default_exam_prep();

        let active = resolve_snapshot_order(
            &pool,
            &snapshot_of(&[3, 1, 2]),
            &settings,
            SessionMode::Training,
        )
        .unwrap();
        let ids: Vec<_> = active.iter().map(Question::id).collect();
        assert_eq!(
            ids,
            vec![QuestionId::new(3), QuestionId::new(1), QuestionId::new(2)]
        );
    }

    #[test]
    fn snapshot_order_rejects_wrong_length_unknown_or_duplicate_ids() {
        let pool: Vec<_> = (1..=3).map(build_question).collect();
        let settings = SessionSettings::default_exam_prep();
        let mode = SessionMode::Training;

        assert!(resolve_snapshot_order(&pool, &snapshot_of(&[1, 2]), &settings, mode).is_none());
        assert!(
            resolve_snapshot_order(&pool, &snapshot_of(&[1, 2, 9]), &settings, mode).is_none()
        );
        assert!(
            resolve_snapshot_order(&pool, &snapshot_of(&[1, 2, 2]), &settings, mode).is_none()
        );
    }

    #[test]
    fn map_pool_error_separates_unauthenticated() {
        assert!(matches!(
            map_pool_error(StorageError::Unauthorized),
            SessionError::Unauthenticated
        ));
        assert!(matches!(
            map_pool_error(StorageError::NotFound),
            SessionError::Storage(StorageError::NotFound)
        ));
    }
}
