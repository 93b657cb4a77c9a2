use std::sync::Arc;

use quiz_core::model::{
    AnswerId, QuestionId, SessionMode, SessionScope, SessionSettings, SessionSummary,
};
use storage::repository::{QuestionRepository, SnapshotStore, SummaryRepository};

use super::plan::{SessionBuilder, Shuffle};
use super::queries::SessionQueries;
use super::session::QuizSession;
use crate::Clock;
use crate::error::SessionError;

/// Orchestrates session start, persisted progress, and the finish flow.
///
/// Every mutating wrapper applies the change to the state machine and then
/// writes one fresh snapshot — the save is fire-and-forget, so a failing
/// store never interrupts the session. The finish flow likewise treats the
/// summary append as best-effort: finishing is never blocked by a downstream
/// persistence failure.
#[derive(Clone)]
pub struct SessionCoordinator {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    snapshots: Arc<dyn SnapshotStore>,
    summaries: Arc<dyn SummaryRepository>,
    settings: SessionSettings,
    shuffle: Shuffle,
}

impl SessionCoordinator {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        snapshots: Arc<dyn SnapshotStore>,
        summaries: Arc<dyn SummaryRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            snapshots,
            summaries,
            settings: SessionSettings::default_exam_prep(),
            shuffle: Shuffle::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: Shuffle) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Start (or resume) a session for the scope and mode.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unauthenticated`, `SessionError::EmptyPool`,
    /// or `SessionError::Storage` for pool load failures.
    pub async fn start_session(
        &self,
        scope: SessionScope,
        mode: SessionMode,
    ) -> Result<QuizSession, SessionError> {
        SessionQueries::start_from_storage(
            &scope,
            mode,
            self.settings,
            self.shuffle,
            self.questions.as_ref(),
            self.snapshots.as_ref(),
            self.clock.now(),
        )
        .await
    }

    /// Record an answer and persist progress.
    ///
    /// # Errors
    ///
    /// Propagates state machine errors; snapshot saves never fail the call.
    pub async fn answer(
        &self,
        session: &mut QuizSession,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), SessionError> {
        session.choose(question_id, answer_id)?;
        self.persist(session).await;
        Ok(())
    }

    /// Advance to the next question (or through the review pass) and persist.
    ///
    /// # Errors
    ///
    /// Propagates state machine errors.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.next()?;
        self.persist(session).await;
        Ok(())
    }

    /// Step back one question and persist.
    ///
    /// # Errors
    ///
    /// Propagates state machine errors.
    pub async fn back(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.prev()?;
        self.persist(session).await;
        Ok(())
    }

    /// Flag or unflag a question for review and persist.
    ///
    /// # Errors
    ///
    /// Propagates state machine errors.
    pub async fn toggle_review(
        &self,
        session: &mut QuizSession,
        question_id: QuestionId,
    ) -> Result<(), SessionError> {
        session.toggle_review_later(question_id)?;
        self.persist(session).await;
        Ok(())
    }

    /// Jump to the first unanswered question and persist.
    ///
    /// # Errors
    ///
    /// Propagates state machine errors.
    pub async fn jump_to_first_unanswered(
        &self,
        session: &mut QuizSession,
    ) -> Result<(), SessionError> {
        session.go_to_first_unanswered()?;
        self.persist(session).await;
        Ok(())
    }

    /// Switch the session to another mode.
    ///
    /// Switching discards in-progress work by contract, so it is refused once
    /// more answers are marked than the configured policy allows. On success
    /// the stored snapshots of **both** modes are dropped and a freshly
    /// shuffled active set is drawn from the retained pool.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ModeLocked` when marked answers exceed the
    /// policy limit, or `SessionError::EmptyPool` if the pool became empty.
    pub async fn switch_mode(
        &self,
        session: &mut QuizSession,
        mode: SessionMode,
    ) -> Result<(), SessionError> {
        if session.mode() == mode {
            return Ok(());
        }
        let limit = usize::try_from(self.settings.mode_switch_marked_limit())
            .unwrap_or(usize::MAX);
        if session.answered_count() > limit {
            return Err(SessionError::ModeLocked);
        }

        for cleared in [SessionMode::Training, SessionMode::Exam] {
            self.clear_snapshot(session.scope(), cleared).await;
        }

        let plan = SessionBuilder::new(&self.settings)
            .with_shuffle(self.shuffle)
            .build(session.pool(), mode)?;
        session.reset_with_plan(mode, plan, self.clock.now());
        Ok(())
    }

    /// Restart the session: drop the stored snapshot and reshuffle a new
    /// active set from the retained pool. Valid mid-session or after finish.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if the pool became empty.
    pub async fn restart(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        self.clear_snapshot(session.scope(), session.mode()).await;
        let plan = SessionBuilder::new(&self.settings)
            .with_shuffle(self.shuffle)
            .build(session.pool(), session.mode())?;
        session.reset_with_plan(session.mode(), plan, self.clock.now());
        Ok(())
    }

    /// Finish the session and hand back the summary.
    ///
    /// The summary append and the snapshot removal are both best-effort; the
    /// terminal transition and the returned summary stand regardless.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` when the session already finished.
    pub async fn finish(
        &self,
        session: &mut QuizSession,
        time_expired: bool,
    ) -> Result<SessionSummary, SessionError> {
        let summary = session.finish(self.clock.now(), time_expired)?;

        if let Err(err) = self
            .summaries
            .append_summary(session.scope(), &summary)
            .await
        {
            tracing::warn!(
                scope = %session.scope(),
                error = %err,
                "failed to record attempt summary"
            );
        }
        self.clear_snapshot(session.scope(), session.mode()).await;

        Ok(summary)
    }

    /// Auto-finish an expired exam, exactly once.
    ///
    /// Returns `Ok(None)` while time remains, for untimed sessions, and on
    /// every tick after the finishing one.
    ///
    /// # Errors
    ///
    /// Propagates summary construction failures from the finish flow.
    pub async fn tick(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<SessionSummary>, SessionError> {
        if !session.timer_expired(self.clock.now()) {
            return Ok(None);
        }
        let summary = self.finish(session, true).await?;
        Ok(Some(summary))
    }

    async fn persist(&self, session: &QuizSession) {
        let now = self.clock.now();
        let key = session.scope().storage_key(session.mode());
        let snapshot = session.snapshot(now);
        if let Err(err) = self.snapshots.save(&key, &snapshot).await {
            tracing::warn!(key = %key, error = %err, "failed to persist session snapshot");
        }
    }

    async fn clear_snapshot(&self, scope: &SessionScope, mode: SessionMode) {
        let key = scope.storage_key(mode);
        if let Err(err) = self.snapshots.clear(&key).await {
            tracing::warn!(key = %key, error = %err, "failed to clear session snapshot");
        }
    }
}
