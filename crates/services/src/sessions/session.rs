use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

use quiz_core::model::{
    Answer, AnswerId, ProgressSnapshot, Question, QuestionId, SessionMode, SessionScope,
    SessionSettings, SessionSummary,
};

use super::plan::SessionPlan;
use super::progress::SessionProgress;
use super::timer::ExamTimer;
use crate::error::SessionError;

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Correctness feedback for one answered question.
///
/// Available immediately in training mode; exam mode withholds it until the
/// session has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback<'a> {
    pub chosen: &'a Answer,
    pub correct: Option<&'a Answer>,
    pub is_correct: bool,
    pub explanation: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FinishedState {
    completed_at: DateTime<Utc>,
    time_expired: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Stateful quiz run over one question pool.
///
/// Owns the fetched pool (reused across mode switches and restarts), the
/// active question list drawn from it, the per-question answer marks, the
/// review-later flags, and the exam timer. Terminal once finished; only a
/// restart re-enters a playable state.
pub struct QuizSession {
    scope: SessionScope,
    mode: SessionMode,
    settings: SessionSettings,
    pool: Vec<Question>,
    active: Vec<Question>,
    position: usize,
    marked: BTreeMap<QuestionId, AnswerId>,
    review_later: Vec<QuestionId>,
    in_review_pass: bool,
    started_at: DateTime<Utc>,
    timer: Option<ExamTimer>,
    finished: Option<FinishedState>,
}

impl QuizSession {
    /// Create a fresh session over an already-built plan.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    #[must_use]
    pub fn new(
        scope: SessionScope,
        mode: SessionMode,
        settings: SessionSettings,
        pool: Vec<Question>,
        plan: SessionPlan,
        started_at: DateTime<Utc>,
    ) -> Self {
        let timer = ExamTimer::for_mode(mode, &settings, plan.total(), started_at);
        Self {
            scope,
            mode,
            settings,
            pool,
            active: plan.questions,
            position: 0,
            marked: BTreeMap::new(),
            review_later: Vec::new(),
            in_review_pass: false,
            started_at,
            timer,
            finished: None,
        }
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The full fetched pool, untouched by builds.
    #[must_use]
    pub fn pool(&self) -> &[Question] {
        &self.pool
    }

    /// The active question list in presentation order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.active
    }

    /// Ids of the active questions in presentation order.
    #[must_use]
    pub fn question_ids(&self) -> Vec<QuestionId> {
        self.active.iter().map(Question::id).collect()
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.active.get(self.position)
    }

    #[must_use]
    pub fn marked(&self) -> &BTreeMap<QuestionId, AnswerId> {
        &self.marked
    }

    #[must_use]
    pub fn marked_answer(&self, question_id: QuestionId) -> Option<AnswerId> {
        self.marked.get(&question_id).copied()
    }

    /// Flagged questions in flag order.
    #[must_use]
    pub fn review_later(&self) -> &[QuestionId] {
        &self.review_later
    }

    #[must_use]
    pub fn is_flagged(&self, question_id: QuestionId) -> bool {
        self.review_later.contains(&question_id)
    }

    #[must_use]
    pub fn in_review_pass(&self) -> bool {
        self.in_review_pass
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.finished.map(|f| f.completed_at)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.marked.len()
    }

    /// Remaining seconds of a timed session; `None` when no clock runs.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u32> {
        self.timer.map(|t| t.remaining_secs(now))
    }

    /// True when a running clock has reached zero on an unfinished session.
    #[must_use]
    pub fn timer_expired(&self, now: DateTime<Utc>) -> bool {
        self.finished.is_none() && self.timer.is_some_and(|t| t.is_expired(now))
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.active.len();
        let answered = self.marked.len();
        SessionProgress {
            total,
            answered,
            flagged: self.review_later.len(),
            remaining: total.saturating_sub(answered),
            position: self.position,
            in_review_pass: self.in_review_pass,
            is_finished: self.is_finished(),
        }
    }

    /// Correctness feedback for a question, honoring the mode's reveal rule.
    #[must_use]
    pub fn feedback(&self, question_id: QuestionId) -> Option<AnswerFeedback<'_>> {
        if !self.mode.reveals_feedback() && !self.is_finished() {
            return None;
        }
        let question = self.active.iter().find(|q| q.id() == question_id)?;
        let chosen = question.answer(self.marked.get(&question_id).copied()?)?;
        let correct = question.correct_answer();
        Some(AnswerFeedback {
            chosen,
            correct,
            is_correct: correct.is_some_and(|c| c.id() == chosen.id()),
            explanation: question.explanation(),
        })
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Record (or overwrite) the selected answer for a question.
    ///
    /// Never advances the position; choosing twice simply replaces the prior
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after finish, `UnknownQuestion` /
    /// `UnknownAnswer` for ids outside the active set.
    pub fn choose(
        &mut self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;
        let question = self
            .active
            .iter()
            .find(|q| q.id() == question_id)
            .ok_or(SessionError::UnknownQuestion(question_id))?;
        if question.answer(answer_id).is_none() {
            return Err(SessionError::UnknownAnswer {
                question: question_id,
                answer: answer_id,
            });
        }
        self.marked.insert(question_id, answer_id);
        Ok(())
    }

    /// Advance the session.
    ///
    /// During a review pass this walks the flag list; in the main pass it
    /// steps forward, and reaching the end in training mode enters the review
    /// pass when any flags exist. Reaching the end in exam mode is a no-op
    /// (finishing is an explicit call).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after finish.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;

        if self.in_review_pass {
            self.advance_review_pass();
            return Ok(());
        }

        if self.position + 1 < self.active.len() {
            self.position += 1;
            return Ok(());
        }

        if self.mode == SessionMode::Training && !self.review_later.is_empty() {
            self.in_review_pass = true;
            self.jump_to(self.review_later[0]);
        }
        Ok(())
    }

    /// Step back one question, floored at the first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after finish.
    pub fn prev(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.position = self.position.saturating_sub(1);
        Ok(())
    }

    /// Flag or unflag a question for the review pass.
    ///
    /// Changing the flag set invalidates any iteration over it, so this
    /// always exits a running review pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after finish, `UnknownQuestion` for
    /// ids outside the active set.
    pub fn toggle_review_later(&mut self, question_id: QuestionId) -> Result<(), SessionError> {
        self.ensure_active()?;
        if !self.active.iter().any(|q| q.id() == question_id) {
            return Err(SessionError::UnknownQuestion(question_id));
        }
        if let Some(index) = self.review_later.iter().position(|id| *id == question_id) {
            self.review_later.remove(index);
        } else {
            self.review_later.push(question_id);
        }
        self.in_review_pass = false;
        Ok(())
    }

    /// Jump to the first unanswered question, preferring one the user also
    /// flagged for review over a plain unanswered one.
    ///
    /// No-op when every question is answered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` after finish.
    pub fn go_to_first_unanswered(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;

        let flagged_unanswered = self
            .review_later
            .iter()
            .find(|id| !self.marked.contains_key(*id))
            .copied();
        if let Some(id) = flagged_unanswered {
            self.jump_to(id);
            return Ok(());
        }

        if let Some(index) = self
            .active
            .iter()
            .position(|q| !self.marked.contains_key(&q.id()))
        {
            self.position = index;
        }
        Ok(())
    }

    /// Transition to the terminal finished state and compute the summary.
    ///
    /// Every active question counts in the denominator; an unanswered
    /// question scores like a wrong one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` when already finished, so a finish
    /// can happen at most once per run.
    pub fn finish(
        &mut self,
        now: DateTime<Utc>,
        time_expired: bool,
    ) -> Result<SessionSummary, SessionError> {
        self.ensure_active()?;

        let total = u32::try_from(self.active.len()).unwrap_or(u32::MAX);
        let correct_count = self
            .active
            .iter()
            .filter(|question| {
                self.marked
                    .get(&question.id())
                    .and_then(|answer_id| {
                        question.correct_answer().map(|c| c.id() == *answer_id)
                    })
                    .unwrap_or(false)
            })
            .count();
        let correct = u32::try_from(correct_count).unwrap_or(u32::MAX);

        let summary = SessionSummary::new(
            self.mode,
            self.started_at,
            now,
            total,
            correct,
            self.marked.clone(),
            time_expired,
        )?;

        self.finished = Some(FinishedState {
            completed_at: now,
            time_expired,
        });
        self.in_review_pass = false;
        Ok(summary)
    }

    //
    // ─── SNAPSHOTS ─────────────────────────────────────────────────────────────
    //

    /// Capture the current progress for persistence.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> ProgressSnapshot {
        ProgressSnapshot {
            question_ids: self.question_ids(),
            marked: self.marked.clone(),
            review_later: self.review_later.clone(),
            position: self.position,
            remaining_secs: self.timer.map(|t| t.remaining_secs(now)),
            started_at: Some(self.started_at),
        }
    }

    /// Apply a persisted snapshot onto a freshly built session.
    ///
    /// Returns false (leaving the session untouched) unless the snapshot's
    /// question order matches the active list exactly. Entries referencing
    /// unknown questions or answers are dropped rather than restored; a
    /// persisted remaining budget becomes the new timer total anchored at
    /// `now`.
    pub fn restore(&mut self, snapshot: &ProgressSnapshot, now: DateTime<Utc>) -> bool {
        if !snapshot.matches_order(&self.question_ids()) {
            return false;
        }

        self.marked = snapshot
            .marked
            .iter()
            .filter(|(question_id, answer_id)| {
                self.active
                    .iter()
                    .find(|q| q.id() == **question_id)
                    .is_some_and(|q| q.answer(**answer_id).is_some())
            })
            .map(|(q, a)| (*q, *a))
            .collect();

        let mut review_later = Vec::with_capacity(snapshot.review_later.len());
        for id in &snapshot.review_later {
            let known = self.active.iter().any(|q| q.id() == *id);
            if known && !review_later.contains(id) {
                review_later.push(*id);
            }
        }
        self.review_later = review_later;

        self.position = snapshot.position.min(self.active.len().saturating_sub(1));
        self.in_review_pass = false;

        if self.timer.is_some() {
            if let Some(remaining) = snapshot.remaining_secs {
                self.timer = Some(ExamTimer::resume(remaining, now));
            }
            self.started_at = now;
        } else {
            self.started_at = snapshot.started_at.unwrap_or(now);
        }
        true
    }

    /// Replace the active set and reset all transient state.
    ///
    /// Used by restarts and mode switches; the pool stays as fetched.
    pub(crate) fn reset_with_plan(
        &mut self,
        mode: SessionMode,
        plan: SessionPlan,
        now: DateTime<Utc>,
    ) {
        self.mode = mode;
        self.active = plan.questions;
        self.position = 0;
        self.marked.clear();
        self.review_later.clear();
        self.in_review_pass = false;
        self.started_at = now;
        self.timer = ExamTimer::for_mode(mode, &self.settings, self.active.len(), now);
        self.finished = None;
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        Ok(())
    }

    fn jump_to(&mut self, question_id: QuestionId) {
        if let Some(index) = self.active.iter().position(|q| q.id() == question_id) {
            self.position = index;
        }
    }

    /// Walk the flag list forward from the current question: first the next
    /// flagged-and-unanswered question, then any later flagged one, else the
    /// pass is over.
    fn advance_review_pass(&mut self) {
        let current_id = self.current_question().map(Question::id);
        let start = current_id
            .and_then(|id| self.review_later.iter().position(|flag| *flag == id))
            .map_or(0, |index| index + 1);

        let rest = &self.review_later[start.min(self.review_later.len())..];
        let target = rest
            .iter()
            .find(|id| !self.marked.contains_key(*id))
            .or_else(|| rest.first())
            .copied();

        match target {
            Some(id) => self.jump_to(id),
            None => self.in_review_pass = false,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("scope", &self.scope)
            .field("mode", &self.mode)
            .field("pool_len", &self.pool.len())
            .field("active_len", &self.active.len())
            .field("position", &self.position)
            .field("marked_len", &self.marked.len())
            .field("review_later_len", &self.review_later.len())
            .field("in_review_pass", &self.in_review_pass)
            .field("finished", &self.finished.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
