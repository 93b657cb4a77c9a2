use async_trait::async_trait;
use chrono::Duration;
use quiz_core::model::{
    Answer, AnswerId, ModeConfig, Question, QuestionId, SessionMode, SessionScope,
    SessionSettings, TimeLimit,
};
use quiz_core::time::fixed_now;
use services::{Clock, SessionCoordinator, SessionError, Shuffle};
use std::sync::Arc;
use storage::repository::{
    InMemoryRepository, QuestionRepository, StorageError, SummaryRepository,
};

fn build_question(id: u64) -> Question {
    let answers = vec![
        Answer::new(AnswerId::new(id * 10 + 1), "right", true).unwrap(),
        Answer::new(AnswerId::new(id * 10 + 2), "wrong", false).unwrap(),
        Answer::new(AnswerId::new(id * 10 + 3), "also wrong", false).unwrap(),
    ];
    Question::new(QuestionId::new(id), format!("Q{id}"), answers, None).unwrap()
}

fn correct_for(id: QuestionId) -> AnswerId {
    AnswerId::new(id.value() * 10 + 1)
}

fn seeded_repo(scope: &SessionScope, questions: u64) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.seed_questions(scope, (1..=questions).map(build_question).collect())
        .unwrap();
    repo
}

fn coordinator(repo: &InMemoryRepository, settings: SessionSettings) -> SessionCoordinator {
    SessionCoordinator::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
    .with_settings(settings)
    .with_shuffle(Shuffle::Seeded(11))
}

fn exam_settings(limit: u32, secs: u32) -> SessionSettings {
    let training = ModeConfig::new(None, Some(TimeLimit::Untimed)).unwrap();
    let exam = ModeConfig::new(Some(limit), Some(TimeLimit::Seconds(secs))).unwrap();
    SessionSettings::new(training, exam, None, 0).unwrap()
}

#[tokio::test]
async fn exam_flow_scores_and_persists_summary() {
    let scope = SessionScope::new("aws-saa:networking");
    let repo = seeded_repo(&scope, 10);
    let coordinator = coordinator(&repo, exam_settings(5, 60));

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Exam)
        .await
        .unwrap();
    assert_eq!(session.questions().len(), 5);

    let ids = session.question_ids();
    for id in &ids {
        coordinator
            .answer(&mut session, *id, correct_for(*id))
            .await
            .unwrap();
    }

    let summary = coordinator.finish(&mut session, false).await.unwrap();
    assert_eq!(summary.total(), 5);
    assert_eq!(summary.correct(), 5);
    assert_eq!(summary.score_pct(), 100);
    assert!(session.is_finished());

    // the summary landed in storage and the snapshot is gone
    let listed = repo.list_summaries(&scope, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].score_pct(), 100);
    let key = scope.storage_key(SessionMode::Exam);
    assert!(repo.snapshot_for(&key).unwrap().is_none());
}

#[tokio::test]
async fn interrupted_session_resumes_with_same_order_and_marks() {
    let scope = SessionScope::new("aws-saa:networking");
    let repo = seeded_repo(&scope, 8);
    let coordinator = coordinator(&repo, exam_settings(5, 600));

    let mut first = coordinator
        .start_session(scope.clone(), SessionMode::Exam)
        .await
        .unwrap();
    let order = first.question_ids();
    let answered = order[0];
    coordinator
        .answer(&mut first, answered, correct_for(answered))
        .await
        .unwrap();
    coordinator.advance(&mut first).await.unwrap();
    drop(first);

    // a new start sees the snapshot and keeps its order instead of reshuffling
    let resumed = coordinator
        .start_session(scope.clone(), SessionMode::Exam)
        .await
        .unwrap();
    assert_eq!(resumed.question_ids(), order);
    assert_eq!(resumed.position(), 1);
    assert_eq!(resumed.marked_answer(answered), Some(correct_for(answered)));
}

#[tokio::test]
async fn snapshot_from_changed_pool_is_discarded() {
    let scope = SessionScope::new("aws-saa:networking");
    let repo = seeded_repo(&scope, 5);
    let coordinator = coordinator(&repo, SessionSettings::default_exam_prep());

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();
    let first = session.question_ids()[0];
    coordinator
        .answer(&mut session, first, correct_for(first))
        .await
        .unwrap();
    drop(session);

    // the pool shrinks under the saved session
    repo.seed_questions(&scope, (1..=4).map(build_question).collect())
        .unwrap();

    let fresh = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();
    assert_eq!(fresh.questions().len(), 4);
    assert_eq!(fresh.answered_count(), 0);
    assert_eq!(fresh.position(), 0);
}

#[tokio::test]
async fn restart_clears_snapshot_and_resets_state() {
    let scope = SessionScope::new("aws-saa:storage");
    let repo = seeded_repo(&scope, 6);
    let coordinator = coordinator(&repo, SessionSettings::default_exam_prep());

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();
    let first = session.question_ids()[0];
    coordinator
        .answer(&mut session, first, correct_for(first))
        .await
        .unwrap();
    let key = scope.storage_key(SessionMode::Training);
    assert!(repo.snapshot_for(&key).unwrap().is_some());

    coordinator.restart(&mut session).await.unwrap();
    assert!(repo.snapshot_for(&key).unwrap().is_none());
    assert_eq!(session.answered_count(), 0);
    assert_eq!(session.position(), 0);
    assert!(!session.is_finished());
    assert_eq!(session.questions().len(), 6);
}

#[tokio::test]
async fn restart_after_finish_starts_a_playable_session() {
    let scope = SessionScope::new("aws-saa:storage");
    let repo = seeded_repo(&scope, 3);
    let coordinator = coordinator(&repo, SessionSettings::default_exam_prep());

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();
    coordinator.finish(&mut session, false).await.unwrap();
    assert!(session.is_finished());

    coordinator.restart(&mut session).await.unwrap();
    assert!(!session.is_finished());
    let first = session.question_ids()[0];
    coordinator
        .answer(&mut session, first, correct_for(first))
        .await
        .unwrap();
}

#[tokio::test]
async fn mode_switch_locks_once_answers_are_marked() {
    let scope = SessionScope::new("aws-saa:security");
    let repo = seeded_repo(&scope, 6);
    let coordinator = coordinator(&repo, exam_settings(4, 600));

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();

    // unanswered: switching is allowed, drops both stored snapshots,
    // and draws the exam-sized set
    coordinator
        .switch_mode(&mut session, SessionMode::Exam)
        .await
        .unwrap();
    assert_eq!(session.mode(), SessionMode::Exam);
    assert_eq!(session.questions().len(), 4);

    let first = session.question_ids()[0];
    coordinator
        .answer(&mut session, first, correct_for(first))
        .await
        .unwrap();

    let err = coordinator
        .switch_mode(&mut session, SessionMode::Training)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ModeLocked));
    assert_eq!(session.mode(), SessionMode::Exam);
}

#[tokio::test]
async fn mode_switch_clears_both_mode_snapshots() {
    let scope = SessionScope::new("aws-saa:security");
    let repo = seeded_repo(&scope, 6);
    let coordinator = coordinator(&repo, SessionSettings::default_exam_prep());

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();
    coordinator.advance(&mut session).await.unwrap();
    let training_key = scope.storage_key(SessionMode::Training);
    assert!(repo.snapshot_for(&training_key).unwrap().is_some());

    coordinator
        .switch_mode(&mut session, SessionMode::Exam)
        .await
        .unwrap();
    assert!(repo.snapshot_for(&training_key).unwrap().is_none());
    assert!(
        repo.snapshot_for(&scope.storage_key(SessionMode::Exam))
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn expired_exam_auto_finishes_exactly_once() {
    let scope = SessionScope::new("aws-saa:databases");
    let repo = seeded_repo(&scope, 5);
    let settings = exam_settings(5, 600);
    let coordinator = coordinator(&repo, settings);

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Exam)
        .await
        .unwrap();

    // 605 simulated seconds after start
    let late = coordinator
        .clone()
        .with_clock(Clock::fixed(fixed_now() + Duration::seconds(605)));

    assert_eq!(session.remaining_secs(late.clock().now()), Some(0));
    let summary = late.tick(&mut session).await.unwrap().expect("auto-finish");
    assert!(summary.time_expired());
    assert_eq!(summary.total(), 5);

    // later ticks are inert
    assert!(late.tick(&mut session).await.unwrap().is_none());
    assert_eq!(repo.list_summaries(&scope, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn tick_is_inert_while_time_remains_and_for_training() {
    let scope = SessionScope::new("aws-saa:databases");
    let repo = seeded_repo(&scope, 3);
    let coordinator = coordinator(&repo, exam_settings(3, 600));

    let mut exam = coordinator
        .start_session(scope.clone(), SessionMode::Exam)
        .await
        .unwrap();
    assert!(coordinator.tick(&mut exam).await.unwrap().is_none());

    let mut training = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();
    assert!(coordinator.tick(&mut training).await.unwrap().is_none());
}

struct UnauthenticatedSource;

#[async_trait]
impl QuestionRepository for UnauthenticatedSource {
    async fn fetch_pool(&self, _scope: &SessionScope) -> Result<Vec<Question>, StorageError> {
        Err(StorageError::Unauthorized)
    }
}

#[tokio::test]
async fn unauthenticated_pool_surfaces_distinct_error() {
    let repo = InMemoryRepository::new();
    let coordinator = SessionCoordinator::new(
        Clock::fixed(fixed_now()),
        Arc::new(UnauthenticatedSource),
        Arc::new(repo.clone()),
        Arc::new(repo),
    );

    let err = coordinator
        .start_session(SessionScope::new("any"), SessionMode::Training)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Unauthenticated));
}

#[tokio::test]
async fn empty_pool_surfaces_no_content_condition() {
    let repo = InMemoryRepository::new();
    let coordinator = coordinator(&repo, SessionSettings::default_exam_prep());

    let err = coordinator
        .start_session(SessionScope::new("unseeded"), SessionMode::Training)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::EmptyPool));
}

#[tokio::test]
async fn training_review_pass_positions_at_flagged_question() {
    let scope = SessionScope::new("aws-saa:compute");
    let repo = seeded_repo(&scope, 3);
    let coordinator = coordinator(&repo, SessionSettings::default_exam_prep());

    let mut session = coordinator
        .start_session(scope.clone(), SessionMode::Training)
        .await
        .unwrap();
    let ids = session.question_ids();

    coordinator
        .answer(&mut session, ids[0], correct_for(ids[0]))
        .await
        .unwrap();
    coordinator.toggle_review(&mut session, ids[1]).await.unwrap();
    coordinator
        .answer(&mut session, ids[2], correct_for(ids[2]))
        .await
        .unwrap();

    coordinator.advance(&mut session).await.unwrap();
    coordinator.advance(&mut session).await.unwrap();
    // reaching the end flips the session into its review pass, at the flag
    coordinator.advance(&mut session).await.unwrap();
    assert!(session.in_review_pass());
    assert_eq!(session.current_question().unwrap().id(), ids[1]);
}
