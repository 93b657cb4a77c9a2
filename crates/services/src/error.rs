//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AnswerId, QuestionId, SessionSummaryError};
use storage::repository::StorageError;

/// Errors emitted by the session engine.
///
/// Pool loading distinguishes the unauthenticated case from generic storage
/// failures because the user-facing remedy differs. Snapshot and summary
/// persistence failures never appear here; they are tolerated where they
/// occur.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this scope")]
    EmptyPool,

    #[error("sign in to load practice questions")]
    Unauthenticated,

    #[error("session already finished")]
    Finished,

    #[error("switching modes would discard marked answers")]
    ModeLocked,

    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),

    #[error("answer {answer} does not belong to question {question}")]
    UnknownAnswer {
        question: QuestionId,
        answer: AnswerId,
    },

    #[error(transparent)]
    Summary(#[from] SessionSummaryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
