#![forbid(unsafe_code)]

pub mod error;
pub mod http_pool;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::SessionError;
pub use http_pool::{HttpPoolConfig, HttpQuestionSource};

pub use sessions::{
    AnswerFeedback, AttemptListItem, ExamTimer, QuizSession, SessionBuilder, SessionCoordinator,
    SessionPlan, SessionProgress, Shuffle, SummaryHistoryService, TickerHandle, drive_timer,
};
