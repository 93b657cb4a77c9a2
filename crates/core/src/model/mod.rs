mod ids;
mod mode;
mod question;
mod settings;
mod snapshot;
mod summary;

pub use ids::{AnswerId, ParseIdError, QuestionId, SessionScope};
pub use mode::{ParseModeError, SessionMode};
pub use question::{Answer, Question, QuestionError};
pub use settings::{ModeConfig, SessionSettings, SettingsError, TimeLimit};
pub use snapshot::ProgressSnapshot;
pub use summary::{SessionSummary, SessionSummaryError};
