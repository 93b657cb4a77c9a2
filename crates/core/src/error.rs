use thiserror::Error;

use crate::model::{QuestionError, SessionSummaryError, SettingsError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}
