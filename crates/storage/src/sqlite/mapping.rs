use quiz_core::model::{AnswerId, QuestionId, SessionMode};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn answer_id_from_i64(v: i64) -> Result<AnswerId, StorageError> {
    Ok(AnswerId::new(i64_to_u64("answer_id", v)?))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Converts a stored mode name back into `SessionMode`.
/// This must stay consistent with `SessionMode::as_str`.
pub(crate) fn mode_from_str(s: &str) -> Result<SessionMode, StorageError> {
    s.parse::<SessionMode>().map_err(ser)
}
