use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::SessionMode;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question limit must be > 0")]
    InvalidQuestionLimit,

    #[error("time limit seconds must be > 0")]
    InvalidTimeLimit,

    #[error("legacy time limit seconds must be > 0")]
    InvalidLegacyTimeLimit,
}

//
// ─── TIME LIMIT ────────────────────────────────────────────────────────────────
//

/// Explicit time budget of a mode.
///
/// A mode config may also omit the limit entirely, in which case the budget
/// is derived at session start (legacy global value, then one minute per
/// question).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "secs")]
pub enum TimeLimit {
    /// Never start a clock; no auto-finish can occur.
    Untimed,
    /// Fixed budget in seconds.
    Seconds(u32),
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Per-mode session shape: how many questions to draw and how long to allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    question_limit: Option<u32>,
    time_limit: Option<TimeLimit>,
}

impl ModeConfig {
    /// Creates a mode config.
    ///
    /// `question_limit = None` means the full pool. `time_limit = None` means
    /// the budget is derived at session start.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero question limit or zero-second time limit.
    pub fn new(
        question_limit: Option<u32>,
        time_limit: Option<TimeLimit>,
    ) -> Result<Self, SettingsError> {
        if question_limit == Some(0) {
            return Err(SettingsError::InvalidQuestionLimit);
        }
        if time_limit == Some(TimeLimit::Seconds(0)) {
            return Err(SettingsError::InvalidTimeLimit);
        }
        Ok(Self {
            question_limit,
            time_limit,
        })
    }

    #[must_use]
    pub fn question_limit(&self) -> Option<u32> {
        self.question_limit
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<TimeLimit> {
        self.time_limit
    }
}

/// Configuration for quiz sessions over one question pool.
///
/// Controls per-mode draw sizes, time budgets, and the mode-switch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    training: ModeConfig,
    exam: ModeConfig,
    legacy_time_limit_secs: Option<u32>,
    mode_switch_marked_limit: u32,
}

impl SessionSettings {
    /// Defaults tuned for certification-exam preparation:
    /// - training walks the full pool, untimed
    /// - exam draws at most 60 questions with a derived time budget
    /// - switching modes is blocked as soon as any answer is marked
    #[must_use]
    pub fn default_exam_prep() -> Self {
        Self {
            training: ModeConfig {
                question_limit: None,
                time_limit: Some(TimeLimit::Untimed),
            },
            exam: ModeConfig {
                question_limit: Some(60),
                time_limit: None,
            },
            legacy_time_limit_secs: None,
            mode_switch_marked_limit: 0,
        }
    }

    /// Creates custom settings.
    ///
    /// `mode_switch_marked_limit` is the number of marked answers up to which
    /// a mode switch is still permitted (switching always discards progress;
    /// the limit only controls when the engine refuses to do so silently).
    ///
    /// # Errors
    ///
    /// Returns an error when the legacy time limit is zero.
    pub fn new(
        training: ModeConfig,
        exam: ModeConfig,
        legacy_time_limit_secs: Option<u32>,
        mode_switch_marked_limit: u32,
    ) -> Result<Self, SettingsError> {
        if legacy_time_limit_secs == Some(0) {
            return Err(SettingsError::InvalidLegacyTimeLimit);
        }
        Ok(Self {
            training,
            exam,
            legacy_time_limit_secs,
            mode_switch_marked_limit,
        })
    }

    /// The config applied to the given mode.
    #[must_use]
    pub fn config_for(&self, mode: SessionMode) -> &ModeConfig {
        match mode {
            SessionMode::Training => &self.training,
            SessionMode::Exam => &self.exam,
        }
    }

    /// Fallback budget for modes that predate per-mode time limits.
    #[must_use]
    pub fn legacy_time_limit_secs(&self) -> Option<u32> {
        self.legacy_time_limit_secs
    }

    /// Marked-answer count up to which a mode switch is still allowed.
    #[must_use]
    pub fn mode_switch_marked_limit(&self) -> u32 {
        self.mode_switch_marked_limit
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::default_exam_prep()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_question_limit_rejected() {
        let err = ModeConfig::new(Some(0), None).unwrap_err();
        assert_eq!(err, SettingsError::InvalidQuestionLimit);
    }

    #[test]
    fn zero_time_limit_rejected() {
        let err = ModeConfig::new(None, Some(TimeLimit::Seconds(0))).unwrap_err();
        assert_eq!(err, SettingsError::InvalidTimeLimit);
    }

    #[test]
    fn defaults_cap_exam_and_leave_training_open() {
        let settings = SessionSettings::default_exam_prep();
        assert_eq!(settings.config_for(SessionMode::Exam).question_limit(), Some(60));
        assert_eq!(settings.config_for(SessionMode::Training).question_limit(), None);
        assert_eq!(
            settings.config_for(SessionMode::Training).time_limit(),
            Some(TimeLimit::Untimed)
        );
        assert_eq!(settings.mode_switch_marked_limit(), 0);
    }

    #[test]
    fn zero_legacy_limit_rejected() {
        let training = ModeConfig::new(None, Some(TimeLimit::Untimed)).unwrap();
        let exam = ModeConfig::new(Some(10), None).unwrap();
        let err = SessionSettings::new(training, exam, Some(0), 0).unwrap_err();
        assert_eq!(err, SettingsError::InvalidLegacyTimeLimit);
    }
}
