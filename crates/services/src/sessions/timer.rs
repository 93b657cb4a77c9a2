use chrono::{DateTime, Utc};

use quiz_core::model::{SessionMode, SessionSettings, TimeLimit};
use quiz_core::time::elapsed_secs;

/// Wall-clock-anchored countdown for timed sessions.
///
/// The remaining budget is recomputed from the anchor on every read instead
/// of decrementing a counter, so ticks cannot drift and a resumed session
/// picks up exactly where the persisted budget left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamTimer {
    total_secs: u32,
    started_at: DateTime<Utc>,
}

impl ExamTimer {
    /// Resolve the timer for a mode at session start.
    ///
    /// Returns `None` for untimed modes. The budget resolution order is:
    /// explicit per-mode limit, then the legacy global limit, then one minute
    /// per question. An explicit `TimeLimit::Untimed` never starts a clock.
    #[must_use]
    pub fn for_mode(
        mode: SessionMode,
        settings: &SessionSettings,
        question_count: usize,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if !mode.is_timed() {
            return None;
        }

        let total_secs = match settings.config_for(mode).time_limit() {
            Some(TimeLimit::Untimed) => return None,
            Some(TimeLimit::Seconds(secs)) => secs,
            None => settings.legacy_time_limit_secs().unwrap_or_else(|| {
                let count = u32::try_from(question_count).unwrap_or(u32::MAX);
                count.saturating_mul(60)
            }),
        };

        Some(Self {
            total_secs,
            started_at: now,
        })
    }

    /// Rebuild a timer from a persisted remaining budget.
    ///
    /// The remaining time becomes the new total, anchored at `now`; the
    /// original full duration is not restored.
    #[must_use]
    pub fn resume(remaining_secs: u32, now: DateTime<Utc>) -> Self {
        Self {
            total_secs: remaining_secs,
            started_at: now,
        }
    }

    #[must_use]
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Remaining whole seconds, floored at zero.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = elapsed_secs(self.started_at, now);
        u64::from(self.total_secs)
            .saturating_sub(elapsed)
            .try_into()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }
}
