use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use quiz_core::model::SessionSummary;

use super::session::QuizSession;
use super::workflow::SessionCoordinator;
use crate::error::SessionError;

/// Liveness flag for the timer loop.
///
/// Cancel it on teardown so no tick can touch the session after the host
/// has moved on.
#[derive(Clone, Default)]
pub struct TickerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TickerHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Drive the exam clock until it expires, the session finishes, or the
/// handle is cancelled.
///
/// At most one such loop should run per session; it is the single repeating
/// callback of the timing design. Untimed sessions return immediately
/// without starting a clock. Returns the summary when the loop itself
/// auto-finished the session.
///
/// # Errors
///
/// Propagates finish-flow errors from the expiring tick.
pub async fn drive_timer(
    coordinator: &SessionCoordinator,
    session: &mut QuizSession,
    period: Duration,
    handle: &TickerHandle,
) -> Result<Option<SessionSummary>, SessionError> {
    if session.remaining_secs(coordinator.clock().now()).is_none() {
        return Ok(None);
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if handle.is_cancelled() || session.is_finished() {
            return Ok(None);
        }
        if let Some(summary) = coordinator.tick(session).await? {
            return Ok(Some(summary));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_cancels_once_and_stays_cancelled() {
        let handle = TickerHandle::new();
        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());

        let clone = handle.clone();
        assert!(clone.is_cancelled());
    }
}
