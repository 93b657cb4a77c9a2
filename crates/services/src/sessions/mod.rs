mod plan;
mod progress;
mod queries;
mod session;
mod ticker;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPlan, Shuffle};
pub use progress::SessionProgress;
pub use session::{AnswerFeedback, QuizSession};
pub use ticker::{TickerHandle, drive_timer};
pub use timer::ExamTimer;
pub use view::{AttemptListItem, SummaryHistoryService};
pub use workflow::SessionCoordinator;
