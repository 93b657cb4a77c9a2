use rand::SeedableRng;
use rand::rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, SessionMode, SessionSettings};

use crate::error::SessionError;

/// How the builder orders drawn questions.
///
/// Production sessions shuffle with a thread-local generator; tests and
/// reproducible drills can pin a seed instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shuffle {
    #[default]
    Random,
    Seeded(u64),
}

impl Shuffle {
    fn apply(self, questions: &mut [Question]) {
        match self {
            Shuffle::Random => {
                let mut rng = rng();
                questions.shuffle(&mut rng);
            }
            Shuffle::Seeded(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                questions.shuffle(&mut rng);
            }
        }
    }
}

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
}

impl SessionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Draws the active question set for one session: a shuffled copy of the
/// pool, capped by the mode's question limit.
pub struct SessionBuilder<'a> {
    settings: &'a SessionSettings,
    shuffle: Shuffle,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(settings: &'a SessionSettings) -> Self {
        Self {
            settings,
            shuffle: Shuffle::default(),
        }
    }

    /// Override the shuffle strategy.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: Shuffle) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build a plan from the fetched pool.
    ///
    /// The pool itself is never reordered or truncated; it may be reused
    /// across mode switches. Shuffling happens exactly once per build.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if no questions are provided.
    pub fn build(&self, pool: &[Question], mode: SessionMode) -> Result<SessionPlan, SessionError> {
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let cap = self
            .settings
            .config_for(mode)
            .question_limit()
            .map_or(pool.len(), |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        let mut drawn = pool.to_vec();
        self.shuffle.apply(&mut drawn);
        drawn.truncate(cap.min(pool.len()));

        Ok(SessionPlan { questions: drawn })
    }
}
