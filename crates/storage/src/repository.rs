use async_trait::async_trait;
use quiz_core::model::{ProgressSnapshot, Question, SessionScope, SessionSummary};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// The backing source refused the request for lack of a valid session.
    /// Surfaced distinctly because the user-facing remedy (sign in) differs
    /// from a generic load failure.
    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Supplies the question pool for a scope.
///
/// One fetch per session start; the engine never retries internally. An empty
/// pool is a valid result, not a storage error.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch every question available for the scope.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unauthorized` when the source requires a signed-in
    /// user, or other storage errors.
    async fn fetch_pool(&self, scope: &SessionScope) -> Result<Vec<Question>, StorageError>;
}

/// Keeps one resumable progress snapshot per opaque scope key.
///
/// Last-write-wins; saves are frequent and fire-and-forget from the engine's
/// point of view.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot for a key, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing snapshot is `Ok(None)`.
    async fn load(&self, key: &str) -> Result<Option<ProgressSnapshot>, StorageError>;

    /// Persist (overwrite) the snapshot for a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save(&self, key: &str, snapshot: &ProgressSnapshot) -> Result<(), StorageError>;

    /// Remove the snapshot for a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn clear(&self, key: &str) -> Result<(), StorageError>;
}

/// Records finished-session summaries per scope.
#[async_trait]
pub trait SummaryRepository: Send + Sync {
    /// Append a finished summary, returning its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(
        &self,
        scope: &SessionScope,
        summary: &SessionSummary,
    ) -> Result<i64, StorageError>;

    /// Most recent summaries for a scope, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_summaries(
        &self,
        scope: &SessionScope,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    pools: Arc<Mutex<HashMap<String, Vec<Question>>>>,
    snapshots: Arc<Mutex<HashMap<String, ProgressSnapshot>>>,
    summaries: Arc<Mutex<HashMap<String, Vec<SessionSummary>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the pool served for a scope.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing lock is poisoned.
    pub fn seed_questions(
        &self,
        scope: &SessionScope,
        questions: Vec<Question>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .pools
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(scope.base().to_string(), questions);
        Ok(())
    }

    /// Snapshot currently stored for a key, for test assertions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing lock is poisoned.
    pub fn snapshot_for(&self, key: &str) -> Result<Option<ProgressSnapshot>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn fetch_pool(&self, scope: &SessionScope) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .pools
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(scope.base()).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryRepository {
    async fn load(&self, key: &str) -> Result<Option<ProgressSnapshot>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn save(&self, key: &str, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

#[async_trait]
impl SummaryRepository for InMemoryRepository {
    async fn append_summary(
        &self,
        scope: &SessionScope,
        summary: &SessionSummary,
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let rows = guard.entry(scope.base().to_string()).or_default();
        rows.push(summary.clone());
        Ok(i64::try_from(rows.len()).unwrap_or(i64::MAX))
    }

    async fn list_summaries(
        &self,
        scope: &SessionScope,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, StorageError> {
        let guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let rows = guard.get(scope.base()).cloned().unwrap_or_default();
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(rows.into_iter().rev().take(limit).collect())
    }
}

/// Aggregates the persistence contracts behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub summaries: Arc<dyn SummaryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let snapshots: Arc<dyn SnapshotStore> = Arc::new(repo.clone());
        let summaries: Arc<dyn SummaryRepository> = Arc::new(repo);
        Self {
            questions,
            snapshots,
            summaries,
        }
    }
}
