use chrono::Utc;
use quiz_core::model::ProgressSnapshot;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::ser;
use crate::repository::{SnapshotStore, StorageError};

// Snapshot state lives in a single JSON payload column; fields missing from
// older payloads take their serde defaults on load.
#[async_trait::async_trait]
impl SnapshotStore for SqliteRepository {
    async fn load(&self, key: &str) -> Result<Option<ProgressSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT payload
                FROM snapshots
                WHERE scope_key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.try_get("payload").map_err(ser)?;
        let snapshot = serde_json::from_str(&payload).map_err(ser)?;
        Ok(Some(snapshot))
    }

    async fn save(&self, key: &str, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO snapshots (scope_key, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(scope_key) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
                DELETE FROM snapshots
                WHERE scope_key = ?1
            ",
        )
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
