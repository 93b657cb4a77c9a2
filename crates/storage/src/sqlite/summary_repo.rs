use quiz_core::model::{AnswerId, QuestionId, SessionScope, SessionSummary};
use sqlx::Row;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::SqliteRepository;
use super::mapping::{mode_from_str, ser, u32_from_i64};
use crate::repository::{StorageError, SummaryRepository};

fn answers_to_json(answers: &BTreeMap<QuestionId, AnswerId>) -> Result<String, StorageError> {
    let pairs: BTreeMap<u64, u64> = answers
        .iter()
        .map(|(q, a)| (q.value(), a.value()))
        .collect();
    serde_json::to_string(&pairs).map_err(ser)
}

fn answers_from_json(raw: &str) -> Result<BTreeMap<QuestionId, AnswerId>, StorageError> {
    let pairs: BTreeMap<u64, u64> = serde_json::from_str(raw).map_err(ser)?;
    let mut seen = BTreeMap::new();
    for (q, a) in pairs {
        seen.insert(QuestionId::new(q), AnswerId::new(a));
    }
    Ok(seen)
}

fn map_summary_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionSummary, StorageError> {
    let attempt_raw: String = row.try_get("attempt_id").map_err(ser)?;
    let attempt_id = Uuid::parse_str(&attempt_raw).map_err(ser)?;
    let mode_raw: String = row.try_get("mode").map_err(ser)?;
    let mode = mode_from_str(&mode_raw)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let answers_raw: String = row.try_get("answers").map_err(ser)?;
    let answers = answers_from_json(&answers_raw)?;
    let time_expired: i64 = row.try_get("time_expired").map_err(ser)?;

    SessionSummary::from_persisted(
        attempt_id,
        mode,
        started_at,
        completed_at,
        total,
        correct,
        answers,
        time_expired != 0,
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl SummaryRepository for SqliteRepository {
    async fn append_summary(
        &self,
        scope: &SessionScope,
        summary: &SessionSummary,
    ) -> Result<i64, StorageError> {
        let answers = answers_to_json(summary.answers())?;

        let res = sqlx::query(
            r"
                INSERT INTO attempt_summaries (
                    attempt_id, scope, mode, started_at, completed_at,
                    total, correct, answers, time_expired
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(summary.attempt_id().to_string())
        .bind(scope.base())
        .bind(summary.mode().as_str())
        .bind(summary.started_at())
        .bind(summary.completed_at())
        .bind(i64::from(summary.total()))
        .bind(i64::from(summary.correct()))
        .bind(answers)
        .bind(i64::from(summary.time_expired()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn list_summaries(
        &self,
        scope: &SessionScope,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    attempt_id, mode, started_at, completed_at,
                    total, correct, answers, time_expired
                FROM attempt_summaries
                WHERE scope = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(scope.base())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_summary_row(&row)?);
        }

        Ok(out)
    }
}
