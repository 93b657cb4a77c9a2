use quiz_core::model::{Answer, Question, SessionScope};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{answer_id_from_i64, question_id_from_i64, ser};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn fetch_pool(&self, scope: &SessionScope) -> Result<Vec<Question>, StorageError> {
        let question_rows = sqlx::query(
            r"
                SELECT id, prompt, explanation
                FROM questions
                WHERE scope = ?1
                ORDER BY id ASC
            ",
        )
        .bind(scope.base())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut pool = Vec::with_capacity(question_rows.len());
        for row in question_rows {
            let raw_id: i64 = row.try_get("id").map_err(ser)?;
            let id = question_id_from_i64(raw_id)?;
            let prompt: String = row.try_get("prompt").map_err(ser)?;
            let explanation: Option<String> = row.try_get("explanation").map_err(ser)?;

            let answer_rows = sqlx::query(
                r"
                    SELECT id, text, is_correct
                    FROM answers
                    WHERE question_id = ?1
                    ORDER BY position ASC
                ",
            )
            .bind(raw_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            let mut answers = Vec::with_capacity(answer_rows.len());
            for answer_row in answer_rows {
                let answer_id = answer_id_from_i64(answer_row.try_get::<i64, _>("id").map_err(ser)?)?;
                let text: String = answer_row.try_get("text").map_err(ser)?;
                let is_correct: i64 = answer_row.try_get("is_correct").map_err(ser)?;
                answers.push(Answer::new(answer_id, text, is_correct != 0).map_err(ser)?);
            }

            pool.push(Question::new(id, prompt, answers, explanation).map_err(ser)?);
        }

        Ok(pool)
    }
}

impl SqliteRepository {
    /// Insert a question and its options, for seeding and tests.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    pub async fn insert_question(
        &self,
        scope: &SessionScope,
        question: &Question,
    ) -> Result<(), StorageError> {
        let question_id = super::mapping::id_i64("question_id", question.id().value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
                INSERT INTO questions (id, scope, prompt, explanation)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(question_id)
        .bind(scope.base())
        .bind(question.prompt())
        .bind(question.explanation())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, answer) in question.answers().iter().enumerate() {
            let answer_id = super::mapping::id_i64("answer_id", answer.id().value())?;
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO answers (id, question_id, position, text, is_correct)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(answer_id)
            .bind(question_id)
            .bind(position)
            .bind(answer.text())
            .bind(i64::from(answer.is_correct()))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}
