use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use quiz_core::model::{Answer, AnswerId, Question, QuestionId, SessionScope};
use storage::repository::{QuestionRepository, StorageError};

/// Remote question pool endpoint configuration.
#[derive(Clone, Debug)]
pub struct HttpPoolConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
}

impl HttpPoolConfig {
    /// Read the endpoint from the environment, if configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_POOL_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let bearer_token = env::var("QUIZ_POOL_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Some(Self {
            base_url,
            bearer_token,
        })
    }
}

/// `QuestionRepository` over an HTTP question API.
///
/// A 401/403 response maps to `StorageError::Unauthorized` so the engine can
/// surface the sign-in remedy instead of a generic load failure.
#[derive(Clone)]
pub struct HttpQuestionSource {
    client: Client,
    config: HttpPoolConfig,
}

impl HttpQuestionSource {
    #[must_use]
    pub fn new(config: HttpPoolConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build a source from the environment, when an endpoint is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        HttpPoolConfig::from_env().map(Self::new)
    }
}

#[async_trait]
impl QuestionRepository for HttpQuestionSource {
    async fn fetch_pool(&self, scope: &SessionScope) -> Result<Vec<Question>, StorageError> {
        let url = format!(
            "{}/pools/{}",
            self.config.base_url.trim_end_matches('/'),
            scope.base()
        );

        let mut request = self.client.get(url);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(StorageError::Unauthorized);
            }
            status if !status.is_success() => {
                return Err(StorageError::Connection(format!(
                    "pool fetch failed with status {status}"
                )));
            }
            _ => {}
        }

        let body: Vec<QuestionDto> = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        body.into_iter().map(QuestionDto::into_question).collect()
    }
}

#[derive(Debug, Deserialize)]
struct QuestionDto {
    id: u64,
    prompt: String,
    #[serde(default)]
    explanation: Option<String>,
    answers: Vec<AnswerDto>,
}

#[derive(Debug, Deserialize)]
struct AnswerDto {
    id: u64,
    text: String,
    #[serde(default)]
    correct: bool,
}

impl QuestionDto {
    fn into_question(self) -> Result<Question, StorageError> {
        let mut answers = Vec::with_capacity(self.answers.len());
        for answer in self.answers {
            answers.push(
                Answer::new(AnswerId::new(answer.id), answer.text, answer.correct)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            );
        }
        Question::new(
            QuestionId::new(self.id),
            self.prompt,
            answers,
            self.explanation,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dto_converts_to_domain_question() {
        let json = r#"
            {
                "id": 7,
                "prompt": "Which layer routes packets?",
                "explanation": "Layer 3 handles routing.",
                "answers": [
                    {"id": 1, "text": "Network", "correct": true},
                    {"id": 2, "text": "Transport"}
                ]
            }
        "#;

        let dto: QuestionDto = serde_json::from_str(json).unwrap();
        let question = dto.into_question().unwrap();
        assert_eq!(question.id(), QuestionId::new(7));
        assert_eq!(question.answers().len(), 2);
        assert!(question.answers()[0].is_correct());
        assert!(!question.answers()[1].is_correct());
        assert_eq!(question.explanation(), Some("Layer 3 handles routing."));
    }

    #[test]
    fn invalid_dto_surfaces_serialization_error() {
        let dto = QuestionDto {
            id: 1,
            prompt: "  ".to_string(),
            explanation: None,
            answers: vec![AnswerDto {
                id: 1,
                text: "ok".to_string(),
                correct: true,
            }],
        };
        assert!(matches!(
            dto.into_question(),
            Err(StorageError::Serialization(_))
        ));
    }
}
