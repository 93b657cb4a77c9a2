use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{AnswerId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("answer text cannot be empty")]
    EmptyAnswerText,

    #[error("question must offer at least one answer option")]
    NoAnswers,

    #[error("duplicate answer id within question: {0}")]
    DuplicateAnswerId(AnswerId),
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// One answer option of a question.
///
/// Exactly one answer per question is expected to carry `is_correct = true`.
/// That invariant is a contract of the content source; the engine scores
/// against the first correct answer it finds and does not enforce the count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    id: AnswerId,
    text: String,
    is_correct: bool,
}

impl Answer {
    /// Creates an answer option.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyAnswerText` when the text is blank.
    pub fn new(id: AnswerId, text: impl Into<String>, is_correct: bool) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyAnswerText);
        }
        Ok(Self {
            id,
            text,
            is_correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> AnswerId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single pool question with its ordered answer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    answers: Vec<Answer>,
    explanation: Option<String>,
}

impl Question {
    /// Creates a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` for a blank prompt,
    /// `QuestionError::NoAnswers` when no options are given, and
    /// `QuestionError::DuplicateAnswerId` when option ids collide.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        answers: Vec<Answer>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if answers.is_empty() {
            return Err(QuestionError::NoAnswers);
        }
        let mut seen = HashSet::new();
        for answer in &answers {
            if !seen.insert(answer.id()) {
                return Err(QuestionError::DuplicateAnswerId(answer.id()));
            }
        }

        Ok(Self {
            id,
            prompt,
            answers,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Answer options in authored order.
    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Looks up an option by id.
    #[must_use]
    pub fn answer(&self, id: AnswerId) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id() == id)
    }

    /// First option flagged correct, if the content carries one.
    #[must_use]
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_correct())
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
