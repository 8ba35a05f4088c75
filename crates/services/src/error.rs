//! Shared error types for the services crate.

use thiserror::Error;

use quest_core::model::{QuestionError, QuestionId};
use storage::repository::StorageError;

/// Errors emitted by the chat-completion client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiClientError {
    #[error("AI service returned an empty response")]
    EmptyResponse,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("AI response is not the expected JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors emitted by a `QuestionGenerator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("no question generator is configured")]
    Unavailable,
    #[error(transparent)]
    Client(#[from] AiClientError),
    #[error("generated question is invalid: {0}")]
    Invalid(#[from] QuestionError),
}

/// Errors emitted by an `AnswerValidator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("question has no reference answer to compare against")]
    NoReference,
    #[error(transparent)]
    Client(#[from] AiClientError),
}

/// Errors emitted while running a generation batch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BatchError {
    #[error("batch size must be between 1 and {max}, got {count}")]
    InvalidCount { count: u32, max: u32 },
    #[error("no seed template available for fallback")]
    NoFallbackSeed,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while submitting an answer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("answer is empty")]
    EmptyAnswer,
    #[error("question {0} is not in the pool")]
    NotFound(QuestionId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
