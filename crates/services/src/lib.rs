#![forbid(unsafe_code)]

pub mod ai;
pub mod error;
pub mod generator;
pub mod sessions;
pub mod validator;

pub use quest_core::Clock;

pub use ai::{AiClient, AiConfig};
pub use error::{AiClientError, BatchError, GenerationError, SubmitError, ValidationError};
pub use generator::{
    ChatQuestionGenerator, GenerationRequest, LocationHint, QuestionGenerator,
    UnavailableGenerator,
};
pub use validator::{AnswerValidator, ChatAnswerValidator, HeuristicValidator};

pub use sessions::{
    BatchProgress, BatchRequest, BatchRunner, DEFAULT_PACING, MAX_BATCH_SIZE, QuestSession,
    SessionSettings, SubmitOutcome,
};
