mod ids;
mod question;
mod stats;

pub use ids::{ParseIdError, QuestionId};
pub use question::{
    CognitiveLevel, Difficulty, Grade, ParseEnumError, Question, QuestionDraft, QuestionError,
    QuestionStatus, QuestionType, Subject, Transition,
};
pub use stats::{Rank, StatsError, UserStats};
