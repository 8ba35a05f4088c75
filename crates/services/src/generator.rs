use async_trait::async_trait;
use quest_core::Clock;
use quest_core::model::{
    CognitiveLevel, Difficulty, Grade, Question, QuestionDraft, QuestionId, QuestionType, Subject,
};
use serde::Deserialize;

use crate::ai::AiClient;
use crate::error::GenerationError;

/// Best-effort position of the learner, used to localize generated scenarios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationHint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything a generator needs to write one question.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub subject: Subject,
    pub grade: Grade,
    pub achievement: String,
    pub cognitive_level: CognitiveLevel,
    pub difficulty: Difficulty,
    pub kind: QuestionType,
    pub location: Option<LocationHint>,
}

impl GenerationRequest {
    /// Request with the batch runner's fixed profile:
    /// core standard, creative level, medium difficulty, exploration type.
    #[must_use]
    pub fn default_profile(subject: Subject, grade: Grade, location: Option<LocationHint>) -> Self {
        Self {
            subject,
            grade,
            achievement: "핵심 성취기준".to_string(),
            cognitive_level: CognitiveLevel::Creation,
            difficulty: Difficulty::Medium,
            kind: QuestionType::Exploration,
            location,
        }
    }
}

/// External capability that writes a new question.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError` on transport or format failures; callers fall back locally.
    async fn generate(&self, request: &GenerationRequest) -> Result<Question, GenerationError>;
}

/// Generator used when no remote service is configured. Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGenerator;

#[async_trait]
impl QuestionGenerator for UnavailableGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<Question, GenerationError> {
        Err(GenerationError::Unavailable)
    }
}

/// Generator backed by a chat-completions endpoint.
#[derive(Clone)]
pub struct ChatQuestionGenerator {
    client: AiClient,
    clock: Clock,
}

impl ChatQuestionGenerator {
    #[must_use]
    pub fn new(client: AiClient) -> Self {
        Self {
            client,
            clock: Clock::system(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    question_text: String,
    answer_key: Option<String>,
    explanation: Option<String>,
}

fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Write one question for a Korean elementary school grade {grade} {subject} class, \
         in Korean, based on the achievement standard [{achievement}].\n\
         Cognitive level: {level}. Difficulty: {difficulty}. Question type: {kind}.\n",
        grade = request.grade,
        subject = request.subject,
        achievement = request.achievement,
        level = request.cognitive_level,
        difficulty = request.difficulty,
        kind = request.kind,
    );
    if let Some(loc) = request.location {
        prompt.push_str(&format!(
            "Use places near latitude {:.4}, longitude {:.4} as the setting.\n",
            loc.latitude, loc.longitude
        ));
    }
    prompt.push_str(
        "Reply with a JSON object with string fields \"question_text\", \"answer_key\" (short) \
         and \"explanation\".",
    );
    prompt
}

#[async_trait]
impl QuestionGenerator for ChatQuestionGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Question, GenerationError> {
        let generated: GeneratedQuestion = self.client.complete_json(&build_prompt(request)).await?;

        let question = QuestionDraft {
            subject: request.subject,
            grade: request.grade,
            achievement: request.achievement.clone(),
            cognitive_level: request.cognitive_level,
            difficulty: request.difficulty,
            kind: request.kind,
            text: generated.question_text,
            explanation: generated.explanation,
            answer_key: generated.answer_key,
        }
        .validate(QuestionId::generate(), self.clock.now())?;
        Ok(question)
    }
}
