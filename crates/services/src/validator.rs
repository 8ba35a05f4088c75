use async_trait::async_trait;
use serde::Deserialize;

use crate::ai::AiClient;
use crate::error::ValidationError;

/// External capability that judges a free-text answer.
#[async_trait]
pub trait AnswerValidator: Send + Sync {
    /// Whether `user_answer` is essentially correct.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when no verdict can be reached; the question
    /// then stays pending.
    async fn validate(
        &self,
        question_text: &str,
        reference_answer: &str,
        user_answer: &str,
    ) -> Result<bool, ValidationError>;
}

/// Offline validator comparing normalized text against the reference answer.
///
/// Accepts an answer that contains the reference, or a prefix of the
/// reference covering at least half of it (so "12" matches "12개").
///
/// When the question enumerates choices ("예각, 직각, 둔각 중"), an answer that
/// also names a wrong choice is rejected. It cannot judge free-form
/// reasoning; use the chat validator for that.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicValidator;

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized wrong choices from a comma-separated list in `question` that
/// includes `reference`. Empty when the question lists no such choices.
fn listed_distractors(question: &str, reference: &str) -> Vec<String> {
    let words: Vec<&str> = question.split_whitespace().collect();
    let mut listed: Vec<String> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let in_list = word.ends_with(',') || (i > 0 && words[i - 1].ends_with(','));
        let word = normalize(word);
        if in_list && !word.is_empty() && !listed.contains(&word) {
            listed.push(word);
        }
    }
    if !listed.iter().any(|w| w == reference) {
        return Vec::new();
    }
    listed.retain(|w| !w.contains(reference) && !reference.contains(w.as_str()));
    listed
}

#[async_trait]
impl AnswerValidator for HeuristicValidator {
    async fn validate(
        &self,
        question_text: &str,
        reference_answer: &str,
        user_answer: &str,
    ) -> Result<bool, ValidationError> {
        let reference = normalize(reference_answer);
        if reference.is_empty() {
            return Err(ValidationError::NoReference);
        }
        let answer = normalize(user_answer);
        if answer.is_empty() {
            return Ok(false);
        }
        let distractors = listed_distractors(question_text, &reference);
        if distractors.iter().any(|w| answer.contains(w.as_str())) {
            return Ok(false);
        }
        if answer.contains(&reference) {
            return Ok(true);
        }
        let covers_half = answer.chars().count() * 2 >= reference.chars().count();
        Ok(reference.starts_with(&answer) && covers_half)
    }
}

/// Validator backed by a chat-completions endpoint.
#[derive(Clone)]
pub struct ChatAnswerValidator {
    client: AiClient,
}

impl ChatAnswerValidator {
    #[must_use]
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct Verdict {
    #[serde(rename = "isCorrect")]
    is_correct: bool,
}

#[async_trait]
impl AnswerValidator for ChatAnswerValidator {
    async fn validate(
        &self,
        question_text: &str,
        reference_answer: &str,
        user_answer: &str,
    ) -> Result<bool, ValidationError> {
        let prompt = format!(
            "Question: {question_text}\nTarget Answer: {reference_answer}\n\
             User's Submission: {user_answer}\n\
             Is this essentially correct? Reply with a JSON object {{\"isCorrect\": boolean}} only."
        );
        let verdict: Verdict = self.client.complete_json(&prompt).await?;
        Ok(verdict.is_correct)
    }
}
