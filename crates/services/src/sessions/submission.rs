use quest_core::model::{Question, QuestionId, QuestionStatus, UserStats};
use quest_core::RewardRules;
use storage::QuestionPoolStore;
use tracing::{info, warn};

use crate::error::SubmitError;
use crate::validator::AnswerValidator;

/// What happened to one answer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The question left `Pending`; stats were updated.
    Graded {
        question: Question,
        is_correct: bool,
        xp_gained: u64,
        stats: UserStats,
    },
    /// The question was already answered; nothing changed.
    AlreadyAnswered { status: QuestionStatus },
    /// The validator failed; the question stays pending and may be retried.
    ValidationFailed,
}

/// Validate `answer` for question `id`, then apply the transition and the reward.
///
/// The pool copy is persisted before `stats` is replaced, so a storage failure
/// leaves both untouched.
pub(crate) async fn submit(
    pool: &mut QuestionPoolStore,
    validator: &dyn AnswerValidator,
    rules: &RewardRules,
    stats: &mut UserStats,
    id: &QuestionId,
    answer: &str,
) -> Result<SubmitOutcome, SubmitError> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(SubmitError::EmptyAnswer);
    }

    let mut question = pool
        .get(id)
        .cloned()
        .ok_or_else(|| SubmitError::NotFound(id.clone()))?;
    if !question.is_pending() {
        info!(question = %id, status = ?question.status(), "ignoring submission to answered question");
        return Ok(SubmitOutcome::AlreadyAnswered {
            status: question.status(),
        });
    }

    let reference = question.answer_key().unwrap_or_default();
    let is_correct = match validator.validate(question.text(), reference, answer).await {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(question = %id, error = %err, "answer validation failed; question stays pending");
            return Ok(SubmitOutcome::ValidationFailed);
        }
    };

    let transition = question.apply_verdict(answer, is_correct);
    if !transition.is_applied() {
        return Ok(SubmitOutcome::AlreadyAnswered {
            status: question.status(),
        });
    }
    pool.replace(question.clone()).await?;

    let next = rules.apply_answer(stats, is_correct);
    let xp_gained = next.exp() - stats.exp();
    *stats = next;
    info!(question = %id, is_correct, xp_gained, level = stats.level(), "answer graded");

    Ok(SubmitOutcome::Graded {
        question,
        is_correct,
        xp_gained,
        stats: stats.clone(),
    })
}
