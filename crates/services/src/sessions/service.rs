use std::sync::Arc;

use quest_core::RewardRules;
use quest_core::model::{Question, QuestionId, UserStats};
use storage::{KeyValueStore, PoolSettings, QuestionPoolStore, StatsStore};
use tracing::warn;

use super::batch::{BatchRequest, BatchRunner};
use super::progress::BatchProgress;
use super::submission::{self, SubmitOutcome};
use crate::error::{BatchError, SubmitError};
use crate::validator::AnswerValidator;

/// Tunables for a quiz session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub rewards: RewardRules,
    pub pool: PoolSettings,
}

/// One learner's quiz session: the question pool, their stats, and the two
/// mutation entry points (`generate` and `submit_answer`).
///
/// Both entry points take `&mut self`, so a batch and a submission can never
/// overlap. Hosts that share a session across tasks wrap it in an async mutex
/// and treat a failed `try_lock` as "busy".
pub struct QuestSession {
    pool: QuestionPoolStore,
    stats: UserStats,
    stats_store: StatsStore,
    rules: RewardRules,
    batch: BatchRunner,
    validator: Arc<dyn AnswerValidator>,
}

impl QuestSession {
    /// Open a session over `kv`, loading any persisted pool and stats.
    pub async fn open(
        kv: Arc<dyn KeyValueStore>,
        batch: BatchRunner,
        validator: Arc<dyn AnswerValidator>,
        settings: SessionSettings,
    ) -> Self {
        let mut pool = QuestionPoolStore::with_settings(Arc::clone(&kv), settings.pool);
        pool.load().await;
        let stats_store = StatsStore::new(kv).with_rules(settings.rewards);
        let stats = stats_store.load().await;

        Self {
            pool,
            stats,
            stats_store,
            rules: settings.rewards,
            batch,
            validator,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.pool.questions()
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.pool.get(id)
    }

    #[must_use]
    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    #[must_use]
    pub fn rules(&self) -> &RewardRules {
        &self.rules
    }

    /// Run a generation batch into the pool.
    ///
    /// # Errors
    ///
    /// See `BatchRunner::run`.
    pub async fn generate<F>(
        &mut self,
        request: &BatchRequest,
        on_progress: F,
    ) -> Result<Vec<Question>, BatchError>
    where
        F: FnMut(BatchProgress),
    {
        self.batch.run(request, &mut self.pool, on_progress).await
    }

    /// Submit a free-text answer for a pending question.
    ///
    /// Stats are persisted best-effort after a graded answer; a failed stats
    /// write is logged and does not undo the transition.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::EmptyAnswer` for blank input, `SubmitError::NotFound`
    /// for an unknown id, and `SubmitError::Storage` if the pool cannot be written.
    pub async fn submit_answer(
        &mut self,
        id: &QuestionId,
        answer: &str,
    ) -> Result<SubmitOutcome, SubmitError> {
        let outcome = submission::submit(
            &mut self.pool,
            self.validator.as_ref(),
            &self.rules,
            &mut self.stats,
            id,
            answer,
        )
        .await?;

        if matches!(outcome, SubmitOutcome::Graded { .. }) {
            if let Err(err) = self.stats_store.save(&self.stats).await {
                warn!(error = %err, "failed to persist stats");
            }
        }
        Ok(outcome)
    }
}
