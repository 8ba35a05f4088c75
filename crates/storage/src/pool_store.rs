use std::collections::HashSet;
use std::sync::Arc;

use quest_core::model::{Question, QuestionId};
use tracing::{debug, warn};

use crate::repository::{KeyValueStore, StorageError};

/// Storage key of the persisted pool.
pub const POOL_KEY: &str = "edu_quest_pool_v2";

/// Maximum number of questions kept in the pool.
pub const POOL_CAPACITY: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub key: String,
    pub capacity: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            key: POOL_KEY.to_string(),
            capacity: POOL_CAPACITY,
        }
    }
}

/// Put `question` at the front of `pool` and evict the oldest entries beyond `capacity`.
///
/// An older entry with the same id is dropped so ids stay unique.
pub fn prepend_capped(pool: &mut Vec<Question>, question: Question, capacity: usize) {
    pool.retain(|q| q.id() != question.id());
    pool.insert(0, question);
    pool.truncate(capacity);
}

/// Newest-first, capacity-bounded cache of generated questions.
///
/// Owns the in-memory snapshot; every mutation is persisted before the
/// snapshot is updated, so memory never runs ahead of storage.
pub struct QuestionPoolStore {
    kv: Arc<dyn KeyValueStore>,
    settings: PoolSettings,
    pool: Vec<Question>,
}

impl QuestionPoolStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_settings(kv, PoolSettings::default())
    }

    #[must_use]
    pub fn with_settings(kv: Arc<dyn KeyValueStore>, settings: PoolSettings) -> Self {
        Self {
            kv,
            settings,
            pool: Vec::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Read the persisted pool into memory.
    ///
    /// Missing, unreadable or corrupt data yields an empty pool; nothing is raised.
    pub async fn load(&mut self) -> &[Question] {
        let raw = match self.kv.get(&self.settings.key).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %self.settings.key, error = %err, "pool read failed; starting empty");
                None
            }
        };

        self.pool = match raw {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<Question>>(&raw) {
                Ok(questions) => self.sanitize(questions),
                Err(err) => {
                    warn!(key = %self.settings.key, error = %err, "persisted pool is corrupt; starting empty");
                    Vec::new()
                }
            },
        };
        debug!(len = self.pool.len(), "question pool loaded");
        &self.pool
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.pool
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.pool.iter().find(|q| q.id() == id)
    }

    /// Prepend `question`, trim to capacity, persist and return the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pool cannot be written; the snapshot is
    /// left unchanged in that case.
    pub async fn append(&mut self, question: Question) -> Result<&[Question], StorageError> {
        let mut next = self.pool.clone();
        prepend_capped(&mut next, question, self.settings.capacity);
        self.persist(&next).await?;
        self.pool = next;
        Ok(&self.pool)
    }

    /// Overwrite the stored copy of a question in place, keeping its position.
    ///
    /// Returns `false` when no question with that id is in the pool.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pool cannot be written.
    pub async fn replace(&mut self, question: Question) -> Result<bool, StorageError> {
        let Some(index) = self.pool.iter().position(|q| q.id() == question.id()) else {
            return Ok(false);
        };
        let mut next = self.pool.clone();
        next[index] = question;
        self.persist(&next).await?;
        self.pool = next;
        Ok(true)
    }

    async fn persist(&self, pool: &[Question]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(pool)?;
        self.kv.set(&self.settings.key, &raw).await
    }

    fn sanitize(&self, questions: Vec<Question>) -> Vec<Question> {
        let mut seen = HashSet::new();
        let mut pool: Vec<Question> = questions
            .into_iter()
            .filter(|q| seen.insert(q.id().clone()))
            .collect();
        pool.truncate(self.settings.capacity);
        pool
    }
}
