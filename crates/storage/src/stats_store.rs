use std::sync::Arc;

use quest_core::RewardRules;
use quest_core::model::{StatsError, UserStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::repository::{KeyValueStore, StorageError};

/// Storage key of the persisted learner stats.
pub const STATS_KEY: &str = "edu_quest_stats_v1";

/// Persisted shape of `UserStats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub score: u64,
    pub correct_count: u32,
    pub total_attempted: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub level: u32,
    pub exp: u64,
}

impl StatsRecord {
    #[must_use]
    pub fn from_stats(stats: &UserStats) -> Self {
        Self {
            score: stats.score(),
            correct_count: stats.correct_count(),
            total_attempted: stats.total_attempted(),
            streak: stats.streak(),
            max_streak: stats.max_streak(),
            level: stats.level(),
            exp: stats.exp(),
        }
    }

    /// Rebuild stats under `rules`. The stored level is ignored; it is derived from exp.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if the counters are inconsistent.
    pub fn into_stats(self, rules: &RewardRules) -> Result<UserStats, StatsError> {
        if self.level != rules.level_for(self.exp) {
            debug!(stored = self.level, exp = self.exp, "recomputing stale level");
        }
        UserStats::from_persisted(
            self.score,
            self.correct_count,
            self.total_attempted,
            self.streak,
            self.max_streak,
            self.exp,
            rules.level_for(self.exp),
        )
    }
}

/// Persists learner stats across sessions. Loading fails soft like the pool.
#[derive(Clone)]
pub struct StatsStore {
    kv: Arc<dyn KeyValueStore>,
    rules: RewardRules,
}

impl StatsStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            rules: RewardRules::default(),
        }
    }

    /// Derive loaded levels with `rules` instead of the defaults.
    #[must_use]
    pub fn with_rules(mut self, rules: RewardRules) -> Self {
        self.rules = rules;
        self
    }

    /// Stored stats, or fresh stats when missing or invalid.
    pub async fn load(&self) -> UserStats {
        let raw = match self.kv.get(STATS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return UserStats::new(),
            Err(err) => {
                warn!(error = %err, "stats read failed; starting fresh");
                return UserStats::new();
            }
        };

        let parsed = serde_json::from_str::<StatsRecord>(&raw)
            .map_err(|err| err.to_string())
            .and_then(|record| record.into_stats(&self.rules).map_err(|err| err.to_string()));
        match parsed {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "persisted stats are invalid; starting fresh");
                UserStats::new()
            }
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the stats cannot be written.
    pub async fn save(&self, stats: &UserStats) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&StatsRecord::from_stats(stats))?;
        self.kv.set(STATS_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryKeyValueStore;
    use quest_core::reward::apply_answer;

    #[tokio::test]
    async fn round_trips_stats() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let store = StatsStore::new(kv);
        let stats = apply_answer(&apply_answer(&UserStats::new(), true), true);

        store.save(&stats).await.unwrap();
        assert_eq!(store.load().await, stats);
    }

    #[tokio::test]
    async fn inconsistent_record_loads_fresh() {
        let raw = r#"{"score":0,"correctCount":5,"totalAttempted":1,"streak":0,"maxStreak":0,"level":1,"exp":0}"#;
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([(STATS_KEY, raw)]));
        assert_eq!(StatsStore::new(kv).load().await, UserStats::new());
    }

    #[tokio::test]
    async fn garbage_loads_fresh() {
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([(STATS_KEY, "[]")]));
        assert_eq!(StatsStore::new(kv).load().await, UserStats::new());
    }

    #[tokio::test]
    async fn stored_level_is_rederived_from_exp() {
        let raw = r#"{"score":0,"correctCount":0,"totalAttempted":0,"streak":0,"maxStreak":0,"level":9,"exp":0}"#;
        let kv = Arc::new(InMemoryKeyValueStore::with_entries([(STATS_KEY, raw)]));

        let stats = StatsStore::new(kv).load().await;

        assert_eq!(stats.level(), 1);
        assert_eq!(stats.level(), RewardRules::default().level_for(stats.exp()));
    }

    #[tokio::test]
    async fn level_follows_the_configured_rules() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let stats = apply_answer(&apply_answer(&UserStats::new(), true), true);
        assert_eq!((stats.exp(), stats.level()), (130, 1));
        StatsStore::new(kv.clone()).save(&stats).await.unwrap();

        let rules = RewardRules {
            exp_per_level: 50,
            ..RewardRules::default()
        };
        let loaded = StatsStore::new(kv).with_rules(rules).load().await;

        assert_eq!(loaded.exp(), 130);
        assert_eq!(loaded.level(), 3);
    }
}
