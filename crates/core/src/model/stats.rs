use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("correct count ({correct}) exceeds attempts ({attempted})")]
    CorrectExceedsAttempts { correct: u32, attempted: u32 },

    #[error("streak ({streak}) exceeds max streak ({max_streak})")]
    StreakExceedsMax { streak: u32, max_streak: u32 },

    #[error("level must be at least 1")]
    ZeroLevel,
}

/// Badge shown on the stats board, earned by accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Rookie,
    Elite,
    Master,
}

impl Rank {
    /// Above 80% is Master, above 50% is Elite.
    #[must_use]
    pub fn for_accuracy(percent: u32) -> Self {
        match percent {
            81.. => Rank::Master,
            51..=80 => Rank::Elite,
            _ => Rank::Rookie,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rank::Rookie => "Rookie",
            Rank::Elite => "Elite",
            Rank::Master => "Master",
        })
    }
}

/// Cumulative progress of a learner within a session.
///
/// Only `RewardRules::apply_answer` produces new values; everything else is
/// read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub(crate) score: u64,
    pub(crate) correct_count: u32,
    pub(crate) total_attempted: u32,
    pub(crate) streak: u32,
    pub(crate) max_streak: u32,
    pub(crate) exp: u64,
    pub(crate) level: u32,
}

impl Default for UserStats {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStats {
    /// Fresh stats: everything zero, level 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            score: 0,
            correct_count: 0,
            total_attempted: 0,
            streak: 0,
            max_streak: 0,
            exp: 0,
            level: 1,
        }
    }

    /// Rehydrate stats from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` when the counters contradict each other.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        score: u64,
        correct_count: u32,
        total_attempted: u32,
        streak: u32,
        max_streak: u32,
        exp: u64,
        level: u32,
    ) -> Result<Self, StatsError> {
        if correct_count > total_attempted {
            return Err(StatsError::CorrectExceedsAttempts {
                correct: correct_count,
                attempted: total_attempted,
            });
        }
        if streak > max_streak {
            return Err(StatsError::StreakExceedsMax { streak, max_streak });
        }
        if level == 0 {
            return Err(StatsError::ZeroLevel);
        }

        Ok(Self {
            score,
            correct_count,
            total_attempted,
            streak,
            max_streak,
            exp,
            level,
        })
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_attempted(&self) -> u32 {
        self.total_attempted
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    #[must_use]
    pub fn exp(&self) -> u64 {
        self.exp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Share of correct answers, rounded to a whole percent. Zero before any attempt.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        if self.total_attempted == 0 {
            return 0;
        }
        let correct = u64::from(self.correct_count) * 100;
        let total = u64::from(self.total_attempted);
        // correct <= total, so the quotient is at most 100.
        u32::try_from((correct + total / 2) / total).unwrap_or(100)
    }

    #[must_use]
    pub fn rank(&self) -> Rank {
        Rank::for_accuracy(self.accuracy_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stats_start_at_level_one() {
        let stats = UserStats::new();
        assert_eq!(stats.level(), 1);
        assert_eq!(stats.exp(), 0);
        assert_eq!(stats.accuracy_percent(), 0);
    }

    #[test]
    fn persisted_stats_are_checked() {
        assert_eq!(
            UserStats::from_persisted(0, 3, 2, 0, 0, 0, 1).unwrap_err(),
            StatsError::CorrectExceedsAttempts {
                correct: 3,
                attempted: 2
            }
        );
        assert!(matches!(
            UserStats::from_persisted(0, 1, 1, 2, 1, 0, 1),
            Err(StatsError::StreakExceedsMax { .. })
        ));
        assert_eq!(
            UserStats::from_persisted(0, 0, 0, 0, 0, 0, 0).unwrap_err(),
            StatsError::ZeroLevel
        );
    }

    #[test]
    fn accuracy_rounds_half_up() {
        let stats = UserStats::from_persisted(0, 2, 3, 0, 2, 0, 1).unwrap();
        assert_eq!(stats.accuracy_percent(), 67);
        let stats = UserStats::from_persisted(0, 1, 8, 0, 1, 0, 1).unwrap();
        assert_eq!(stats.accuracy_percent(), 13);
    }

    #[test]
    fn rank_thresholds_are_exclusive() {
        assert_eq!(Rank::for_accuracy(0), Rank::Rookie);
        assert_eq!(Rank::for_accuracy(50), Rank::Rookie);
        assert_eq!(Rank::for_accuracy(51), Rank::Elite);
        assert_eq!(Rank::for_accuracy(80), Rank::Elite);
        assert_eq!(Rank::for_accuracy(81), Rank::Master);
        assert_eq!(Rank::for_accuracy(100), Rank::Master);
    }

    #[test]
    fn rank_follows_accuracy() {
        assert_eq!(UserStats::new().rank(), Rank::Rookie);
        let stats = UserStats::from_persisted(0, 2, 3, 0, 2, 0, 1).unwrap();
        assert_eq!(stats.rank(), Rank::Elite);
        let stats = UserStats::from_persisted(0, 9, 10, 0, 9, 0, 1).unwrap();
        assert_eq!(stats.rank(), Rank::Master);
        assert_eq!(stats.rank().to_string(), "Master");
    }
}
