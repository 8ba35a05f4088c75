use crate::model::UserStats;

/// Game-design constants for XP and leveling.
///
/// Defaults: a correct answer earns `50 + 10 * streak` (the streak already
/// counting this answer), a wrong one earns a flat 10, and every 500 XP is a
/// level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardRules {
    pub correct_base_xp: u32,
    pub streak_bonus_xp: u32,
    pub incorrect_xp: u32,
    pub exp_per_level: u32,
}

impl Default for RewardRules {
    fn default() -> Self {
        Self {
            correct_base_xp: 50,
            streak_bonus_xp: 10,
            incorrect_xp: 10,
            exp_per_level: 500,
        }
    }
}

impl RewardRules {
    /// XP earned for one answer, given the streak after that answer.
    #[must_use]
    pub fn xp_for(&self, is_correct: bool, new_streak: u32) -> u64 {
        if is_correct {
            u64::from(self.correct_base_xp)
                .saturating_add(u64::from(self.streak_bonus_xp) * u64::from(new_streak))
        } else {
            u64::from(self.incorrect_xp)
        }
    }

    /// Level reached at `exp`. Level 1 starts at zero XP.
    #[must_use]
    pub fn level_for(&self, exp: u64) -> u32 {
        let per_level = u64::from(self.exp_per_level.max(1));
        u32::try_from(exp / per_level)
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1)
    }

    /// XP gathered inside the current level and the size of a level.
    #[must_use]
    pub fn level_progress(&self, stats: &UserStats) -> (u64, u64) {
        let per_level = u64::from(self.exp_per_level.max(1));
        (stats.exp % per_level, per_level)
    }

    /// Fold one answer into `stats`, returning the updated stats.
    #[must_use]
    pub fn apply_answer(&self, stats: &UserStats, is_correct: bool) -> UserStats {
        let streak = if is_correct {
            stats.streak.saturating_add(1)
        } else {
            0
        };
        let xp = self.xp_for(is_correct, streak);
        let exp = stats.exp.saturating_add(xp);

        UserStats {
            score: stats.score.saturating_add(xp),
            correct_count: stats.correct_count.saturating_add(u32::from(is_correct)),
            total_attempted: stats.total_attempted.saturating_add(1),
            streak,
            max_streak: stats.max_streak.max(streak),
            exp,
            level: self.level_for(exp),
        }
    }
}

/// `RewardRules::apply_answer` with the default rules.
#[must_use]
pub fn apply_answer(stats: &UserStats, is_correct: bool) -> UserStats {
    RewardRules::default().apply_answer(stats, is_correct)
}
