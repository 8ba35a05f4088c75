use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::model::{Question, QuestionId};

/// Perspective-shifting phrases appended to a seed's text.
pub const VARIATION_PHRASES: [&str; 3] = [
    " 만약 주인공이 다른 선택을 했다면?",
    " 이 현상이 겨울에 일어난다면 어떻게 변할까?",
    " 숫자를 2배로 늘렸을 때 결과의 변화는?",
];

/// Derives divergent variants from seed templates.
///
/// All randomness (seed choice, phrase choice, id bytes) flows through one
/// RNG so a seeded synthesizer is fully reproducible.
#[derive(Debug, Clone)]
pub struct VariantSynthesizer {
    rng: StdRng,
}

impl Default for VariantSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantSynthesizer {
    /// Synthesizer backed by OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic synthesizer for tests and replays.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Pick one seed uniformly. `None` when `seeds` is empty.
    pub fn pick_seed<'a>(&mut self, seeds: &[&'a Question]) -> Option<&'a Question> {
        seeds.choose(&mut self.rng).copied()
    }

    pub fn next_id(&mut self) -> QuestionId {
        let mut bytes = [0_u8; 16];
        self.rng.fill(&mut bytes);
        QuestionId::from_random_bytes(bytes)
    }

    /// New pending question: the seed's text plus one variation phrase.
    pub fn synthesize(&mut self, seed: &Question, now: DateTime<Utc>) -> Question {
        let phrase = VARIATION_PHRASES[self.rng.random_range(0..VARIATION_PHRASES.len())];
        let id = self.next_id();
        seed.derive(id, format!("{}{phrase}", seed.text()), now)
    }
}
