use std::sync::Arc;
use std::time::Duration;

use quest_core::model::{Grade, Question, Subject};
use quest_core::{Clock, SeedCatalog, VariantSynthesizer};
use storage::QuestionPoolStore;
use storage::pool_store::POOL_CAPACITY;
use tracing::{debug, info, warn};

use super::progress::BatchProgress;
use crate::error::BatchError;
use crate::generator::{GenerationRequest, LocationHint, QuestionGenerator};

/// Pause between batch items so incremental updates stay visible.
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

/// Largest batch accepted; anything bigger would only evict its own output.
pub const MAX_BATCH_SIZE: u32 = POOL_CAPACITY as u32;

/// A validated request for `count` new questions.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    subject: Subject,
    grade: Grade,
    count: u32,
    location: Option<LocationHint>,
}

impl BatchRequest {
    /// # Errors
    ///
    /// Returns `BatchError::InvalidCount` if `count` is zero or above `MAX_BATCH_SIZE`.
    pub fn new(subject: Subject, grade: Grade, count: u32) -> Result<Self, BatchError> {
        if count == 0 || count > MAX_BATCH_SIZE {
            return Err(BatchError::InvalidCount {
                count,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(Self {
            subject,
            grade,
            count,
            location: None,
        })
    }

    #[must_use]
    pub fn with_location(mut self, location: Option<LocationHint>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn location(&self) -> Option<LocationHint> {
        self.location
    }
}

/// Produces questions one at a time, preferring local seed variants and
/// falling back from remote generation to the default seed.
pub struct BatchRunner {
    generator: Arc<dyn QuestionGenerator>,
    seeds: SeedCatalog,
    synthesizer: VariantSynthesizer,
    clock: Clock,
    pacing: Duration,
}

impl BatchRunner {
    #[must_use]
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            generator,
            seeds: SeedCatalog::builtin(),
            synthesizer: VariantSynthesizer::new(),
            clock: Clock::system(),
            pacing: DEFAULT_PACING,
        }
    }

    #[must_use]
    pub fn with_seeds(mut self, seeds: SeedCatalog) -> Self {
        self.seeds = seeds;
        self
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: VariantSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Zero disables the delay entirely.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Produce `request.count()` questions in order, appending each to `pool`
    /// and reporting progress before moving on to the next.
    ///
    /// Returns the produced questions in generation order.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Storage` if the pool cannot be written and
    /// `BatchError::NoFallbackSeed` if generation failed with an empty catalog.
    /// Generator failures alone never end the batch.
    pub async fn run<F>(
        &mut self,
        request: &BatchRequest,
        pool: &mut QuestionPoolStore,
        mut on_progress: F,
    ) -> Result<Vec<Question>, BatchError>
    where
        F: FnMut(BatchProgress),
    {
        let total = request.count();
        info!(subject = %request.subject(), grade = %request.grade(), total, "batch started");

        let mut produced = Vec::with_capacity(total as usize);
        for completed in 1..=total {
            let question = self.next_question(request).await?;
            pool.append(question.clone()).await?;
            produced.push(question);
            on_progress(BatchProgress { completed, total });

            if completed < total && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        info!(total, pool_len = pool.len(), "batch finished");
        Ok(produced)
    }

    async fn next_question(&mut self, request: &BatchRequest) -> Result<Question, BatchError> {
        let now = self.clock.now();
        let local = self.seeds.matching(request.subject(), request.grade());
        if let Some(seed) = self.synthesizer.pick_seed(&local) {
            debug!(seed = %seed.id(), "synthesizing from local seed");
            return Ok(self.synthesizer.synthesize(seed, now));
        }

        let gen_request = GenerationRequest::default_profile(
            request.subject(),
            request.grade(),
            request.location(),
        );
        match self.generator.generate(&gen_request).await {
            Ok(question) => Ok(question),
            Err(err) => {
                warn!(error = %err, "question generation failed; using default seed");
                let seed = self.seeds.default_seed().ok_or(BatchError::NoFallbackSeed)?;
                Ok(self.synthesizer.synthesize(seed, now))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quest_core::model::{QuestionDraft, QuestionId};
    use quest_core::time::{fixed_clock, fixed_now};
    use quest_core::variant::VARIATION_PHRASES;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::{InMemoryKeyValueStore, KeyValueStore, StorageError};

    use crate::error::GenerationError;
    use crate::generator::UnavailableGenerator;

    /// Fails every other call, starting with the first.
    #[derive(Default)]
    struct FlakyGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuestionGenerator for FlakyGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<Question, GenerationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                return Err(GenerationError::Unavailable);
            }
            let question = QuestionDraft {
                subject: request.subject,
                grade: request.grade,
                achievement: request.achievement.clone(),
                cognitive_level: request.cognitive_level,
                difficulty: request.difficulty,
                kind: request.kind,
                text: format!("remote {n}"),
                explanation: None,
                answer_key: Some("remote".into()),
            }
            .validate(QuestionId::new(format!("remote-{n}")), fixed_now())?;
            Ok(question)
        }
    }

    /// Records the location hint of every request, then fails.
    #[derive(Default)]
    struct RecordingGenerator {
        locations: std::sync::Mutex<Vec<Option<LocationHint>>>,
    }

    #[async_trait]
    impl QuestionGenerator for RecordingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<Question, GenerationError> {
            self.locations.lock().unwrap().push(request.location);
            Err(GenerationError::Unavailable)
        }
    }

    /// Counts writes so tests can observe persistence from the progress callback.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryKeyValueStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }
    }

    fn pool() -> QuestionPoolStore {
        QuestionPoolStore::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    fn runner(generator: Arc<dyn QuestionGenerator>) -> BatchRunner {
        BatchRunner::new(generator)
            .with_synthesizer(VariantSynthesizer::seeded(9))
            .with_clock(fixed_clock())
            .with_pacing(Duration::ZERO)
    }

    #[test]
    fn request_rejects_zero_and_oversized_counts() {
        let grade = Grade::new(3).unwrap();
        assert!(matches!(
            BatchRequest::new(Subject::Math, grade, 0),
            Err(BatchError::InvalidCount { count: 0, .. })
        ));
        assert!(BatchRequest::new(Subject::Math, grade, MAX_BATCH_SIZE + 1).is_err());
        assert!(BatchRequest::new(Subject::Math, grade, 1).is_ok());
    }

    #[tokio::test]
    async fn local_seeds_feed_the_batch() {
        let mut pool = pool();
        let mut runner = runner(Arc::new(UnavailableGenerator));
        let request = BatchRequest::new(Subject::Math, Grade::new(3).unwrap(), 3).unwrap();
        let seed_text = SeedCatalog::builtin()
            .matching(Subject::Math, Grade::new(3).unwrap())[0]
            .text()
            .to_string();

        let mut events = Vec::new();
        let produced = runner
            .run(&request, &mut pool, |p| events.push(p))
            .await
            .unwrap();

        assert_eq!(produced.len(), 3);
        assert_eq!(pool.len(), 3);
        for q in pool.questions() {
            assert!(q.is_pending());
            let suffix = q.text().strip_prefix(seed_text.as_str()).unwrap();
            assert!(VARIATION_PHRASES.contains(&suffix));
        }
        assert_eq!(
            events.iter().map(|p| (p.completed, p.total)).collect::<Vec<_>>(),
            [(1, 3), (2, 3), (3, 3)]
        );
    }

    #[tokio::test]
    async fn pool_order_is_newest_first() {
        let mut pool = pool();
        let mut runner = runner(Arc::new(UnavailableGenerator));
        let request = BatchRequest::new(Subject::Korean, Grade::new(6).unwrap(), 4).unwrap();

        let produced = runner.run(&request, &mut pool, |_| {}).await.unwrap();

        let pool_ids: Vec<_> = pool.questions().iter().map(|q| q.id().clone()).collect();
        let mut produced_ids: Vec<_> = produced.iter().map(|q| q.id().clone()).collect();
        produced_ids.reverse();
        assert_eq!(pool_ids, produced_ids);
    }

    #[tokio::test]
    async fn each_item_is_persisted_before_the_next() {
        let kv = Arc::new(CountingStore::default());
        let mut pool = QuestionPoolStore::new(Arc::clone(&kv) as Arc<dyn KeyValueStore>);
        let mut runner = runner(Arc::new(UnavailableGenerator));
        let request = BatchRequest::new(Subject::Math, Grade::new(4).unwrap(), 3).unwrap();

        let mut writes_at_progress = Vec::new();
        runner
            .run(&request, &mut pool, |_| {
                writes_at_progress.push(kv.writes.load(Ordering::SeqCst));
            })
            .await
            .unwrap();
        assert_eq!(writes_at_progress, [1, 2, 3]);
    }

    #[tokio::test]
    async fn generator_failures_fall_back_to_default_seed() {
        let mut pool = pool();
        let mut runner = runner(Arc::new(FlakyGenerator::default()));
        let request = BatchRequest::new(Subject::Social, Grade::new(2).unwrap(), 4).unwrap();
        let default_text = SeedCatalog::builtin().default_seed().unwrap().text().to_string();

        let produced = runner.run(&request, &mut pool, |_| {}).await.unwrap();

        assert_eq!(produced.len(), 4);
        assert!(produced[0].text().starts_with(&default_text));
        assert_eq!(produced[1].text(), "remote 1");
        assert_eq!(produced[1].subject(), Subject::Social);
        assert!(produced[2].text().starts_with(&default_text));
        assert_eq!(produced[3].text(), "remote 3");
    }

    #[tokio::test]
    async fn empty_catalog_without_generator_is_a_fault() {
        let mut pool = pool();
        let mut runner = runner(Arc::new(UnavailableGenerator)).with_seeds(SeedCatalog::default());
        let request = BatchRequest::new(Subject::Math, Grade::new(1).unwrap(), 2).unwrap();

        let err = runner.run(&request, &mut pool, |_| {}).await.unwrap_err();
        assert!(matches!(err, BatchError::NoFallbackSeed));
        assert!(pool.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_sleeps_between_items_only() {
        let mut pool = pool();
        let mut runner = runner(Arc::new(UnavailableGenerator)).with_pacing(Duration::from_millis(50));
        let request = BatchRequest::new(Subject::Math, Grade::new(3).unwrap(), 3).unwrap();

        let started = tokio::time::Instant::now();
        runner.run(&request, &mut pool, |_| {}).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn location_hint_reaches_the_generator() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut runner = runner(generator.clone());
        let mut pool = pool();
        let seoul = LocationHint {
            latitude: 37.5665,
            longitude: 126.978,
        };
        let request = BatchRequest::new(Subject::Social, Grade::new(4).unwrap(), 2)
            .unwrap()
            .with_location(Some(seoul));

        let produced = runner.run(&request, &mut pool, |_| {}).await.unwrap();

        assert_eq!(produced.len(), 2);
        assert_eq!(*generator.locations.lock().unwrap(), vec![Some(seoul); 2]);
    }

    #[tokio::test]
    async fn missing_location_still_fills_the_batch() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut runner = runner(generator.clone());
        let mut pool = pool();
        let request = BatchRequest::new(Subject::Social, Grade::new(4).unwrap(), 3).unwrap();
        assert_eq!(request.location(), None);

        let produced = runner.run(&request, &mut pool, |_| {}).await.unwrap();

        assert_eq!(produced.len(), 3);
        assert_eq!(pool.len(), 3);
        assert_eq!(*generator.locations.lock().unwrap(), vec![None; 3]);
    }
}
