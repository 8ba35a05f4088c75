use std::sync::Arc;

use quest_core::model::{Grade, Subject, UserStats};
use quest_core::reward::apply_answer;
use quest_core::time::fixed_now;
use quest_core::{SeedCatalog, VariantSynthesizer};
use storage::pool_store::POOL_KEY;
use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;
use storage::{QuestionPoolStore, StatsStore};

#[tokio::test]
async fn sqlite_kv_upserts_values() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running twice must be harmless.
    repo.migrate().await.expect("migrate again");
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);

    assert_eq!(repo.get("missing").await.unwrap(), None);
    repo.set("k", "one").await.unwrap();
    repo.set("k", "two").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("two"));
}

#[tokio::test]
async fn sqlite_pool_survives_reopen() {
    let url = "sqlite:file:memdb_pool_reopen?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.expect("open");

    let catalog = SeedCatalog::builtin();
    let seeds = catalog.matching(Subject::Math, Grade::new(4).unwrap());
    let mut synth = VariantSynthesizer::seeded(11);

    let mut store = QuestionPoolStore::new(Arc::clone(&storage.kv));
    store.load().await;
    for _ in 0..3 {
        let variant = synth.synthesize(seeds[0], fixed_now());
        store.append(variant).await.unwrap();
    }
    let newest = store.questions()[0].id().clone();

    let mut reopened = QuestionPoolStore::new(Arc::clone(&storage.kv));
    let pool = reopened.load().await;
    assert_eq!(pool.len(), 3);
    assert_eq!(pool[0].id(), &newest);
    assert!(pool.iter().all(|q| q.is_pending()));
}

#[tokio::test]
async fn sqlite_corrupt_pool_reads_empty() {
    let storage = Storage::sqlite("sqlite:file:memdb_pool_corrupt?mode=memory&cache=shared")
        .await
        .expect("open");
    storage.kv.set(POOL_KEY, "[{\"id\":").await.unwrap();

    let mut store = QuestionPoolStore::new(Arc::clone(&storage.kv));
    assert!(store.load().await.is_empty());
}

#[tokio::test]
async fn sqlite_stats_round_trip() {
    let storage = Storage::sqlite("sqlite:file:memdb_stats?mode=memory&cache=shared")
        .await
        .expect("open");
    let stats_store = StatsStore::new(Arc::clone(&storage.kv));

    let stats = apply_answer(&apply_answer(&UserStats::new(), true), false);
    stats_store.save(&stats).await.unwrap();
    assert_eq!(stats_store.load().await, stats);
}
