#![forbid(unsafe_code)]

pub mod pool_store;
pub mod repository;
pub mod sqlite;
pub mod stats_store;

pub use pool_store::{PoolSettings, QuestionPoolStore};
pub use repository::{InMemoryKeyValueStore, KeyValueStore, Storage, StorageError};
pub use stats_store::StatsStore;
