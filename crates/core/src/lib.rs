#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod reward;
pub mod seeds;
pub mod time;
pub mod variant;

pub use error::Error;
pub use reward::RewardRules;
pub use seeds::SeedCatalog;
pub use time::Clock;
pub use variant::VariantSynthesizer;
