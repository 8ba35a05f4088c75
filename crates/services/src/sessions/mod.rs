mod batch;
mod progress;
mod service;
mod submission;

// Public API of the session subsystem.
pub use batch::{BatchRequest, BatchRunner, DEFAULT_PACING, MAX_BATCH_SIZE};
pub use progress::BatchProgress;
pub use service::{QuestSession, SessionSettings};
pub use submission::SubmitOutcome;
