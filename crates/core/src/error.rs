use thiserror::Error;

use crate::model::{ParseEnumError, QuestionError, StatsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Parse(#[from] ParseEnumError),
}
