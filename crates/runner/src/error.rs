//! Runner error types

use parallax_core::MarketId;
use parallax_engine::ConfigError;
use thiserror::Error;

/// Errors surfaced while driving feeds into the registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunnerError {
    #[error("Engine configuration rejected: {0}")]
    Engine(#[from] ConfigError),

    #[error("Feed for {0} closed before the producer finished")]
    FeedClosed(MarketId),

    #[error("Feed task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for RunnerError {
    fn from(err: tokio::task::JoinError) -> Self {
        RunnerError::Join(err.to_string())
    }
}

pub type RunnerResult<T> = Result<T, RunnerError>;
