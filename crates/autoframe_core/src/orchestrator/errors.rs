//! Error types for batch orchestration.
//!
//! Errors chain through layers:
//! Batch → Strategy → Remote/Engine → Detail

use thiserror::Error;

use crate::engine::EngineError;
use crate::remote::RemoteError;
use crate::selection::SelectionError;

/// Failure inside a render strategy.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error(transparent)]
    Remote(RemoteError),

    #[error(transparent)]
    Engine(EngineError),

    #[error("Cancelled")]
    Cancelled,
}

impl From<RemoteError> for StrategyError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Cancelled => Self::Cancelled,
            other => Self::Remote(other),
        }
    }
}

impl From<EngineError> for StrategyError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Cancelled => Self::Cancelled,
            other => Self::Engine(other),
        }
    }
}

impl StrategyError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the job queue is down and the per-file path may still work.
    pub fn is_async_unavailable(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::AsyncUnavailable(_)))
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Remote(e) => e.user_message(),
            Self::Engine(e) => e.user_message(),
            Self::Cancelled => "Batch cancelled.".to_string(),
        }
    }
}

/// Top-level error returned from a batch submission.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("A batch is already running")]
    Busy,

    /// The selection was rejected before any work started.
    #[error("{0}")]
    Validation(#[from] SelectionError),

    #[error("Batch '{batch_id}' failed in {strategy}: {source}")]
    StrategyFailed {
        batch_id: String,
        strategy: String,
        #[source]
        source: StrategyError,
    },

    #[error("Batch '{batch_id}' was cancelled")]
    Cancelled { batch_id: String },

    #[error("Batch '{batch_id}' setup failed: {message}")]
    Setup { batch_id: String, message: String },
}

impl BatchError {
    pub fn strategy_failed(
        batch_id: impl Into<String>,
        strategy: impl Into<String>,
        source: StrategyError,
    ) -> Self {
        Self::StrategyFailed {
            batch_id: batch_id.into(),
            strategy: strategy.into(),
            source,
        }
    }

    pub fn cancelled(batch_id: impl Into<String>) -> Self {
        Self::Cancelled {
            batch_id: batch_id.into(),
        }
    }

    pub fn setup(batch_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Setup {
            batch_id: batch_id.into(),
            message: message.into(),
        }
    }

    /// The single message a host shows for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => "A batch is already running.".to_string(),
            Self::Validation(e) => e.to_string(),
            Self::StrategyFailed { source, .. } => source.user_message(),
            Self::Cancelled { .. } => "Batch cancelled.".to_string(),
            Self::Setup { message, .. } => message.clone(),
        }
    }

    /// Notices collected while filtering the selection, if the batch never started.
    pub fn notices(&self) -> &[String] {
        match self {
            Self::Validation(e) => e.notices(),
            _ => &[],
        }
    }
}

/// Result type for batch submissions.
pub type SubmitResult<T> = Result<T, BatchError>;
