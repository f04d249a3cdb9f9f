use std::collections::TryReserveError;
use thiserror::Error;

/// Errors produced by the clustering engine and its input loader.
#[derive(Debug, Error)]
pub enum KmeansError {
    /// Rejected before any computation starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to allocate {what}: {source}")]
    AllocationFailure {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, KmeansError>;

impl KmeansError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        KmeansError::InvalidConfiguration(msg.into())
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        KmeansError::MalformedInput {
            line,
            reason: reason.into(),
        }
    }
}
