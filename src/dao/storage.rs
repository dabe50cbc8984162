use std::{error::Error, time::Duration};
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The persisted session moved past the version the writer read.
    #[error("game session `{id}` was modified concurrently (expected version {expected})")]
    Conflict { id: Uuid, expected: u64 },
    /// The backend did not answer within the configured bound.
    #[error("storage call `{operation}` did not complete within {limit:?}")]
    TimedOut {
        operation: &'static str,
        limit: Duration,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
