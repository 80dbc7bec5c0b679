use std::error::Error;

use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backend-agnostic failures surfaced by an event store.
///
/// Concrete stores map their driver errors into these variants so the service
/// layer can decide between degrading gracefully and reporting a conflict
/// without knowing which database is behind the trait.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable context for logs and health output.
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The persisted version moved on since the caller loaded the aggregate.
    #[error("event `{id}` was modified concurrently (expected version {expected})")]
    VersionConflict {
        /// Identifier of the contested event.
        id: Uuid,
        /// Version the caller expected to replace.
        expected: u64,
    },
}

impl StorageError {
    /// Wrap any backend failure as an unavailability error.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
