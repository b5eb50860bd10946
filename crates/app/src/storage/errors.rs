//! Storage errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be reached or rejected the operation.
    #[error("store unavailable")]
    Unavailable(#[source] sqlx::Error),

    /// The requested TTL cannot be represented by the backend.
    #[error("invalid ttl: {0:?}")]
    InvalidTtl(std::time::Duration),
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        Self::Unavailable(error)
    }
}
