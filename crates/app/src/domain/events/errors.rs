//! Event queue errors.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum EventQueueError {
    #[error("event timestamp cannot be bucketed")]
    Bucketing(#[source] jiff::Error),

    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for EventQueueError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}
