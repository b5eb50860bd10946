//! Poll service errors.

use thiserror::Error;

use crate::domain::events::EventQueueError;

#[derive(Debug, Error)]
pub enum PollServiceError {
    #[error("maxEvents must be between 1 and 1000")]
    InvalidMaxEvents,

    #[error("event queue error")]
    Queue(#[source] EventQueueError),
}

impl From<EventQueueError> for PollServiceError {
    fn from(error: EventQueueError) -> Self {
        Self::Queue(error)
    }
}
