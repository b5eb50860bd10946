//! Poll Records

use crate::domain::{events::records::EventBatch, poll::data::BatchSize};

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Events to deliver.
    pub sets: EventBatch,

    /// Number of acknowledged events deleted, when the request carried `ack`.
    pub acknowledged: Option<u64>,

    pub requested_batch_size: BatchSize,
}
