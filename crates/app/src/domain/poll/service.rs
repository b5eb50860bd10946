//! Poll service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::domain::{
    events::{EventQueue, records::IssuerId},
    poll::{
        PollServiceError,
        data::{BatchSize, PollRequest},
        records::PollOutcome,
    },
};

/// Poll service over an [`EventQueue`].
#[derive(Clone)]
pub struct QueuePollService {
    queue: Arc<dyn EventQueue>,
    default_batch_size: BatchSize,
}

impl QueuePollService {
    #[must_use]
    pub fn new(queue: Arc<dyn EventQueue>, default_batch_size: BatchSize) -> Self {
        Self {
            queue,
            default_batch_size,
        }
    }
}

impl std::fmt::Debug for QueuePollService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuePollService")
            .field("default_batch_size", &self.default_batch_size)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PollService for QueuePollService {
    #[tracing::instrument(
        name = "poll.service.poll",
        skip(self, request),
        fields(
            issuer = %issuer,
            batch_size = tracing::field::Empty,
            acknowledged = tracing::field::Empty,
            delivered = tracing::field::Empty
        ),
        err
    )]
    async fn poll(
        &self,
        issuer: &IssuerId,
        request: PollRequest,
    ) -> Result<PollOutcome, PollServiceError> {
        let batch_size = request
            .max_events
            .as_ref()
            .map(BatchSize::parse)
            .transpose()?
            .unwrap_or(self.default_batch_size);

        let span = Span::current();

        span.record("batch_size", tracing::field::display(batch_size));

        let acknowledged = match request.ack {
            Some(keys) => Some(self.queue.delete_events(issuer, &keys).await?),
            None => None,
        };

        if let Some(acknowledged) = acknowledged {
            span.record("acknowledged", acknowledged);
        }

        let sets = self.queue.read_events(issuer, batch_size.get()).await?;

        span.record("delivered", sets.len());

        info!("served poll");

        Ok(PollOutcome {
            sets,
            acknowledged,
            requested_batch_size: batch_size,
        })
    }
}

#[automock]
#[async_trait]
/// Poll-based security event delivery.
pub trait PollService: Send + Sync {
    /// Delete acknowledged events, then read the next batch for `issuer`.
    async fn poll(
        &self,
        issuer: &IssuerId,
        request: PollRequest,
    ) -> Result<PollOutcome, PollServiceError>;
}
