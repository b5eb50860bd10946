//! Event queue service.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::debug;

use crate::{
    domain::events::{
        EventQueueError, buckets,
        records::{EventBatch, IssuerId, SecurityEvent},
    },
    storage::BucketStore,
};

/// Default lifetime of an hourly bucket after its latest write.
pub const DEFAULT_EVENT_TTL: Duration = Duration::from_secs(3600);

/// Event queue settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQueueConfig {
    /// TTL applied to a bucket on every write.
    pub event_ttl: Duration,
}

impl Default for EventQueueConfig {
    fn default() -> Self {
        Self {
            event_ttl: DEFAULT_EVENT_TTL,
        }
    }
}

/// Event queue backed by hourly hash buckets in a [`BucketStore`].
#[derive(Clone)]
pub struct BucketEventQueue {
    store: Arc<dyn BucketStore>,
    config: EventQueueConfig,
}

impl BucketEventQueue {
    #[must_use]
    pub fn new(store: Arc<dyn BucketStore>, config: EventQueueConfig) -> Self {
        Self { store, config }
    }

    async fn issuer_buckets(&self, issuer: &IssuerId) -> Result<Vec<String>, EventQueueError> {
        let mut names = self.store.buckets(&buckets::issuer_prefix(issuer)).await?;

        names.retain(|bucket| buckets::belongs_to(issuer, bucket));
        names.sort();

        Ok(names)
    }
}

impl std::fmt::Debug for BucketEventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketEventQueue")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventQueue for BucketEventQueue {
    #[tracing::instrument(
        name = "events.queue.write_event",
        skip(self, payload),
        fields(issuer = %issuer),
        err
    )]
    async fn write_event(
        &self,
        issuer: &IssuerId,
        event_key: &str,
        payload: &str,
        timestamp: Timestamp,
    ) -> Result<(), EventQueueError> {
        let bucket = buckets::bucket_for(issuer, timestamp).map_err(EventQueueError::Bucketing)?;

        self.store.hset(&bucket, event_key, payload).await?;
        self.store.expire(&bucket, self.config.event_ttl).await?;

        let replaced = [event_key.to_owned()];
        let mut stale = 0;

        for other in self.issuer_buckets(issuer).await? {
            if other != bucket {
                stale += self.store.hdel(&other, &replaced).await?;
            }
        }

        debug!(%bucket, stale, "queued event");

        Ok(())
    }

    #[tracing::instrument(
        name = "events.queue.read_events",
        skip(self),
        fields(issuer = %issuer),
        err
    )]
    async fn read_events(
        &self,
        issuer: &IssuerId,
        batch_size: usize,
    ) -> Result<EventBatch, EventQueueError> {
        let mut batch = EventBatch::new();

        for bucket in self.issuer_buckets(issuer).await? {
            let remaining = batch_size.saturating_sub(batch.len());

            if remaining == 0 {
                break;
            }

            for (key, payload) in self.store.hscan(&bucket, remaining).await? {
                batch.push(SecurityEvent { key, payload });
            }
        }

        debug!(events = batch.len(), "read events");

        Ok(batch)
    }

    #[tracing::instrument(
        name = "events.queue.delete_events",
        skip(self, keys),
        fields(issuer = %issuer, keys = keys.len()),
        err
    )]
    async fn delete_events(
        &self,
        issuer: &IssuerId,
        keys: &[String],
    ) -> Result<u64, EventQueueError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0;

        for bucket in self.issuer_buckets(issuer).await? {
            deleted += self.store.hdel(&bucket, keys).await?;
        }

        debug!(deleted, "deleted events");

        Ok(deleted)
    }
}

#[automock]
#[async_trait]
/// Per-issuer security event queue.
pub trait EventQueue: Send + Sync {
    /// Store `payload` under `event_key` for `issuer`. An existing event with
    /// the same key is replaced, whichever hour it was queued in.
    async fn write_event(
        &self,
        issuer: &IssuerId,
        event_key: &str,
        payload: &str,
        timestamp: Timestamp,
    ) -> Result<(), EventQueueError>;

    /// Up to `batch_size` events for `issuer`, oldest hour first. Never deletes.
    async fn read_events(
        &self,
        issuer: &IssuerId,
        batch_size: usize,
    ) -> Result<EventBatch, EventQueueError>;

    /// Delete `keys` for `issuer`, returning how many were actually removed.
    async fn delete_events(&self, issuer: &IssuerId, keys: &[String])
    -> Result<u64, EventQueueError>;
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        clock::{Clock, MockClock},
        storage::{MemoryStore, MockBucketStore, StorageError},
    };

    use super::*;

    fn queue() -> BucketEventQueue {
        BucketEventQueue::new(Arc::new(MemoryStore::new()), EventQueueConfig::default())
    }

    fn at(value: &str) -> Timestamp {
        value.parse().unwrap_or(Timestamp::UNIX_EPOCH)
    }

    async fn write_events(
        queue: &BucketEventQueue,
        issuer: &IssuerId,
        keys: &[&str],
        timestamp: Timestamp,
    ) -> TestResult {
        for key in keys {
            queue
                .write_event(issuer, key, &format!("payload-{key}"), timestamp)
                .await?;
        }

        Ok(())
    }

    #[tokio::test]
    async fn empty_queue_reads_empty_batch() -> TestResult {
        let batch = queue().read_events(&IssuerId::from("sp1"), 1000).await?;

        assert!(batch.is_empty());
        assert_eq!(serde_json::to_string(&batch)?, "{}");

        Ok(())
    }

    #[tokio::test]
    async fn issuers_never_see_each_others_events() -> TestResult {
        let queue = queue();
        let sp1 = IssuerId::from("sp1");
        let sp2 = IssuerId::from("sp2");
        let nested = IssuerId::from("sp1:nested");
        let now = at("2026-10-16T10:15:00Z");

        write_events(&queue, &sp1, &["a"], now).await?;
        write_events(&queue, &sp2, &["b"], now).await?;
        write_events(&queue, &nested, &["c"], now).await?;

        let batch = queue.read_events(&sp1, 1000).await?;

        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(queue.delete_events(&sp1, &["b".to_string()]).await?, 0);
        assert_eq!(queue.read_events(&sp2, 1000).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn batch_size_bounds_results_across_buckets() -> TestResult {
        let queue = queue();
        let issuer = IssuerId::from("sp1");

        write_events(&queue, &issuer, &["a", "b"], at("2026-10-16T09:05:00Z")).await?;
        write_events(&queue, &issuer, &["c", "d"], at("2026-10-16T10:05:00Z")).await?;

        for n in 1..=5 {
            let batch = queue.read_events(&issuer, n).await?;

            assert_eq!(batch.len(), n.min(4), "batch size {n}");
        }

        let batch = queue.read_events(&issuer, 3).await?;

        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);

        Ok(())
    }

    #[tokio::test]
    async fn older_hours_are_read_first() -> TestResult {
        let queue = queue();
        let issuer = IssuerId::from("sp1");

        write_events(&queue, &issuer, &["late"], at("2026-10-16T11:00:00Z")).await?;
        write_events(&queue, &issuer, &["early"], at("2026-10-16T08:59:59Z")).await?;

        let batch = queue.read_events(&issuer, 10).await?;

        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["early", "late"]);

        Ok(())
    }

    #[tokio::test]
    async fn acknowledging_twice_deletes_nothing_the_second_time() -> TestResult {
        let queue = queue();
        let issuer = IssuerId::from("sp1");
        let keys = vec!["a".to_string(), "c".to_string()];

        write_events(&queue, &issuer, &["a", "b"], at("2026-10-16T09:00:00Z")).await?;
        write_events(&queue, &issuer, &["c"], at("2026-10-16T10:00:00Z")).await?;

        assert_eq!(queue.delete_events(&issuer, &keys).await?, 2);
        assert_eq!(queue.delete_events(&issuer, &keys).await?, 0);

        let batch = queue.read_events(&issuer, 10).await?;

        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["b"]);

        Ok(())
    }

    #[tokio::test]
    async fn rewriting_a_key_keeps_the_last_payload() -> TestResult {
        let queue = queue();
        let issuer = IssuerId::from("sp1");
        let now = at("2026-10-16T09:00:00Z");

        queue.write_event(&issuer, "a", "first", now).await?;
        queue.write_event(&issuer, "a", "second", now).await?;

        let batch = queue.read_events(&issuer, 10).await?;

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.payload("a"), Some("second"));

        Ok(())
    }

    #[tokio::test]
    async fn rewriting_a_key_in_a_later_hour_replaces_the_earlier_event() -> TestResult {
        let queue = queue();
        let issuer = IssuerId::from("sp1");

        queue
            .write_event(&issuer, "e1", "first", at("2026-10-16T09:10:00Z"))
            .await?;
        queue
            .write_event(&issuer, "e2", "other", at("2026-10-16T09:20:00Z"))
            .await?;
        queue
            .write_event(&issuer, "e1", "second", at("2026-10-16T10:10:00Z"))
            .await?;

        let batch = queue.read_events(&issuer, 10).await?;

        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["e2", "e1"]);
        assert_eq!(batch.payload("e1"), Some("second"));
        assert_eq!(serde_json::to_string(&batch)?, r#"{"e2":"other","e1":"second"}"#);
        assert_eq!(queue.delete_events(&issuer, &["e1".to_string()]).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn events_expire_with_their_bucket() -> TestResult {
        let clock = MockClock::new(at("2026-10-16T09:00:00Z"));
        let queue = BucketEventQueue::new(
            Arc::new(MemoryStore::with_clock(Arc::new(clock.clone()))),
            EventQueueConfig {
                event_ttl: Duration::from_secs(60),
            },
        );
        let issuer = IssuerId::from("sp1");

        queue.write_event(&issuer, "a", "payload", clock.now()).await?;

        clock.advance(SignedDuration::from_secs(61));

        assert!(queue.read_events(&issuer, 10).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn write_refreshes_bucket_ttl() -> TestResult {
        let mut store = MockBucketStore::new();

        store
            .expect_hset()
            .with(
                eq("attempts-api-events:sp1:2026-10-16T09:00:00Z"),
                eq("a"),
                eq("payload"),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        store
            .expect_expire()
            .with(
                eq("attempts-api-events:sp1:2026-10-16T09:00:00Z"),
                eq(Duration::from_secs(3600)),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        store
            .expect_buckets()
            .with(eq("attempts-api-events:sp1:"))
            .times(1)
            .returning(|_| Ok(vec!["attempts-api-events:sp1:2026-10-16T09:00:00Z".to_string()]));

        store.expect_hdel().never();

        let queue = BucketEventQueue::new(Arc::new(store), EventQueueConfig::default());

        queue
            .write_event(
                &IssuerId::from("sp1"),
                "a",
                "payload",
                at("2026-10-16T09:30:00Z"),
            )
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let mut store = MockBucketStore::new();

        store
            .expect_buckets()
            .returning(|_| Err(StorageError::Unavailable(sqlx::Error::PoolTimedOut)));

        let queue = BucketEventQueue::new(Arc::new(store), EventQueueConfig::default());

        let result = queue.read_events(&IssuerId::from("sp1"), 10).await;

        assert!(
            matches!(result, Err(EventQueueError::Storage(_))),
            "expected storage error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn empty_ack_skips_the_store() -> TestResult {
        let mut store = MockBucketStore::new();

        store.expect_buckets().never();
        store.expect_hdel().never();

        let queue = BucketEventQueue::new(Arc::new(store), EventQueueConfig::default());

        assert_eq!(queue.delete_events(&IssuerId::from("sp1"), &[]).await?, 0);

        Ok(())
    }
}
