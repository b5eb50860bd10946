//! In-process store.
//!
//! Expiry is evaluated against the injected [`Clock`] and expired entries are
//! purged lazily whenever they are touched.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use tokio::sync::Mutex;

use crate::{
    clock::{Clock, system_clock},
    storage::{BucketStore, KeyValueStore, StorageError},
};

#[derive(Debug, Default)]
struct Bucket {
    fields: Vec<(String, String)>,
    expires_at: Option<Timestamp>,
}

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Timestamp>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, Bucket>,
    entries: HashMap<String, Entry>,
}

/// Memory-backed [`BucketStore`] and [`KeyValueStore`].
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    fn deadline(&self, ttl: Duration) -> Result<Timestamp, StorageError> {
        let ttl_signed =
            SignedDuration::try_from(ttl).map_err(|_overflow| StorageError::InvalidTtl(ttl))?;

        self.clock
            .now()
            .checked_add(ttl_signed)
            .map_err(|_overflow| StorageError::InvalidTtl(ttl))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

fn is_live(expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    expires_at.is_none_or(|expires_at| expires_at > now)
}

fn purge_expired_bucket(state: &mut State, bucket: &str, now: Timestamp) {
    if state
        .buckets
        .get(bucket)
        .is_some_and(|existing| !is_live(existing.expires_at, now))
    {
        state.buckets.remove(bucket);
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn hset(&self, bucket: &str, field: &str, value: &str) -> Result<(), StorageError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        purge_expired_bucket(&mut state, bucket, now);

        let fields = &mut state.buckets.entry(bucket.to_owned()).or_default().fields;

        match fields.iter_mut().find(|(existing, _)| existing == field) {
            Some((_, existing_value)) => value.clone_into(existing_value),
            None => fields.push((field.to_owned(), value.to_owned())),
        }

        Ok(())
    }

    async fn expire(&self, bucket: &str, ttl: Duration) -> Result<(), StorageError> {
        let now = self.clock.now();
        let deadline = self.deadline(ttl)?;
        let mut state = self.state.lock().await;

        purge_expired_bucket(&mut state, bucket, now);

        if let Some(existing) = state.buckets.get_mut(bucket) {
            existing.expires_at = Some(deadline);
        }

        Ok(())
    }

    async fn buckets(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state.buckets.retain(|_, bucket| is_live(bucket.expires_at, now));

        Ok(state
            .buckets
            .range(prefix.to_owned()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(_, bucket)| !bucket.fields.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn hscan(
        &self,
        bucket: &str,
        limit: usize,
    ) -> Result<Vec<(String, String)>, StorageError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        purge_expired_bucket(&mut state, bucket, now);

        Ok(state
            .buckets
            .get(bucket)
            .map(|existing| existing.fields.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn hdel(&self, bucket: &str, fields: &[String]) -> Result<u64, StorageError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        purge_expired_bucket(&mut state, bucket, now);

        let Some(existing) = state.buckets.get_mut(bucket) else {
            return Ok(0);
        };

        let before = existing.fields.len();

        existing
            .fields
            .retain(|(field, _)| !fields.iter().any(|deleted| deleted == field));

        let removed = before - existing.fields.len();

        if existing.fields.is_empty() {
            state.buckets.remove(bucket);
        }

        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        if state
            .entries
            .get(key)
            .is_some_and(|entry| !is_live(entry.expires_at, now))
        {
            state.entries.remove(key);
        }

        Ok(state.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let expires_at = ttl.map(|ttl| self.deadline(ttl)).transpose()?;

        self.state
            .lock()
            .await
            .entries
            .insert(key.to_owned(), Entry { value, expires_at });

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let now = self.clock.now();

        Ok(self
            .state
            .lock()
            .await
            .entries
            .remove(key)
            .is_some_and(|entry| is_live(entry.expires_at, now)))
    }
}
