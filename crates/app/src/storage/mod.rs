//! Shared keyed store collaborators.
//!
//! The event queue and the token cache never talk to a backend directly. They
//! go through [`BucketStore`] (hash buckets with a bucket-level TTL) and
//! [`KeyValueStore`] (opaque values with an optional per-key TTL). Both traits
//! are implemented in-process by [`MemoryStore`] and on PostgreSQL by
//! [`PgStore`], so several processes can share one queue and one token cache.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;

mod errors;
pub mod memory;
pub mod postgres;

pub use errors::StorageError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Hash buckets keyed by name, each holding field/value pairs.
#[automock]
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Insert or overwrite a single field.
    async fn hset(&self, bucket: &str, field: &str, value: &str) -> Result<(), StorageError>;

    /// Set or refresh the time to live of a whole bucket.
    async fn expire(&self, bucket: &str, ttl: Duration) -> Result<(), StorageError>;

    /// Names of live buckets starting with `prefix`, sorted ascending.
    async fn buckets(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Up to `limit` live fields of a bucket, in storage order.
    async fn hscan(&self, bucket: &str, limit: usize)
    -> Result<Vec<(String, String)>, StorageError>;

    /// Delete fields from a bucket, returning how many were present.
    async fn hdel(&self, bucket: &str, fields: &[String]) -> Result<u64, StorageError>;
}

/// Opaque values keyed by name.
#[automock]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a live value.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write a value, replacing any previous one and its TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), StorageError>;

    /// Remove a value. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
