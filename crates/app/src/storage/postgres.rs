//! PostgreSQL-backed store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row, query, query_scalar};

use crate::storage::{BucketStore, KeyValueStore, StorageError};

const PURGE_BUCKET_SQL: &str = include_str!("sql/purge_bucket.sql");
const PURGE_EXPIRED_BUCKETS_SQL: &str = include_str!("sql/purge_expired_buckets.sql");
const HSET_SQL: &str = include_str!("sql/hset.sql");
const EXPIRE_SQL: &str = include_str!("sql/expire.sql");
const BUCKETS_SQL: &str = include_str!("sql/buckets.sql");
const HSCAN_SQL: &str = include_str!("sql/hscan.sql");
const HDEL_SQL: &str = include_str!("sql/hdel.sql");
const GET_ENTRY_SQL: &str = include_str!("sql/get_entry.sql");
const SET_ENTRY_SQL: &str = include_str!("sql/set_entry.sql");
const DELETE_ENTRY_SQL: &str = include_str!("sql/delete_entry.sql");
const PURGE_ENTRY_SQL: &str = include_str!("sql/purge_entry.sql");
const PURGE_EXPIRED_ENTRIES_SQL: &str = include_str!("sql/purge_expired_entries.sql");

/// Store shared by every process connected to the same database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::new(PgPool::connect(database_url).await?))
    }

    /// Apply the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when a migration fails to apply.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|error| StorageError::Unavailable(error.into()))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn ttl_seconds(ttl: Duration) -> Result<f64, StorageError> {
    let seconds = ttl.as_secs_f64();

    if seconds.is_finite() {
        Ok(seconds)
    } else {
        Err(StorageError::InvalidTtl(ttl))
    }
}

#[async_trait]
impl BucketStore for PgStore {
    async fn hset(&self, bucket: &str, field: &str, value: &str) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        query(PURGE_BUCKET_SQL).bind(bucket).execute(&mut *tx).await?;

        query(HSET_SQL)
            .bind(bucket)
            .bind(field)
            .bind(value)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn expire(&self, bucket: &str, ttl: Duration) -> Result<(), StorageError> {
        query(EXPIRE_SQL)
            .bind(bucket)
            .bind(ttl_seconds(ttl)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Expired buckets under `prefix` are deleted before listing.
    async fn buckets(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut tx = self.pool.begin().await?;

        query(PURGE_EXPIRED_BUCKETS_SQL)
            .bind(prefix)
            .execute(&mut *tx)
            .await?;

        let names = query_scalar::<_, String>(BUCKETS_SQL)
            .bind(prefix)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(names)
    }

    async fn hscan(
        &self,
        bucket: &str,
        limit: usize,
    ) -> Result<Vec<(String, String)>, StorageError> {
        let rows = query(HSCAN_SQL)
            .bind(bucket)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("field")?, row.try_get("value")?)))
            .collect()
    }

    async fn hdel(&self, bucket: &str, fields: &[String]) -> Result<u64, StorageError> {
        if fields.is_empty() {
            return Ok(0);
        }

        Ok(query(HDEL_SQL)
            .bind(bucket)
            .bind(fields)
            .execute(&self.pool)
            .await?
            .rows_affected())
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        query(PURGE_ENTRY_SQL).bind(key).execute(&self.pool).await?;

        Ok(query_scalar::<_, Vec<u8>>(GET_ENTRY_SQL)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let ttl_seconds = ttl.map(ttl_seconds).transpose()?;

        query(PURGE_EXPIRED_ENTRIES_SQL)
            .execute(&self.pool)
            .await?;

        query(SET_ENTRY_SQL)
            .bind(key)
            .bind(value)
            .bind(ttl_seconds)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(query(DELETE_ENTRY_SQL)
            .bind(key)
            .execute(&self.pool)
            .await?
            .rows_affected()
            > 0)
    }
}
