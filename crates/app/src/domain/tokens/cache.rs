//! Token cache.

use std::{fmt, sync::Arc, time::Duration};

use tracing::warn;

use crate::{
    clock::Clock,
    domain::tokens::{TokenError, records::AuthToken},
    storage::KeyValueStore,
};

/// One cached [`AuthToken`] under a fixed key of a shared store.
///
/// Writes are unconditional; the last writer wins.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            clock,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the cached token. Entries that fail to decode count as absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    pub async fn get(&self) -> Result<Option<AuthToken>, TokenError> {
        let Some(bytes) = self.store.get(&self.key).await? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(token) => Ok(Some(token)),
            Err(error) => {
                warn!(key = %self.key, %error, "discarding undecodable token cache entry");

                Ok(None)
            }
        }
    }

    /// Write `token`, expiring the store entry together with the token.
    ///
    /// A token already past its expiry deletes the entry instead.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding fails or the store is unavailable.
    pub async fn set(&self, token: &AuthToken) -> Result<(), TokenError> {
        let remaining = token.expires_at - self.clock.epoch_seconds();

        if remaining <= 0.0 || remaining.is_nan() {
            self.store.delete(&self.key).await?;

            return Ok(());
        }

        let bytes = serde_json::to_vec(token).map_err(TokenError::Encoding)?;
        let ttl = Duration::try_from_secs_f64(remaining).ok();

        self.store.set(&self.key, bytes, ttl).await?;

        Ok(())
    }

    /// Delete the cached token, reporting whether one was present.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    pub async fn remove(&self) -> Result<bool, TokenError> {
        Ok(self.store.delete(&self.key).await?)
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use testresult::TestResult;

    use crate::{clock::MockClock, storage::MemoryStore};

    use super::*;

    fn cache_at(seconds: i64) -> (TokenCache, MockClock, Arc<MemoryStore>) {
        let clock = MockClock::new(Timestamp::from_second(seconds).unwrap_or_default());
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));

        let cache = TokenCache::new(
            store.clone(),
            "arcgis_api_token:example.com",
            Arc::new(clock.clone()),
        );

        (cache, clock, store)
    }

    #[tokio::test]
    async fn round_trips_tokens() -> TestResult {
        let (cache, _clock, _store) = cache_at(1_000);
        let token = AuthToken {
            sliding_expires_at: Some(1_500.0),
            ..AuthToken::new("abc", 2_000.0)
        };

        assert_eq!(cache.get().await?, None);

        cache.set(&token).await?;

        assert_eq!(cache.get().await?, Some(token));

        Ok(())
    }

    #[tokio::test]
    async fn entry_expires_with_the_token() -> TestResult {
        let (cache, clock, _store) = cache_at(1_000);

        cache.set(&AuthToken::new("abc", 1_060.0)).await?;

        clock.advance(SignedDuration::from_secs(59));
        assert!(cache.get().await?.is_some());

        clock.advance(SignedDuration::from_secs(1));
        assert!(cache.get().await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn writing_an_expired_token_clears_the_entry() -> TestResult {
        let (cache, _clock, store) = cache_at(1_000);

        cache.set(&AuthToken::new("abc", 2_000.0)).await?;
        cache.set(&AuthToken::new("stale", 1_000.0)).await?;

        assert_eq!(cache.get().await?, None);
        assert_eq!(store.get(cache.key()).await?, None);

        cache.set(&AuthToken::blank()).await?;

        assert_eq!(cache.get().await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn undecodable_entries_count_as_absent() -> TestResult {
        let (cache, _clock, store) = cache_at(1_000);

        store.set(cache.key(), b"not json".to_vec(), None).await?;

        assert_eq!(cache.get().await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn remove_reports_presence() -> TestResult {
        let (cache, _clock, _store) = cache_at(1_000);

        cache.set(&AuthToken::new("abc", 2_000.0)).await?;

        assert!(cache.remove().await?);
        assert!(!cache.remove().await?);

        Ok(())
    }
}
