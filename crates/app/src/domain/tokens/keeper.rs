//! Token keeper.

use std::{fmt, sync::Arc};

use crate::{
    clock::Clock,
    domain::tokens::{
        Authenticator, RefreshStrategy, SlidingWindow, TokenError, cache::TokenCache,
        records::AuthToken,
    },
};

/// Default sliding increment in seconds.
pub const DEFAULT_PREFETCH_TTL_SECONDS: f64 = 10.0;

/// Increments between the sliding checkpoint and hard expiry.
pub const SLIDING_TIMES: u32 = 3;

/// Refresh behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenKeeperConfig {
    /// Callers may authenticate on demand. When off, tokens come from the
    /// cache only and are populated out of band.
    pub sync_request_enabled: bool,

    pub sliding_expiration_enabled: bool,

    /// Sliding increment in seconds; non-positive values use the default.
    pub prefetch_ttl_seconds: f64,
}

impl Default for TokenKeeperConfig {
    fn default() -> Self {
        Self {
            sync_request_enabled: true,
            sliding_expiration_enabled: true,
            prefetch_ttl_seconds: DEFAULT_PREFETCH_TTL_SECONDS,
        }
    }
}

impl TokenKeeperConfig {
    #[must_use]
    pub fn strategy(&self) -> RefreshStrategy {
        if !self.sync_request_enabled {
            return RefreshStrategy::NoRefresh;
        }

        if !self.sliding_expiration_enabled {
            return RefreshStrategy::OnExpire;
        }

        let prefetch_ttl = if self.prefetch_ttl_seconds > 0.0 {
            self.prefetch_ttl_seconds
        } else {
            DEFAULT_PREFETCH_TTL_SECONDS
        };

        RefreshStrategy::SlidingWindow(SlidingWindow::new(prefetch_ttl, SLIDING_TIMES))
    }
}

/// Entry point for code that needs a vendor token.
#[derive(Clone)]
pub struct TokenKeeper {
    strategy: RefreshStrategy,
    authenticator: Arc<dyn Authenticator>,
    cache: TokenCache,
    clock: Arc<dyn Clock>,
}

impl TokenKeeper {
    #[must_use]
    pub fn new(
        strategy: RefreshStrategy,
        authenticator: Arc<dyn Authenticator>,
        cache: TokenCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            strategy,
            authenticator,
            cache,
            clock,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> RefreshStrategy {
        self.strategy
    }

    /// Current token, or `None` when nothing usable is available.
    ///
    /// # Errors
    ///
    /// Propagates authenticator and cache failures.
    pub async fn token(&self) -> Result<Option<String>, TokenError> {
        let token = self
            .strategy
            .acquire(self.authenticator.as_ref(), &self.cache, self.clock.as_ref())
            .await?;

        Ok(Some(token.token).filter(|token| !token.is_empty()))
    }

    /// Fetch and cache a new token regardless of what is cached.
    ///
    /// # Errors
    ///
    /// Propagates authenticator and cache failures.
    pub async fn retrieve_token(&self) -> Result<AuthToken, TokenError> {
        self.strategy
            .refresh(self.authenticator.as_ref(), &self.cache)
            .await
    }

    /// Drop the cached token.
    ///
    /// # Errors
    ///
    /// Returns an error when the cache is unavailable.
    pub async fn remove_token(&self) -> Result<bool, TokenError> {
        self.cache.remove().await
    }
}

impl fmt::Debug for TokenKeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeeper")
            .field("strategy", &self.strategy)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
