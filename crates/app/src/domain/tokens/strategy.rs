//! Refresh strategies.

use rand::Rng;
use tracing::{debug, info};

use crate::{
    clock::Clock,
    domain::tokens::{Authenticator, TokenError, cache::TokenCache, records::AuthToken},
};

/// Proactive refresh configuration.
///
/// A fetched token gets a sliding checkpoint `increment_seconds * times`
/// before its hard expiry. The increment carries a uniform jitter in
/// `[-0.5, 0.5)` seconds chosen once at construction so identically
/// configured processes drift apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlidingWindow {
    increment_seconds: f64,
    times: u32,
}

impl SlidingWindow {
    #[must_use]
    pub fn new(increment_seconds: f64, times: u32) -> Self {
        Self::with_rng(increment_seconds, times, &mut rand::thread_rng())
    }

    /// Build a window drawing the jitter from `rng`.
    #[must_use]
    pub fn with_rng<R: Rng + ?Sized>(increment_seconds: f64, times: u32, rng: &mut R) -> Self {
        Self {
            increment_seconds: increment_seconds + rng.gen_range(-0.5..0.5),
            times,
        }
    }

    /// Jittered step, in seconds.
    #[must_use]
    pub fn increment_seconds(&self) -> f64 {
        self.increment_seconds
    }

    #[must_use]
    pub fn times(&self) -> u32 {
        self.times
    }

    fn sliding_expires_at(&self, expires_at: f64) -> f64 {
        expires_at - self.increment_seconds * f64::from(self.times)
    }
}

/// How an acquisition treats the cached token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshStrategy {
    /// Serve whatever is cached and never authenticate.
    NoRefresh,

    /// Always a blank token, touching neither cache nor authenticator.
    Blank,

    /// Refresh only once the cached token is hard-expired.
    OnExpire,

    /// Refresh ahead of expiry, claiming the refresh in the shared cache first.
    SlidingWindow(SlidingWindow),
}

impl RefreshStrategy {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoRefresh => "no_refresh",
            Self::Blank => "blank",
            Self::OnExpire => "on_expire",
            Self::SlidingWindow(_) => "sliding_window",
        }
    }

    /// Token to use for the next vendor call.
    ///
    /// # Errors
    ///
    /// Propagates authenticator and cache failures without retrying.
    #[tracing::instrument(
        name = "tokens.strategy.acquire",
        skip_all,
        fields(strategy = self.name(), key = cache.key()),
        err
    )]
    pub async fn acquire(
        &self,
        authenticator: &dyn Authenticator,
        cache: &TokenCache,
        clock: &dyn Clock,
    ) -> Result<AuthToken, TokenError> {
        match self {
            Self::Blank => Ok(AuthToken::blank()),
            Self::NoRefresh => Ok(cache.get().await?.unwrap_or_else(AuthToken::blank)),
            Self::OnExpire => {
                let now = clock.epoch_seconds();

                match cache.get().await? {
                    Some(token) if !token.is_expired_at(now) => Ok(token),
                    _ => self.refresh(authenticator, cache).await,
                }
            }
            Self::SlidingWindow(window) => {
                let now = clock.epoch_seconds();

                match cache.get().await? {
                    Some(token) if !token.is_sliding_window_expired_at(now) => return Ok(token),
                    Some(mut token) if !token.is_expired_at(now) => {
                        // Claim: push the checkpoint out before authenticating so
                        // concurrent readers keep serving the current token.
                        let claimed = token.sliding_expires_at.unwrap_or(now)
                            + window.increment_seconds();

                        token.sliding_expires_at = Some(claimed);
                        cache.set(&token).await?;

                        debug!(sliding_expires_at = claimed, "claimed token refresh");
                    }
                    _ => {}
                }

                self.refresh(authenticator, cache).await
            }
        }
    }

    /// Fetch a new token, stamp its sliding checkpoint and cache it.
    ///
    /// # Errors
    ///
    /// Propagates authenticator and cache failures.
    pub async fn refresh(
        &self,
        authenticator: &dyn Authenticator,
        cache: &TokenCache,
    ) -> Result<AuthToken, TokenError> {
        if matches!(self, Self::Blank) {
            return Ok(AuthToken::blank());
        }

        let mut token = authenticator.retrieve_token().await?;

        token.sliding_expires_at = match self {
            Self::SlidingWindow(window) => Some(window.sliding_expires_at(token.expires_at)),
            _ => None,
        };

        cache.set(&token).await?;

        info!(expires_at = token.expires_at, "refreshed token");

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use jiff::{SignedDuration, Timestamp};
    use rand::{SeedableRng, rngs::StdRng};
    use testresult::TestResult;

    use crate::{
        clock::MockClock,
        domain::tokens::{AuthenticatorError, MockAuthenticator},
        storage::{MemoryStore, MockKeyValueStore},
    };

    use super::*;

    const NOW: i64 = 1_800_000_000;

    struct Harness {
        clock: MockClock,
        cache: TokenCache,
    }

    impl Harness {
        fn new() -> Self {
            let clock = MockClock::new(Timestamp::from_second(NOW).unwrap_or_default());
            let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
            let cache = TokenCache::new(store, "token", Arc::new(clock.clone()));

            Self { clock, cache }
        }

        fn now(&self) -> f64 {
            self.clock.epoch_seconds()
        }

        async fn acquire(
            &self,
            strategy: RefreshStrategy,
            authenticator: &dyn Authenticator,
        ) -> Result<AuthToken, TokenError> {
            strategy.acquire(authenticator, &self.cache, &self.clock).await
        }
    }

    fn window() -> SlidingWindow {
        SlidingWindow::with_rng(10.0, 3, &mut StdRng::seed_from_u64(7))
    }

    fn returning(token: AuthToken) -> MockAuthenticator {
        let mut authenticator = MockAuthenticator::new();

        authenticator
            .expect_retrieve_token()
            .times(1)
            .returning(move || Ok(token.clone()));

        authenticator
    }

    fn never() -> MockAuthenticator {
        let mut authenticator = MockAuthenticator::new();

        authenticator.expect_retrieve_token().never();

        authenticator
    }

    fn failing() -> MockAuthenticator {
        let mut authenticator = MockAuthenticator::new();

        authenticator
            .expect_retrieve_token()
            .times(1)
            .returning(|| Err(AuthenticatorError::Status { status: 503 }));

        authenticator
    }

    fn about_to_slide(now: f64) -> AuthToken {
        AuthToken {
            sliding_expires_at: Some(now - 10.0),
            ..AuthToken::new("cached", now + 3600.0)
        }
    }

    #[test]
    fn jitter_stays_within_half_a_second() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let window = SlidingWindow::with_rng(10.0, 3, &mut rng);

            assert!((9.5..10.5).contains(&window.increment_seconds()));
            assert_eq!(window.times(), 3);
        }
    }

    #[test]
    fn jitter_is_fixed_per_instance() {
        let window = SlidingWindow::new(10.0, 3);
        let copy = window;

        assert!((copy.increment_seconds() - window.increment_seconds()).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn blank_touches_nothing() -> TestResult {
        let mut store = MockKeyValueStore::new();

        store.expect_get().never();
        store.expect_set().never();

        let clock = MockClock::new(Timestamp::UNIX_EPOCH);
        let cache = TokenCache::new(Arc::new(store), "token", Arc::new(clock.clone()));

        let token = RefreshStrategy::Blank
            .acquire(&never(), &cache, &clock)
            .await?;

        assert!(token.is_blank());

        Ok(())
    }

    #[tokio::test]
    async fn no_refresh_serves_cache_even_when_expired() -> TestResult {
        let harness = Harness::new();

        assert!(harness.acquire(RefreshStrategy::NoRefresh, &never()).await?.is_blank());

        let stale = AuthToken::new("stale", harness.now() + 60.0);

        harness.cache.set(&stale).await?;
        harness.clock.advance(SignedDuration::from_secs(30));

        assert_eq!(harness.acquire(RefreshStrategy::NoRefresh, &never()).await?, stale);

        Ok(())
    }

    #[tokio::test]
    async fn on_expire_fetches_when_missing_or_expired() -> TestResult {
        let harness = Harness::new();
        let first = AuthToken::new("first", harness.now() + 60.0);

        let token = harness
            .acquire(RefreshStrategy::OnExpire, &returning(first.clone()))
            .await?;

        assert_eq!(token, first);
        assert_eq!(harness.cache.get().await?, Some(first.clone()));

        assert_eq!(harness.acquire(RefreshStrategy::OnExpire, &never()).await?, first);

        harness.clock.advance(SignedDuration::from_secs(60));

        let second = AuthToken::new("second", harness.now() + 60.0);

        let token = harness
            .acquire(RefreshStrategy::OnExpire, &returning(second.clone()))
            .await?;

        assert_eq!(token, second);

        Ok(())
    }

    #[tokio::test]
    async fn on_expire_ignores_sliding_checkpoint() -> TestResult {
        let harness = Harness::new();
        let cached = about_to_slide(harness.now());

        harness.cache.set(&cached).await?;

        let token = harness.acquire(RefreshStrategy::OnExpire, &never()).await?;

        assert_eq!(token, cached);
        assert_eq!(harness.cache.get().await?, Some(cached));

        Ok(())
    }

    #[tokio::test]
    async fn sliding_window_fetches_and_stamps_checkpoint() -> TestResult {
        let harness = Harness::new();
        let window = window();
        let fetched = AuthToken::new("fresh", harness.now() + 3600.0);

        let token = harness
            .acquire(
                RefreshStrategy::SlidingWindow(window),
                &returning(fetched.clone()),
            )
            .await?;

        let expected = fetched.expires_at - window.increment_seconds() * 3.0;

        assert_eq!(token.token, "fresh");
        assert_eq!(token.sliding_expires_at, Some(expected));
        assert_eq!(harness.cache.get().await?, Some(token));

        Ok(())
    }

    #[tokio::test]
    async fn sliding_window_fast_path_returns_cached_token() -> TestResult {
        let harness = Harness::new();
        let cached = AuthToken {
            sliding_expires_at: Some(harness.now() + 10.0),
            ..AuthToken::new("cached", harness.now() + 3600.0)
        };

        harness.cache.set(&cached).await?;

        let token = harness
            .acquire(RefreshStrategy::SlidingWindow(window()), &never())
            .await?;

        assert_eq!(token, cached);
        assert_eq!(harness.cache.get().await?, Some(cached));

        Ok(())
    }

    #[tokio::test]
    async fn sliding_window_claims_before_refreshing() -> TestResult {
        let harness = Harness::new();
        let window = window();
        let cached = about_to_slide(harness.now());

        harness.cache.set(&cached).await?;

        let result = harness
            .acquire(RefreshStrategy::SlidingWindow(window), &failing())
            .await;

        assert!(matches!(result, Err(TokenError::Authenticator(_))));

        let claimed = harness.cache.get().await?.ok_or("claim missing")?;
        let previous = cached.sliding_expires_at.ok_or("sliding missing")?;
        let extended = claimed.sliding_expires_at.ok_or("sliding missing")?;

        assert_eq!(claimed.token, "cached");
        assert!((extended - previous - window.increment_seconds()).abs() < 1e-9);
        assert!((extended - previous - 10.0).abs() <= 0.5);

        Ok(())
    }

    /// Records the cached token visible while a fetch is in flight.
    struct ObservingAuthenticator {
        cache: TokenCache,
        seen: Mutex<Option<AuthToken>>,
        fresh: AuthToken,
    }

    #[async_trait]
    impl Authenticator for ObservingAuthenticator {
        async fn retrieve_token(&self) -> Result<AuthToken, AuthenticatorError> {
            let cached = self.cache.get().await.ok().flatten();

            if let Ok(mut seen) = self.seen.lock() {
                *seen = cached;
            }

            Ok(self.fresh.clone())
        }
    }

    #[tokio::test]
    async fn concurrent_readers_see_the_claim_during_refresh() -> TestResult {
        let harness = Harness::new();
        let window = window();
        let now = harness.now();
        let cached = about_to_slide(now);

        harness.cache.set(&cached).await?;

        let authenticator = ObservingAuthenticator {
            cache: harness.cache.clone(),
            seen: Mutex::new(None),
            fresh: AuthToken::new("fresh", now + 7200.0),
        };

        let token = harness
            .acquire(RefreshStrategy::SlidingWindow(window), &authenticator)
            .await?;

        let seen = authenticator
            .seen
            .lock()
            .map_err(|_poisoned| "poisoned")?
            .clone()
            .ok_or("nothing cached during refresh")?;

        assert_eq!(seen.token, "cached");
        assert!(!seen.is_sliding_window_expired_at(now));

        assert_eq!(token.token, "fresh");
        assert_eq!(harness.cache.get().await?, Some(token));

        Ok(())
    }

    #[tokio::test]
    async fn sliding_window_refetches_hard_expired_tokens() -> TestResult {
        let harness = Harness::new();
        let now = harness.now();

        harness
            .cache
            .set(&AuthToken {
                sliding_expires_at: Some(now - 40.0),
                ..AuthToken::new("expired", now + 5.0)
            })
            .await?;

        harness.clock.advance(SignedDuration::from_secs(5));

        let token = harness
            .acquire(
                RefreshStrategy::SlidingWindow(window()),
                &returning(AuthToken::new("fresh", now + 3605.0)),
            )
            .await?;

        assert_eq!(token.token, "fresh");

        Ok(())
    }

    #[tokio::test]
    async fn strategies_disagree_on_sliding_expired_tokens() -> TestResult {
        let harness = Harness::new();
        let now = harness.now();
        let cached = about_to_slide(now);

        harness.cache.set(&cached).await?;

        let kept = harness.acquire(RefreshStrategy::OnExpire, &never()).await?;

        assert_eq!(kept, cached);

        let refreshed = harness
            .acquire(
                RefreshStrategy::SlidingWindow(window()),
                &returning(AuthToken::new("fresh", now + 3600.0)),
            )
            .await?;

        assert_eq!(refreshed.token, "fresh");

        Ok(())
    }

    #[tokio::test]
    async fn authenticator_failures_propagate() -> TestResult {
        let harness = Harness::new();

        let result = harness.acquire(RefreshStrategy::OnExpire, &failing()).await;

        assert!(matches!(
            result,
            Err(TokenError::Authenticator(AuthenticatorError::Status { status: 503 }))
        ));
        assert_eq!(harness.cache.get().await?, None);

        Ok(())
    }
}
