//! Retry with exponential backoff for token requests.
//!
//! The delay before retry `n` (1-based) is `interval * backoff_factor^(n-1)`,
//! capped at `max_interval`, plus a random extra of up to
//! `interval_randomness` times that delay.

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::{debug, warn};

use crate::domain::tokens::AuthenticatorError;

/// Bounded retry schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    pub interval: Duration,

    pub backoff_factor: f64,

    pub max_interval: Duration,

    /// Fraction of the delay added as random jitter.
    pub interval_randomness: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            interval: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(30),
            interval_randomness: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Policy that makes a single attempt.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry `retry` without jitter.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let seconds = self.interval.as_secs_f64() * self.backoff_factor.max(1.0).powi(exponent);

        Duration::try_from_secs_f64(seconds.min(self.max_interval.as_secs_f64()))
            .unwrap_or(self.max_interval)
    }

    /// Delay before retry `retry` including jitter drawn from `rng`.
    #[must_use]
    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let backoff = self.backoff(retry);
        let randomness = self.interval_randomness.clamp(0.0, 1.0);
        let jitter = backoff.as_secs_f64() * randomness * rng.r#gen::<f64>();

        backoff + Duration::try_from_secs_f64(jitter).unwrap_or_default()
    }

    /// Run `operation` until it succeeds, fails permanently or retries run out.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-retriable error.
    pub async fn run<F, Fut, T>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, AuthenticatorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AuthenticatorError>>,
    {
        let mut retry = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if retry > 0 {
                        debug!(operation = operation_name, retry, "succeeded after retry");
                    }

                    return Ok(value);
                }
                Err(error) if error.is_retriable() && retry < self.max_retries => {
                    retry += 1;

                    let delay = self.delay(retry, &mut rand::thread_rng());

                    warn!(
                        operation = operation_name,
                        retry_count = retry,
                        will_retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        http_status = error.http_status(),
                        api_status_code = error.api_code(),
                        %error,
                        "token request failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
