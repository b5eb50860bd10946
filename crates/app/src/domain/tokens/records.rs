//! Token Records

use serde::{Deserialize, Serialize};

/// Cached vendor credential.
///
/// All instants are fractional seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,

    /// Hard expiry reported by the vendor.
    pub expires_at: f64,

    /// Earlier checkpoint after which callers should proactively refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sliding_expires_at: Option<f64>,
}

impl AuthToken {
    #[must_use]
    pub fn new(token: impl Into<String>, expires_at: f64) -> Self {
        Self {
            token: token.into(),
            expires_at,
            sliding_expires_at: None,
        }
    }

    /// Placeholder with no token that is already expired.
    #[must_use]
    pub fn blank() -> Self {
        Self::new(String::new(), 0.0)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.token.is_empty()
    }

    #[must_use]
    pub fn is_expired_at(&self, now: f64) -> bool {
        now >= self.expires_at
    }

    /// Hard expiry always counts as sliding expiry.
    #[must_use]
    pub fn is_sliding_window_expired_at(&self, now: f64) -> bool {
        self.is_expired_at(now)
            || self
                .sliding_expires_at
                .is_some_and(|sliding_expires_at| now >= sliding_expires_at)
    }
}
