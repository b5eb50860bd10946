//! Token errors.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AuthenticatorError {
    #[error("token request failed")]
    Transport(#[source] reqwest::Error),

    #[error("token endpoint responded with HTTP {status}")]
    Status { status: u16 },

    #[error("token endpoint error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        details: Vec<String>,
    },

    #[error("token response could not be decoded")]
    InvalidResponse(#[source] serde_json::Error),
}

impl AuthenticatorError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Api { .. } => true,
            Self::Status { status } => (400..=599).contains(status),
            Self::InvalidResponse(_) => false,
        }
    }

    /// HTTP status, if a response was received.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            Self::Status { status } => Some(*status),
            Self::Api { .. } | Self::InvalidResponse(_) => None,
        }
    }

    /// Error code reported in an API error body.
    #[must_use]
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AuthenticatorError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token authentication failed")]
    Authenticator(#[source] AuthenticatorError),

    #[error("token cache unavailable")]
    Cache(#[source] StorageError),

    #[error("token cache entry could not be encoded")]
    Encoding(#[source] serde_json::Error),
}

impl From<AuthenticatorError> for TokenError {
    fn from(error: AuthenticatorError) -> Self {
        Self::Authenticator(error)
    }
}

impl From<StorageError> for TokenError {
    fn from(error: StorageError) -> Self {
        Self::Cache(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_and_server_statuses_are_retriable() {
        for status in [400, 404, 429, 500, 503, 599] {
            assert!(AuthenticatorError::Status { status }.is_retriable());
        }

        for status in [300, 302, 600] {
            assert!(!AuthenticatorError::Status { status }.is_retriable());
        }
    }

    #[test]
    fn api_errors_are_retriable_and_report_their_code() {
        let error = AuthenticatorError::Api {
            code: 498,
            message: "Invalid token.".to_string(),
            details: Vec::new(),
        };

        assert!(error.is_retriable());
        assert_eq!(error.api_code(), Some(498));
        assert_eq!(error.http_status(), None);
    }
}
