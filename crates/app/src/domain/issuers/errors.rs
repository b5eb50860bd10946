//! Issuer authentication errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssuerAuthError {
    /// Unknown issuer or a token matching none of its digests.
    #[error("issuer credentials not found")]
    NotFound,

    #[error("token verification task failed")]
    Verification(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Digest(#[from] DigestError),
}

/// Scrypt refused to derive a digest.
#[derive(Debug, Error)]
#[error("scrypt digest failed")]
pub struct DigestError;

#[derive(Debug, Error)]
pub enum ProvidersConfigError {
    #[error("providers config is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("invalid scrypt cost {0:?}")]
    InvalidCost(String),

    #[error("duplicate issuer {0:?}")]
    DuplicateIssuer(String),

    #[error(transparent)]
    Digest(#[from] DigestError),
}
