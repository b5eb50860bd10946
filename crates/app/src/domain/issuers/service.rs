//! Issuers service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;
use zeroize::Zeroize;

use crate::domain::{
    events::records::IssuerId,
    issuers::{
        IssuerAuthError, ProvidersConfigError,
        digest::{ScryptCost, digest_request_token, generate_random_hex},
        records::{ProviderEntry, ProvidersConfig, RequestTokenEntry},
    },
};

/// Issuers service backed by a static providers list.
#[derive(Debug, Clone)]
pub struct ConfiguredIssuersService {
    providers: Arc<ProvidersConfig>,
}

impl ConfiguredIssuersService {
    #[must_use]
    pub fn new(providers: ProvidersConfig) -> Self {
        Self {
            providers: Arc::new(providers),
        }
    }
}

#[async_trait]
impl IssuersService for ConfiguredIssuersService {
    #[tracing::instrument(name = "issuers.service.authenticate", skip(self, token))]
    async fn authenticate(&self, issuer: &str, token: &str) -> Result<IssuerId, IssuerAuthError> {
        let providers = Arc::clone(&self.providers);
        let issuer = issuer.to_string();
        let mut token = token.to_string();

        // Scrypt is CPU bound.
        let verified = tokio::task::spawn_blocking(move || {
            let verified = providers.verify(&issuer, &token);

            token.zeroize();

            verified
        })
        .await
        .map_err(IssuerAuthError::Verification)??;

        verified.ok_or_else(|| {
            debug!("unknown issuer or token mismatch");

            IssuerAuthError::NotFound
        })
    }
}

#[automock]
#[async_trait]
/// Poll caller authentication.
pub trait IssuersService: Send + Sync {
    /// Resolve the issuer presenting `token`.
    async fn authenticate(&self, issuer: &str, token: &str) -> Result<IssuerId, IssuerAuthError>;
}

/// Newly generated request token and the config entry that accepts it.
pub struct IssuedRequestToken {
    token: String,
    provider: ProviderEntry,
}

impl IssuedRequestToken {
    /// Raw token to hand to the relying party.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Providers config entry accepting the token.
    #[must_use]
    pub fn provider(&self) -> &ProviderEntry {
        &self.provider
    }
}

impl fmt::Debug for IssuedRequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedRequestToken")
            .field("token", &"**redacted**")
            .field("provider", &self.provider)
            .finish()
    }
}

impl Drop for IssuedRequestToken {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

/// Generate (or adopt) a request token for `issuer` and digest it.
///
/// # Errors
///
/// Returns an error when `cost` is not a valid scrypt cost or the digest
/// cannot be derived.
pub fn issue_request_token(
    issuer: IssuerId,
    token: Option<String>,
    cost: &str,
) -> Result<IssuedRequestToken, ProvidersConfigError> {
    let parsed: ScryptCost = cost.parse()?;
    let token = token.unwrap_or_else(generate_random_hex);
    let salt = generate_random_hex();

    let value = digest_request_token(&token, &salt, &parsed)?;

    Ok(IssuedRequestToken {
        token,
        provider: ProviderEntry {
            issuer,
            tokens: vec![RequestTokenEntry {
                value,
                salt,
                cost: cost.to_string(),
            }],
        },
    })
}
