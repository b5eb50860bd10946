//! ArcGIS token authenticator.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::domain::tokens::{
    Authenticator, AuthenticatorError, records::AuthToken, retry::RetryPolicy,
};

/// Prefix of the token cache key, followed by the token endpoint host.
pub const TOKEN_CACHE_KEY_PREFIX: &str = "arcgis_api_token";

/// ArcGIS `generateToken` settings.
#[derive(Clone)]
pub struct ArcgisConfig {
    pub generate_token_url: Url,
    pub username: String,
    pub password: String,

    /// Referer the token is bound to.
    pub referer: String,

    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl ArcgisConfig {
    /// Cache key for tokens issued by this endpoint.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{TOKEN_CACHE_KEY_PREFIX}:{}",
            self.generate_token_url.host_str().unwrap_or_default()
        )
    }
}

impl fmt::Debug for ArcgisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArcgisConfig")
            .field("generate_token_url", &self.generate_token_url.as_str())
            .field("username", &self.username)
            .field("password", &"**redacted**")
            .field("referer", &self.referer)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    details: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateTokenResponse {
    Error { error: ApiErrorBody },
    Token { token: String, expires: f64 },
}

/// Authenticator calling the ArcGIS `generateToken` endpoint.
#[derive(Debug, Clone)]
pub struct ArcgisAuthenticator {
    client: Client,
    config: ArcgisConfig,
}

impl ArcgisAuthenticator {
    /// Build an authenticator with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: ArcgisConfig) -> Result<Self, AuthenticatorError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ArcgisConfig {
        &self.config
    }

    async fn request_token(&self) -> Result<AuthToken, AuthenticatorError> {
        let response = self
            .client
            .post(self.config.generate_token_url.clone())
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
                ("referer", self.config.referer.as_str()),
                ("f", "json"),
            ])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            return Err(AuthenticatorError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;

        match serde_json::from_slice(&body).map_err(AuthenticatorError::InvalidResponse)? {
            GenerateTokenResponse::Token { token, expires } => {
                // `expires` is in milliseconds.
                Ok(AuthToken::new(token, (expires / 1000.0).trunc()))
            }
            GenerateTokenResponse::Error { error } => Err(AuthenticatorError::Api {
                message: error
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| format!("Received error code {}", error.code)),
                code: error.code,
                details: error.details,
            }),
        }
    }
}

#[async_trait]
impl Authenticator for ArcgisAuthenticator {
    #[tracing::instrument(
        name = "tokens.arcgis.retrieve_token",
        skip(self),
        fields(host = self.config.generate_token_url.host_str()),
        err
    )]
    async fn retrieve_token(&self) -> Result<AuthToken, AuthenticatorError> {
        let token = self
            .config
            .retry
            .run("arcgis.generate_token", || self.request_token())
            .await?;

        debug!(expires_at = token.expires_at, "retrieved arcgis token");

        Ok(token)
    }
}
