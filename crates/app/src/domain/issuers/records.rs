//! Issuer Records

use serde::{Deserialize, Serialize};

use crate::domain::{
    events::records::IssuerId,
    issuers::{
        DigestError, ProvidersConfigError,
        digest::{ScryptCost, token_matches},
    },
};

/// One accepted request token as it appears in the providers config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTokenEntry {
    /// Hex scrypt digest of the raw token.
    pub value: String,

    pub salt: String,

    /// Scrypt cost in `N$r$p$` form.
    pub cost: String,
}

/// Provider entry as it appears in the providers config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub issuer: IssuerId,

    #[serde(default)]
    pub tokens: Vec<RequestTokenEntry>,
}

/// Validated request token digest.
#[derive(Debug, Clone)]
pub struct RequestTokenDigest {
    value: String,
    salt: String,
    cost: ScryptCost,
}

impl RequestTokenDigest {
    /// Whether `token` hashes to this digest.
    ///
    /// # Errors
    ///
    /// Returns an error when `token` cannot be digested.
    pub fn matches(&self, token: &str) -> Result<bool, DigestError> {
        token_matches(token, &self.salt, &self.cost, &self.value)
    }
}

impl TryFrom<RequestTokenEntry> for RequestTokenDigest {
    type Error = ProvidersConfigError;

    fn try_from(entry: RequestTokenEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            cost: entry.cost.parse()?,
            value: entry.value,
            salt: entry.salt,
        })
    }
}

/// Validated issuer and the digests of its accepted tokens.
#[derive(Debug, Clone)]
pub struct Provider {
    pub issuer: IssuerId,
    pub tokens: Vec<RequestTokenDigest>,
}

/// Providers allowed to poll for events.
#[derive(Debug, Clone, Default)]
pub struct ProvidersConfig {
    providers: Vec<Provider>,
}

impl ProvidersConfig {
    /// Parse the JSON providers list.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, invalid costs or repeated issuers.
    pub fn from_json(json: &str) -> Result<Self, ProvidersConfigError> {
        let entries: Vec<ProviderEntry> = if json.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(json)?
        };

        entries.try_into()
    }

    #[must_use]
    pub fn provider(&self, issuer: &str) -> Option<&Provider> {
        self.providers
            .iter()
            .find(|provider| provider.issuer.as_str() == issuer)
    }

    /// Resolve the issuer whose configured digests accept `token`.
    ///
    /// Unknown issuers still digest `token` once, against the first
    /// configured digest, so both rejections cost the same scrypt work.
    ///
    /// # Errors
    ///
    /// Returns an error when `token` cannot be digested.
    pub fn verify(&self, issuer: &str, token: &str) -> Result<Option<IssuerId>, DigestError> {
        let Some(provider) = self.provider(issuer) else {
            if let Some(decoy) = self.decoy() {
                decoy.matches(token)?;
            }

            return Ok(None);
        };

        for digest in &provider.tokens {
            if digest.matches(token)? {
                return Ok(Some(provider.issuer.clone()));
            }
        }

        Ok(None)
    }

    fn decoy(&self) -> Option<&RequestTokenDigest> {
        self.providers
            .iter()
            .flat_map(|provider| provider.tokens.iter())
            .next()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl TryFrom<Vec<ProviderEntry>> for ProvidersConfig {
    type Error = ProvidersConfigError;

    fn try_from(entries: Vec<ProviderEntry>) -> Result<Self, Self::Error> {
        let mut providers: Vec<Provider> = Vec::with_capacity(entries.len());

        for entry in entries {
            if providers.iter().any(|existing| existing.issuer == entry.issuer) {
                return Err(ProvidersConfigError::DuplicateIssuer(
                    entry.issuer.to_string(),
                ));
            }

            providers.push(Provider {
                issuer: entry.issuer,
                tokens: entry
                    .tokens
                    .into_iter()
                    .map(RequestTokenDigest::try_from)
                    .collect::<Result<_, _>>()?,
            });
        }

        Ok(Self { providers })
    }
}
