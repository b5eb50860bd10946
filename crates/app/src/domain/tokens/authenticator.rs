//! Token authenticator.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::tokens::{AuthenticatorError, records::AuthToken};

#[automock]
#[async_trait]
/// Fetches a brand new credential from the vendor.
pub trait Authenticator: Send + Sync {
    /// Request a new token. The result never carries a sliding expiry.
    async fn retrieve_token(&self) -> Result<AuthToken, AuthenticatorError>;
}
