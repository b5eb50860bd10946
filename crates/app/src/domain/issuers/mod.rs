//! Issuers
//!
//! Poll callers authenticate with `Authorization: Bearer <issuer> <token>`.
//! Tokens are never stored; each configured provider lists scrypt digests of
//! the tokens it may present.

pub mod authorization;
pub mod digest;
pub mod errors;
pub mod records;
pub mod service;

pub use authorization::parse_authorization;
pub use errors::{DigestError, IssuerAuthError, ProvidersConfigError};
pub use service::*;
