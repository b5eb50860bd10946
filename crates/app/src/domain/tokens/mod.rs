//! Vendor API tokens.
//!
//! A single cached credential is shared by every process through a
//! [`KeyValueStore`](crate::storage::KeyValueStore). Refresh strategies decide
//! on each acquisition whether to serve the cached token, claim a refresh by
//! extending its sliding window, or fetch a new one.

pub mod arcgis;
mod authenticator;
pub mod cache;
pub mod errors;
pub mod keeper;
pub mod records;
pub mod retry;
pub mod strategy;

pub use authenticator::*;
pub use errors::{AuthenticatorError, TokenError};
pub use keeper::{TokenKeeper, TokenKeeperConfig};
pub use strategy::{RefreshStrategy, SlidingWindow};
