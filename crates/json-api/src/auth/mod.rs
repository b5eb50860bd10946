//! Issuer authentication

pub(crate) mod middleware;
