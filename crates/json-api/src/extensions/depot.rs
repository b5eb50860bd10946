//! Depot helper extensions.

use std::any::Any;

use attempts_app::domain::events::records::IssuerId;
use salvo::prelude::{Depot, StatusError};

const ISSUER_DEPOT_KEY: &str = "attempts.issuer";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }
}

/// Authenticated issuer of the current request.
pub(crate) trait IssuerDepotExt {
    fn insert_issuer(&mut self, issuer: IssuerId);

    fn issuer(&self) -> Option<&IssuerId>;
}

impl IssuerDepotExt for Depot {
    fn insert_issuer(&mut self, issuer: IssuerId) {
        self.insert(ISSUER_DEPOT_KEY, issuer);
    }

    fn issuer(&self) -> Option<&IssuerId> {
        self.get::<IssuerId>(ISSUER_DEPOT_KEY).ok()
    }
}
