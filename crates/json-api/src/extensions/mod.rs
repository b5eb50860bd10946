//! Extension traits

mod depot;
mod response;

pub(crate) use depot::DepotExt as _;
pub(crate) use depot::IssuerDepotExt as _;
pub(crate) use response::ErrorResponse;
pub(crate) use response::ErrorResponseExt as _;
