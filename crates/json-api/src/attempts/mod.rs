//! Attempts API

pub(crate) mod errors;
pub(crate) mod gate;
pub(crate) mod handlers;

pub(crate) use handlers::*;
