//! Attempts Handlers

pub(crate) mod poll;
pub(crate) mod status;
