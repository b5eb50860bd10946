//! Attempts Domain Concerns

pub mod events;
pub mod issuers;
pub mod poll;
pub mod tokens;
