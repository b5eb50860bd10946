//! Attempts API event delivery and vendor token refresh.

pub mod clock;
pub mod context;
pub mod domain;
pub mod storage;

#[cfg(test)]
mod test;
