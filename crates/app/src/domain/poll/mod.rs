//! Poll
//!
//! Acknowledge-then-read orchestration behind the poll endpoint.

pub mod data;
pub mod errors;
pub mod records;
pub mod service;

pub use errors::PollServiceError;
pub use service::*;
