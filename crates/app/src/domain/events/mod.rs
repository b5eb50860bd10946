//! Security event queue.
//!
//! Events are grouped per issuer into hourly hash buckets named
//! `attempts-api-events:{issuer}:{hour}` where `hour` is the RFC 3339 UTC
//! timestamp of the start of the hour the event was enqueued in.

pub mod buckets;
pub mod errors;
pub mod records;
pub mod service;

pub use errors::EventQueueError;
pub use service::*;
