//! Poll Data

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::poll::PollServiceError;

/// Number of events a single poll may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BatchSize(u16);

impl BatchSize {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(1000);

    /// Validate a numeric batch size.
    ///
    /// # Errors
    ///
    /// Returns [`PollServiceError::InvalidMaxEvents`] outside `[1, 1000]`.
    pub fn new(value: i64) -> Result<Self, PollServiceError> {
        u16::try_from(value)
            .ok()
            .map(Self)
            .filter(|size| (Self::MIN..=Self::MAX).contains(size))
            .ok_or(PollServiceError::InvalidMaxEvents)
    }

    /// Validate a raw `maxEvents` value.
    ///
    /// # Errors
    ///
    /// Returns [`PollServiceError::InvalidMaxEvents`] unless the value is an
    /// integer or integer string in `[1, 1000]`.
    pub fn parse(raw: &MaxEvents) -> Result<Self, PollServiceError> {
        match raw {
            MaxEvents::Integer(value) => Self::new(*value),
            MaxEvents::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_not_integer| PollServiceError::InvalidMaxEvents)
                .and_then(Self::new),
            MaxEvents::Other(_) => Err(PollServiceError::InvalidMaxEvents),
        }
    }

    #[must_use]
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `maxEvents` exactly as the caller sent it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MaxEvents {
    Integer(i64),
    Text(String),
    Other(serde_json::Value),
}

impl From<i64> for MaxEvents {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for MaxEvents {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Poll Request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollRequest {
    /// Event keys the caller has received and wants deleted.
    pub ack: Option<Vec<String>>,

    pub max_events: Option<MaxEvents>,
}
