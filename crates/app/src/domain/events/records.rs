//! Event Records

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Relying party identifier scoping queues and request tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuerId(String);

impl IssuerId {
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self(issuer.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IssuerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One queued security event token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityEvent {
    /// Event key (`jti`), unique per issuer.
    pub key: String,

    /// Opaque serialized token.
    pub payload: String,
}

/// Events returned by a single read, in delivery order.
///
/// Serializes as a JSON object mapping event keys to payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBatch {
    events: Vec<SecurityEvent>,
}

impl EventBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SecurityEvent) {
        self.events.push(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SecurityEvent> {
        self.events.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|event| event.key.as_str())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys().any(|existing| existing == key)
    }

    #[must_use]
    pub fn payload(&self, key: &str) -> Option<&str> {
        self.events
            .iter()
            .find(|event| event.key == key)
            .map(|event| event.payload.as_str())
    }
}

impl FromIterator<SecurityEvent> for EventBatch {
    fn from_iter<T: IntoIterator<Item = SecurityEvent>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EventBatch {
    type Item = SecurityEvent;
    type IntoIter = std::vec::IntoIter<SecurityEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl Serialize for EventBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.events
                .iter()
                .map(|event| (event.key.as_str(), event.payload.as_str())),
        )
    }
}
