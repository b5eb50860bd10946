//! Time source abstraction.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use jiff::{SignedDuration, Timestamp};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Timestamp;

    /// Current instant as fractional seconds since the Unix epoch.
    fn epoch_seconds(&self) -> f64 {
        epoch_seconds(self.now())
    }
}

/// Convert a timestamp into fractional seconds since the Unix epoch.
#[must_use]
pub fn epoch_seconds(timestamp: Timestamp) -> f64 {
    timestamp.as_duration().as_secs_f64()
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Shared handle to the system clock.
#[must_use]
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Manually driven clock for tests and simulations.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<Mutex<Timestamp>>,
}

impl MockClock {
    #[must_use]
    pub fn new(initial: Timestamp) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
        }
    }

    /// Move the clock forward (or backward, for negative durations).
    pub fn advance(&self, duration: SignedDuration) {
        if let Ok(mut current) = self.current.lock() {
            *current = current.saturating_add(duration).unwrap_or(*current);
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: Timestamp) {
        if let Ok(mut current) = self.current.lock() {
            *current = instant;
        }
    }
}

impl fmt::Debug for MockClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockClock").field("now", &self.now()).finish()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        self.current
            .lock()
            .map_or(Timestamp::UNIX_EPOCH, |current| *current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_advances() {
        let clock = MockClock::new(Timestamp::from_second(1_000).unwrap_or_default());

        clock.advance(SignedDuration::from_secs(30));

        assert_eq!(clock.now().as_second(), 1_030);
        assert!((clock.epoch_seconds() - 1_030.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mock_clock_set_overrides_current_time() {
        let clock = MockClock::new(Timestamp::UNIX_EPOCH);

        clock.set(Timestamp::from_second(42).unwrap_or_default());

        assert_eq!(clock.now().as_second(), 42);
    }

    #[test]
    fn epoch_seconds_keeps_fractional_part() {
        let timestamp = Timestamp::from_millisecond(1_500).unwrap_or_default();

        assert!((epoch_seconds(timestamp) - 1.5).abs() < f64::EPSILON);
    }
}
