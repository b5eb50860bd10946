//! Bucket naming.

use jiff::{RoundMode, Timestamp, TimestampRound, Unit};

use crate::domain::events::records::IssuerId;

const BUCKET_NAMESPACE: &str = "attempts-api-events";

/// Prefix shared by every bucket of `issuer`, including the trailing separator.
#[must_use]
pub fn issuer_prefix(issuer: &IssuerId) -> String {
    format!("{BUCKET_NAMESPACE}:{issuer}:")
}

/// Bucket holding events enqueued during the hour containing `timestamp`.
///
/// # Errors
///
/// Returns an error when the timestamp cannot be truncated to the hour.
pub fn bucket_for(issuer: &IssuerId, timestamp: Timestamp) -> Result<String, jiff::Error> {
    let hour = timestamp.round(
        TimestampRound::new()
            .smallest(Unit::Hour)
            .mode(RoundMode::Trunc),
    )?;

    Ok(format!("{}{hour}", issuer_prefix(issuer)))
}

/// Whether `bucket` belongs to `issuer`.
///
/// The remainder after the issuer prefix must be a timestamp, so a prefix such
/// as `sp1` never captures buckets of `sp1:other`.
#[must_use]
pub fn belongs_to(issuer: &IssuerId, bucket: &str) -> bool {
    bucket
        .strip_prefix(&issuer_prefix(issuer))
        .is_some_and(|hour| hour.parse::<Timestamp>().is_ok())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn bucket_is_floored_to_the_hour() -> TestResult {
        let issuer = IssuerId::from("sp1");
        let timestamp: Timestamp = "2026-10-16T13:47:12.345Z".parse()?;

        assert_eq!(
            bucket_for(&issuer, timestamp)?,
            "attempts-api-events:sp1:2026-10-16T13:00:00Z"
        );

        Ok(())
    }

    #[test]
    fn buckets_of_other_issuers_sharing_a_prefix_are_rejected() -> TestResult {
        let issuer = IssuerId::from("sp1");
        let other = IssuerId::from("sp1:other");
        let timestamp: Timestamp = "2026-10-16T13:00:00Z".parse()?;

        assert!(belongs_to(&issuer, &bucket_for(&issuer, timestamp)?));
        assert!(!belongs_to(&issuer, &bucket_for(&other, timestamp)?));
        assert!(!belongs_to(&issuer, "attempts-api-events:sp10:2026-10-16T13:00:00Z"));

        Ok(())
    }
}
