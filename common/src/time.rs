//! Time helpers for rate cycles.
//!
//! Rates expire on whole-hour boundaries expressed as UTC epoch seconds.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A timestamp (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Epoch seconds of the first whole hour strictly after `at`.
///
/// An instant exactly on the hour still advances to the following hour.
pub fn next_hour_boundary(at: Timestamp) -> i64 {
    let seconds = at.timestamp();
    seconds - seconds.rem_euclid(SECONDS_PER_HOUR) + SECONDS_PER_HOUR
}

/// Whether the epoch second falls exactly on a UTC midnight.
pub fn is_day_boundary(epoch_seconds: i64) -> bool {
    epoch_seconds.rem_euclid(SECONDS_PER_DAY) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_hour_boundary() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 13, 42, 7).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();

        assert_eq!(next_hour_boundary(at), expected.timestamp());
    }

    #[test]
    fn test_next_hour_boundary_on_the_hour() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

        assert_eq!(next_hour_boundary(at), expected.timestamp());
        assert!(is_day_boundary(next_hour_boundary(at)));
    }

    #[test]
    fn test_is_day_boundary() {
        assert!(is_day_boundary(0));
        assert!(is_day_boundary(SECONDS_PER_DAY * 19_000));
        assert!(!is_day_boundary(SECONDS_PER_DAY * 19_000 + SECONDS_PER_HOUR));
    }
}
