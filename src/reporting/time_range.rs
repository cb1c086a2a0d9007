//! `<integer><unit>` time range strings.
//!
//! Units: `h` hours, `d` days, `w` weeks, `m` months (30 days), `y` years
//! (365 days).

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{MonitorError, MonitorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Width of one series bucket for this range.
    #[serde(with = "bucket_secs")]
    pub bucket: Duration,
}

mod bucket_secs {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }
}

/// Parse a range string into its span.
pub fn parse_span(input: &str) -> MonitorResult<Duration> {
    let invalid = || {
        MonitorError::validation(format!(
            "invalid time range '{input}', expected <number><h|d|w|m|y>"
        ))
    };

    let unit = input.chars().last().ok_or_else(invalid)?;
    let digits = &input[..input.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }

    let hours_per_unit = match unit {
        'h' => 1,
        'd' => 24,
        'w' => 24 * 7,
        'm' => 24 * 30,
        'y' => 24 * 365,
        _ => return Err(invalid()),
    };
    amount
        .checked_mul(hours_per_unit)
        .and_then(Duration::try_hours)
        .ok_or_else(invalid)
}

/// Series bucket width for a span.
pub fn bucket_for(span: Duration) -> Duration {
    if span <= Duration::hours(1) {
        Duration::minutes(1)
    } else if span <= Duration::hours(24) {
        Duration::minutes(15)
    } else if span <= Duration::days(7) {
        Duration::hours(1)
    } else if span <= Duration::days(30) {
        Duration::hours(6)
    } else {
        Duration::days(1)
    }
}

/// Parse a range string ending at `now`.
pub fn parse_time_range(input: &str, now: DateTime<Utc>) -> MonitorResult<TimeRange> {
    let span = parse_span(input)?;
    let start = now.checked_sub_signed(span).ok_or_else(|| {
        MonitorError::validation(format!("time range '{input}' reaches before the representable past"))
    })?;
    Ok(TimeRange {
        start,
        end: now,
        bucket: bucket_for(span),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seven_days() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let range = parse_time_range("7d", now).unwrap();
        assert_eq!(range.start, now - Duration::hours(7 * 24));
        assert_eq!(range.end, now);
        assert_eq!(range.bucket, Duration::hours(1));
    }

    #[test]
    fn test_units() {
        assert_eq!(parse_span("3h").unwrap(), Duration::hours(3));
        assert_eq!(parse_span("2w").unwrap(), Duration::days(14));
        assert_eq!(parse_span("1m").unwrap(), Duration::days(30));
        assert_eq!(parse_span("1y").unwrap(), Duration::days(365));
    }

    #[test]
    fn test_rejects_garbage() {
        for input in ["bogus", "", "d", "7", "-1d", "7x", "1.5h", "0h", " 7d", "99999999999999999999y"] {
            assert!(
                matches!(parse_span(input), Err(MonitorError::Validation(_))),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn test_bucket_sizes() {
        assert_eq!(bucket_for(Duration::hours(1)), Duration::minutes(1));
        assert_eq!(bucket_for(Duration::hours(24)), Duration::minutes(15));
        assert_eq!(bucket_for(Duration::days(7)), Duration::hours(1));
        assert_eq!(bucket_for(Duration::days(30)), Duration::hours(6));
        assert_eq!(bucket_for(Duration::days(365)), Duration::days(1));
    }
}
