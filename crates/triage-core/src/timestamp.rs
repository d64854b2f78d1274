// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ISO-8601 timestamp parsing and the canonical storage formats.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

/// Storage format for `occurred_at`. Lexicographic order matches time order.
const OCCURRED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Naive layouts accepted for source timestamps, tried in order.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp as supplied by a source system.
///
/// Accepts date-only values (midnight), naive date-times with `T` or a space
/// separator and optional fractional seconds, and offset-qualified values,
/// which are normalized to UTC.
pub fn parse_iso8601(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.naive_utc());
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, layout) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Formats `occurred_at` for storage.
pub fn format_occurred_at(dt: &NaiveDateTime) -> String {
    dt.format(OCCURRED_AT_FORMAT).to_string()
}

/// Parses a stored `occurred_at` value.
pub fn parse_occurred_at(stored: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stored, OCCURRED_AT_FORMAT).ok()
}

/// Formats `processed_at` for storage (RFC 3339, microseconds, `Z`).
pub fn format_processed_at(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored `processed_at` value.
pub fn parse_processed_at(stored: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(stored)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Current time truncated to the precision kept in storage.
pub fn now_for_storage() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_plain_iso_datetime() {
        let dt = parse_iso8601("2024-01-01T10:00:00").unwrap();
        assert_eq!(dt.to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn parses_space_separator_and_fraction() {
        let dt = parse_iso8601("2024-03-05 08:15:30.250").unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn parses_date_only_as_midnight() {
        let dt = parse_iso8601("2024-02-29").unwrap();
        assert_eq!(dt.to_string(), "2024-02-29 00:00:00");
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        let dt = parse_iso8601("2024-01-01T10:00:00+02:00").unwrap();
        assert_eq!(dt.to_string(), "2024-01-01 08:00:00");
        let z = parse_iso8601("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(z.to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_iso8601("").is_none());
        assert!(parse_iso8601("yesterday").is_none());
        assert!(parse_iso8601("2024-13-01T00:00:00").is_none());
    }

    #[test]
    fn occurred_at_storage_round_trips() {
        for input in ["2024-01-01T10:00:00", "2024-01-01T10:00:00.123456789"] {
            let dt = parse_iso8601(input).unwrap();
            let stored = format_occurred_at(&dt);
            assert_eq!(parse_occurred_at(&stored), Some(dt));
        }
    }

    #[test]
    fn occurred_at_storage_orders_lexicographically() {
        let a = format_occurred_at(&parse_iso8601("2024-01-01T10:00:00").unwrap());
        let b = format_occurred_at(&parse_iso8601("2024-01-01T10:00:00.5").unwrap());
        let c = format_occurred_at(&parse_iso8601("2024-01-01T10:00:01").unwrap());
        assert!(a < b && b < c);
    }

    #[test]
    fn processed_at_storage_round_trips() {
        let now = now_for_storage();
        let stored = format_processed_at(&now);
        assert!(stored.ends_with('Z'));
        assert_eq!(parse_processed_at(&stored), Some(now));
    }
}
