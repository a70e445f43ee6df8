//! Shared timestamp parsing utilities for event record import and value comparisons

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Parse a timestamp string to `DateTime<FixedOffset>`, trying multiple formats.
///
/// Used when importing raw event records and when string literals are compared against timestamps.
///
/// # Supported Formats (in order of precedence)
/// 1. Custom format (if provided) - tries both with timezone and as naive (assumes UTC)
/// 2. RFC3339: `2023-10-06T09:30:21+00:00`
/// 3. ISO 8601 with offset (no colon): `2023-10-06T09:30:21+0000`
/// 4. RFC2822: `Fri, 06 Oct 2023 09:30:21 +0000`
/// 5. Naive datetime with fractional seconds: `2023-10-06 09:30:21.890421` (assumes UTC)
/// 6. Naive ISO 8601 with fractional seconds: `2023-10-06T09:30:21.348555` (assumes UTC)
/// 7. Naive datetime with minutes only: `2023-10-06 09:30` (assumes UTC)
/// 8. Naive with UTC suffix: `2023-10-06 09:30:21 UTC`
/// 9. Plain date: `2023-10-06` (midnight UTC)
///
/// Returns `None` if no format matches.
pub fn parse_timestamp(time: &str, custom_format: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let time = time.trim();
    if time.is_empty() {
        return None;
    }

    if let Some(date_format) = custom_format {
        if let Ok(dt) = DateTime::parse_from_str(time, date_format) {
            return Some(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(time, date_format) {
            return Some(dt.and_utc().into());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(time) {
        return Some(dt);
    }

    // +0000 timezone (no colon)
    if let Ok(dt) = DateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(time) {
        return Some(dt);
    }

    // Spreadsheet exports usually look like "2023-10-06 09:30:21.890421"
    if let Ok(dt) = NaiveDateTime::parse_from_str(time, "%F %T%.f") {
        return Some(dt.and_utc().into());
    }

    // Also handles "2022-01-09T15:00:00"
    if let Ok(dt) = NaiveDateTime::parse_from_str(time, "%FT%T%.f") {
        return Some(dt.and_utc().into());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(time, "%F %H:%M") {
        return Some(dt.and_utc().into());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(time, "%F %T UTC") {
        return Some(dt.and_utc().into());
    }

    if let Ok(date) = NaiveDate::parse_from_str(time, "%F") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().into());
    }

    tracing::trace!(timestamp = time, "failed to parse timestamp");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        assert!(parse_timestamp("2023-10-06T09:30:21+00:00", None).is_some());
    }

    #[test]
    fn test_naive_datetime() {
        assert!(parse_timestamp("2023-10-06 09:30:21.890421", None).is_some());
        assert!(parse_timestamp("2023-10-06 09:30", None).is_some());
    }

    #[test]
    fn test_naive_iso() {
        let dt = parse_timestamp("2023-10-06T09:30:21", None).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_plain_date() {
        let dt = parse_timestamp("2023-10-06", None).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-10-06T00:00:00+00:00");
    }

    #[test]
    fn test_custom_format() {
        assert!(parse_timestamp("06/10/2023 09:30:21", Some("%d/%m/%Y %H:%M:%S")).is_some());
    }

    #[test]
    fn test_invalid() {
        assert!(parse_timestamp("not a date", None).is_none());
        assert!(parse_timestamp("   ", None).is_none());
    }
}
