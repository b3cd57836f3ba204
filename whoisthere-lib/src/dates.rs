//! Lenient parsing of WHOIS expiration dates.
//!
//! Registries print dates in many layouts. This module tries a fixed table
//! of known formats and treats values without an offset as UTC.

use crate::error::WhoisThereError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats carrying an explicit offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Date-time formats without an offset.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d-%b-%Y %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Plain date formats.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%Y%m%d",
];

/// Parse an expiration date as printed by a WHOIS server.
///
/// # Examples
///
/// ```rust
/// use whoisthere_lib::parse_expiration_date;
///
/// assert!(parse_expiration_date("2021-01-01").is_ok());
/// assert!(parse_expiration_date("2021-0111-01 12:00:00").is_err());
/// ```
pub fn parse_expiration_date(input: &str) -> Result<DateTime<Utc>, WhoisThereError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WhoisThereError::date(input));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    let naive = strip_utc_marker(trimmed);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc());
            }
        }
    }

    Err(WhoisThereError::date(input))
}

/// Drop a trailing zone marker that means UTC anyway.
fn strip_utc_marker(value: &str) -> &str {
    for marker in ["(UTC)", " UTC", " GMT", "Z"] {
        if let Some(stripped) = value.strip_suffix(marker) {
            return stripped.trim_end();
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_plain_date() {
        let dt = parse_expiration_date("2021-01-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2021, 1, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_naive_datetime() {
        let dt = parse_expiration_date("2021-01-01 12:00:00").unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let dt = parse_expiration_date("2028-09-14T04:00:00Z").unwrap();
        assert_eq!(dt.year(), 2028);
        let dt = parse_expiration_date("2025-03-01T10:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
        let dt = parse_expiration_date("2025-03-01T10:00:00.0Z").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_registry_layouts() {
        for input in [
            "14-Aug-2024",
            "2024.08.14",
            "14.08.2024",
            "2024/08/14",
            "2024-08-14 00:00:00 UTC",
            "2024-08-14T00:00:00",
            "2024-08-14 00:00:00.000000",
        ] {
            let dt = parse_expiration_date(input)
                .unwrap_or_else(|e| panic!("failed on {:?}: {}", input, e));
            assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 8, 14), "{}", input);
        }
    }

    #[test]
    fn test_malformed_dates() {
        assert!(parse_expiration_date("2021-0111-01 12:00:00").is_err());
        assert!(parse_expiration_date("20211-01 12:00:00.000000").is_err());
        assert!(parse_expiration_date("").is_err());
        assert!(matches!(
            parse_expiration_date("never"),
            Err(WhoisThereError::DateError { .. })
        ));
    }
}
