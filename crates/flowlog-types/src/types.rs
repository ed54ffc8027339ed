//! Core types for logged device data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ParseError, ParseResult};

/// A single logged measurement.
///
/// One record is written per successful pattern extraction. Records are
/// immutable once written; the value is stored exactly as reported by the
/// device (unscaled).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Seconds since the Unix epoch when the value was captured.
    pub timestamp: i64,
    /// Raw device value (seconds of flow for the default marker).
    pub value: f64,
}

impl Record {
    /// Create a record from its parts.
    #[must_use]
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Create a record stamped with the current wall-clock time.
    #[must_use]
    pub fn now(value: f64) -> Self {
        Self::new(OffsetDateTime::now_utc().unix_timestamp(), value)
    }

    /// The capture time as an [`OffsetDateTime`] in UTC.
    ///
    /// Returns `None` if the timestamp is outside the range `time` supports.
    #[must_use]
    pub fn captured_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.timestamp).ok()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.timestamp, self.value)
    }
}

/// Parse a device value, trimming surrounding whitespace.
///
/// # Examples
///
/// ```
/// use flowlog_types::parse_value;
///
/// assert_eq!(parse_value(" 2.5 ").unwrap(), 2.5);
/// assert!(parse_value("abc").is_err());
/// assert!(parse_value("inf").is_err());
/// ```
pub fn parse_value(text: &str) -> ParseResult<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ParseError::InvalidValue(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(ParseError::NonFinite(trimmed.to_string()));
    }
    Ok(value)
}

/// Local calendar day used to group records when reporting.
///
/// Derived from a record's timestamp at report time and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DayBucket {
    /// Calendar year.
    pub year: i32,
    /// Day of the year, starting at 1.
    pub ordinal: u32,
}

impl DayBucket {
    /// Create a bucket from a year and a 1-based day of the year.
    #[must_use]
    pub fn new(year: i32, ordinal: u32) -> Self {
        Self { year, ordinal }
    }
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.year, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_decimal() {
        assert_eq!(parse_value("2.35").unwrap(), 2.35);
        assert_eq!(parse_value("  7 ").unwrap(), 7.0);
        assert_eq!(parse_value("-0.5").unwrap(), -0.5);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        assert_eq!(
            parse_value("12s"),
            Err(ParseError::InvalidValue("12s".to_string()))
        );
        assert!(parse_value("").is_err());
    }

    #[test]
    fn test_parse_value_rejects_non_finite() {
        assert_eq!(
            parse_value("NaN"),
            Err(ParseError::NonFinite("NaN".to_string()))
        );
        assert!(parse_value("inf").is_err());
    }

    #[test]
    fn test_record_display_matches_file_format() {
        let record = Record::new(1_700_000_000, 2.5);
        assert_eq!(record.to_string(), "1700000000,2.5");
    }

    #[test]
    fn test_record_captured_at() {
        let record = Record::new(0, 1.0);
        assert_eq!(record.captured_at(), Some(OffsetDateTime::UNIX_EPOCH));
        assert!(Record::new(i64::MAX, 1.0).captured_at().is_none());
    }

    #[test]
    fn test_record_now_is_recent() {
        let before = OffsetDateTime::now_utc().unix_timestamp();
        let record = Record::now(3.0);
        assert!(record.timestamp >= before);
        assert_eq!(record.value, 3.0);
    }

    #[test]
    fn test_day_bucket_ordering() {
        let a = DayBucket::new(2024, 366);
        let b = DayBucket::new(2025, 1);
        assert!(a < b);
        assert_eq!(b.to_string(), "2025-001");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_serde_json() {
        let record = Record::new(1_700_000_000, 4.25);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"timestamp":1700000000,"value":4.25}"#);
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
