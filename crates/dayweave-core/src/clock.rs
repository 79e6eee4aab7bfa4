//! Minutes-since-midnight time representation.
//!
//! Every time value that enters the engine is normalized here exactly once:
//! bare `HH:MM` strings and ISO-8601 timestamps become a [`TimeValue`], and
//! a `TimeValue` is projected onto the rendered day as a minute in
//! `[0, DAY_MINUTES]`. Nothing past this boundary re-parses strings.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Minutes in a day. Day-relative times live in `[0, DAY_MINUTES]`.
pub const DAY_MINUTES: u32 = 1440;

/// Parse a bare `HH:MM` clock time into minutes since midnight.
///
/// `24:00` is accepted and maps to [`DAY_MINUTES`] so that a range can end at
/// midnight.
pub fn parse_hhmm(value: &str) -> Result<u32, ValidationError> {
    let malformed = || ValidationError::MalformedTime {
        value: value.to_string(),
    };

    let (hours, minutes) = value.trim().split_once(':').ok_or_else(malformed)?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(malformed());
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let hours: u32 = hours.parse().map_err(|_| malformed())?;
    let minutes: u32 = minutes.parse().map_err(|_| malformed())?;

    match (hours, minutes) {
        (24, 0) => Ok(DAY_MINUTES),
        (h, m) if h < 24 && m < 60 => Ok(h * 60 + m),
        _ => Err(malformed()),
    }
}

/// Format minutes since midnight as `HH:MM`. Values past the day saturate at `24:00`.
pub fn format_hhmm(minutes: u32) -> String {
    let minutes = minutes.min(DAY_MINUTES);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::MalformedDate {
            value: value.to_string(),
        }
    })
}

/// Round `value` (minutes) to the nearest multiple of `step`.
///
/// Halves round away from zero. A zero step leaves the value unrounded.
pub fn snap_to_grid(value: f64, step: u32) -> i64 {
    if step == 0 {
        return value.round() as i64;
    }
    let step = f64::from(step);
    ((value / step).round() * step) as i64
}

/// Clamp a signed minute into `[lo, hi]` and return it as a day minute.
pub fn clamp_minute(value: i64, lo: u32, hi: u32) -> u32 {
    value.clamp(i64::from(lo), i64::from(hi.max(lo))) as u32
}

/// A time value as it arrives from a collaborator.
///
/// The variant records which format was supplied, so the projection onto a
/// day is explicit instead of guessed at every use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeValue {
    /// Bare wall-clock time on the rendered day.
    Clock(u32),
    /// ISO timestamp without an offset, read as local wall time.
    Local(NaiveDateTime),
    /// ISO timestamp with an offset; its wall time in that offset is used.
    Instant(DateTime<FixedOffset>),
}

impl TimeValue {
    /// Parse `HH:MM`, `YYYY-MM-DDTHH:MM[:SS]`, or RFC 3339.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if let Ok(minutes) = parse_hhmm(trimmed) {
            return Ok(Self::Clock(minutes));
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::Instant(instant));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(local) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::Local(local));
            }
        }
        Err(ValidationError::MalformedTime {
            value: value.to_string(),
        })
    }

    /// Wall time of an ISO value; `None` for a bare clock time.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Clock(_) => None,
            Self::Local(local) => Some(*local),
            Self::Instant(instant) => Some(instant.naive_local()),
        }
    }

    /// Project onto `date` as minutes since midnight.
    ///
    /// Timestamps on an earlier day map to 0, on a later day to [`DAY_MINUTES`].
    pub fn to_day_minute(&self, date: NaiveDate) -> u32 {
        match self {
            Self::Clock(minutes) => (*minutes).min(DAY_MINUTES),
            Self::Local(local) => project(*local, date),
            Self::Instant(instant) => project(instant.naive_local(), date),
        }
    }
}

fn project(at: NaiveDateTime, date: NaiveDate) -> u32 {
    if at.date() < date {
        0
    } else if at.date() > date {
        DAY_MINUTES
    } else {
        at.hour() * 60 + at.minute()
    }
}

impl TryFrom<String> for TimeValue {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeValue> for String {
    fn from(value: TimeValue) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(minutes) => f.write_str(&format_hhmm(*minutes)),
            Self::Local(local) => write!(f, "{}", local.format("%Y-%m-%dT%H:%M:%S")),
            Self::Instant(instant) => f.write_str(&instant.to_rfc3339()),
        }
    }
}

/// Serde adapter storing a day minute as `"HH:MM"`.
pub mod hhmm {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(minutes: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*minutes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("00:00"), Ok(0));
        assert_eq!(parse_hhmm("07:30"), Ok(450));
        assert_eq!(parse_hhmm("7:05"), Ok(425));
        assert_eq!(parse_hhmm("23:59"), Ok(1439));
        assert_eq!(parse_hhmm("24:00"), Ok(DAY_MINUTES));
    }

    #[test]
    fn test_parse_hhmm_rejects_garbage() {
        for bad in ["", "7", "24:01", "12:60", "ab:cd", "12:5", "123:00", "-1:00"] {
            assert!(parse_hhmm(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_hhmm_digits_only() {
        for bad in ["+7:00", "7:+5", "+0:00", "1 :00", "12:0 "] {
            assert!(parse_hhmm(bad).is_err(), "accepted {bad:?}");
        }
        assert!(TimeValue::parse("+7:00").is_err());
        assert_eq!(parse_hhmm(" 7:05 ").unwrap(), 425);
    }

    #[test]
    fn test_format_hhmm() {
        assert_eq!(format_hhmm(0), "00:00");
        assert_eq!(format_hhmm(585), "09:45");
        assert_eq!(format_hhmm(DAY_MINUTES), "24:00");
        assert_eq!(format_hhmm(5000), "24:00");
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(47.0, 15), 45);
        assert_eq!(snap_to_grid(53.0, 15), 60);
        assert_eq!(snap_to_grid(7.5, 15), 15);
        assert_eq!(snap_to_grid(-47.0, 15), -45);
        assert_eq!(snap_to_grid(-7.0, 15), 0);
        assert_eq!(snap_to_grid(13.4, 0), 13);
    }

    #[test]
    fn test_clamp_minute() {
        assert_eq!(clamp_minute(-30, 0, 1440), 0);
        assert_eq!(clamp_minute(1500, 0, 1440), 1440);
        assert_eq!(clamp_minute(600, 0, 1440), 600);
    }

    #[test]
    fn test_time_value_parsing() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        let clock = TimeValue::parse("09:15").unwrap();
        assert_eq!(clock, TimeValue::Clock(555));

        let local = TimeValue::parse("2024-03-14T10:30:00").unwrap();
        assert!(matches!(local, TimeValue::Local(_)));
        assert_eq!(local.to_day_minute(date), 630);

        let zoned = TimeValue::parse("2024-03-14T18:00:00+02:00").unwrap();
        assert!(matches!(zoned, TimeValue::Instant(_)));
        assert_eq!(zoned.to_day_minute(date), 18 * 60);

        assert!(TimeValue::parse("tomorrow-ish").is_err());
    }

    #[test]
    fn test_time_value_projection_outside_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let before = TimeValue::parse("2024-03-13T22:00:00Z").unwrap();
        let after = TimeValue::parse("2024-03-15T01:00:00Z").unwrap();
        assert_eq!(before.to_day_minute(date), 0);
        assert_eq!(after.to_day_minute(date), DAY_MINUTES);
    }

    #[test]
    fn test_time_value_timestamp() {
        assert_eq!(TimeValue::parse("09:00").unwrap().timestamp(), None);
        let local = TimeValue::parse("2024-03-14T09:30").unwrap().timestamp().unwrap();
        assert_eq!((local.hour(), local.minute()), (9, 30));
        let offset = TimeValue::parse("2024-03-14T09:30:00+09:00").unwrap().timestamp().unwrap();
        assert_eq!(offset.hour(), 9);
    }

    #[test]
    fn test_time_value_serde_as_string() {
        let value: TimeValue = serde_json::from_str("\"08:00\"").unwrap();
        assert_eq!(value, TimeValue::Clock(480));
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"08:00\"");
        assert!(serde_json::from_str::<TimeValue>("\"8 o'clock\"").is_err());
    }
}
