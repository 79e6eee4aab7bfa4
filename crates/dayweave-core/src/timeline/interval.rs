//! Day-relative intervals: busy time, the sleep window, and the planning window.

use serde::{Deserialize, Serialize};

use crate::clock::{self, DAY_MINUTES};
use crate::error::ValidationError;

/// A half-open `[start, end)` range in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    #[serde(with = "clock::hhmm")]
    pub start: u32,
    #[serde(with = "clock::hhmm")]
    pub end: u32,
}

/// Time the user is already committed to. Immutable once built.
pub type BusyInterval = Span;

impl Span {
    /// Create a span, rejecting empty, inverted or out-of-day ranges.
    pub fn new(start: u32, end: u32) -> Result<Self, ValidationError> {
        if end > DAY_MINUTES {
            return Err(ValidationError::OutOfDay { value: end });
        }
        if end <= start {
            return Err(ValidationError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse a span from two `HH:MM` strings.
    pub fn from_hhmm(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(clock::parse_hhmm(start)?, clock::parse_hhmm(end)?)
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the two half-open ranges share at least one minute.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// The nightly sleep window. May wrap past midnight (e.g. 23:00-07:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow {
    #[serde(with = "clock::hhmm")]
    pub start: u32,
    #[serde(with = "clock::hhmm")]
    pub end: u32,
}

impl SleepWindow {
    /// Build a sleep window. A window whose start equals its end would cover
    /// the whole day and is rejected.
    pub fn new(start: u32, end: u32) -> Result<Self, ValidationError> {
        for value in [start, end] {
            if value > DAY_MINUTES {
                return Err(ValidationError::OutOfDay { value });
            }
        }
        if start % DAY_MINUTES == end % DAY_MINUTES {
            return Err(ValidationError::SleepWindowTooLong {
                start: clock::format_hhmm(start),
                end: clock::format_hhmm(end),
            });
        }
        Ok(Self { start, end })
    }

    pub fn from_hhmm(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(clock::parse_hhmm(start)?, clock::parse_hhmm(end)?)
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Sleep expressed as one or two busy intervals inside a single day.
    pub fn day_intervals(&self) -> Vec<BusyInterval> {
        if self.wraps_midnight() {
            [(self.start, DAY_MINUTES), (0, self.end)]
                .into_iter()
                .filter(|(s, e)| s < e)
                .map(|(start, end)| Span { start, end })
                .collect()
        } else {
            vec![Span {
                start: self.start,
                end: self.end,
            }]
        }
    }
}

impl Default for SleepWindow {
    fn default() -> Self {
        Self {
            start: 23 * 60,
            end: 7 * 60,
        }
    }
}

/// The part of the day the planner may use. Defaults to the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    #[serde(with = "clock::hhmm")]
    pub start: u32,
    #[serde(with = "clock::hhmm")]
    pub end: u32,
}

impl DayWindow {
    pub fn new(start: u32, end: u32) -> Result<Self, ValidationError> {
        let span = Span::new(start, end)?;
        Ok(Self {
            start: span.start,
            end: span.end,
        })
    }

    pub fn as_span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }
}

impl Default for DayWindow {
    fn default() -> Self {
        Self {
            start: 0,
            end: DAY_MINUTES,
        }
    }
}
