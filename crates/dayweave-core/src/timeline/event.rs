//! Calendar events as they arrive from the calendar collaborator, and their
//! projection onto the rendered day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::interval::{BusyInterval, Span};
use crate::clock::{TimeValue, DAY_MINUTES};
use crate::error::ValidationError;

/// An event from the user's calendar. Times may be bare `HH:MM` or ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: TimeValue,
    pub end: TimeValue,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: TimeValue,
        end: TimeValue,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
        }
    }

    /// Reject an event whose ISO end comes before its ISO start.
    ///
    /// Clock-time events may end "before" they start: they run past midnight.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (self.start.timestamp(), self.end.timestamp()) {
            if end < start {
                return Err(ValidationError::InvalidValue {
                    field: format!("event '{}'", self.id),
                    message: format!("ends ({}) before it starts ({})", self.end, self.start),
                });
            }
        }
        Ok(())
    }

    /// The part of this event that falls on `date`, if any.
    ///
    /// A clock-time event whose end precedes its start runs past midnight and
    /// is cut at the end of the day. Zero-length events, events on other
    /// days and events that fail [`validate`](Self::validate) yield `None`.
    pub fn project(&self, date: NaiveDate) -> Option<FixedEntry> {
        if let Err(e) = self.validate() {
            tracing::warn!(event = %self.id, error = %e, "skipping malformed event");
            return None;
        }
        let start = self.start.to_day_minute(date);
        let mut end = self.end.to_day_minute(date);

        if let (TimeValue::Clock(_), TimeValue::Clock(_)) = (&self.start, &self.end) {
            if end < start {
                end = DAY_MINUTES;
            }
        }

        Span::new(start, end).ok().map(|span| FixedEntry {
            id: self.id.clone(),
            title: self.title.clone(),
            span,
        })
    }
}

/// A fixed (non-movable) item on the rendered day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedEntry {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub span: Span,
}

impl FixedEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, span: Span) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            span,
        }
    }

    pub fn busy(&self) -> BusyInterval {
        self.span
    }
}

/// Project every event onto `date`, dropping those that don't touch it.
pub fn project_events(events: &[CalendarEvent], date: NaiveDate) -> Vec<FixedEntry> {
    events.iter().filter_map(|e| e.project(date)).collect()
}
