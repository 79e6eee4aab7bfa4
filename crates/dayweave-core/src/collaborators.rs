//! External collaborators the planner pulls its inputs from.
//!
//! The engine never fetches anything itself. Hosts hand in a
//! [`CalendarSource`] for fixed events and a [`TaskExtractor`] that turns
//! free text into [`TaskCandidate`]s.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::clock;
use crate::error::{CoreError, ValidationError};
use crate::scheduler::{Priority, TaskCandidate, TimeBucket};
use crate::timeline::CalendarEvent;

/// Source of the user's calendar events.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Events that may touch `date`. Events on other days are allowed and
    /// are dropped by the projection.
    async fn fetch_events(&self, date: NaiveDate) -> Result<Vec<CalendarEvent>, CoreError>;
}

/// Turns free text into task candidates.
#[async_trait]
pub trait TaskExtractor: Send + Sync {
    async fn extract(&self, text: &str, date: NaiveDate) -> Result<Vec<TaskCandidate>, CoreError>;
}

/// A fixed list of events.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    events: Vec<CalendarEvent>,
}

impl StaticCalendar {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl CalendarSource for StaticCalendar {
    async fn fetch_events(&self, _date: NaiveDate) -> Result<Vec<CalendarEvent>, CoreError> {
        Ok(self.events.clone())
    }
}

/// Events read from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonCalendarFile {
    path: PathBuf,
}

impl JsonCalendarFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and parse the file. Malformed times or an event ending before it
    /// starts fail the whole file.
    pub fn read(&self) -> Result<Vec<CalendarEvent>, CoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| CoreError::Collaborator {
            service: "calendar".into(),
            message: format!("{}: {e}", self.path.display()),
        })?;
        let events: Vec<CalendarEvent> = serde_json::from_str(&content)?;
        for event in &events {
            event.validate()?;
        }
        Ok(events)
    }
}

#[async_trait]
impl CalendarSource for JsonCalendarFile {
    async fn fetch_events(&self, _date: NaiveDate) -> Result<Vec<CalendarEvent>, CoreError> {
        self.read()
    }
}

/// Default duration when a line names none.
pub const DEFAULT_TASK_MINUTES: u32 = 30;

/// Offline extractor: one task per line.
///
/// Trailing tokens carry the details, everything before them is the name:
///
/// ```text
/// Breakfast 30m !high @morning
/// Write report 1h30m due:2024-06-03
/// Call the bank
/// ```
///
/// Durations take `m`, `min` and `h` suffixes; `!high|!medium|!low` sets the
/// priority and `@morning|@midday|@afternoon|@evening` the preferred bucket.
/// Blank lines and lines starting with `#` are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineTaskExtractor;

impl LineTaskExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Result<Vec<TaskCandidate>, ValidationError> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(parse_line)
            .collect()
    }
}

#[async_trait]
impl TaskExtractor for LineTaskExtractor {
    async fn extract(&self, text: &str, _date: NaiveDate) -> Result<Vec<TaskCandidate>, CoreError> {
        Ok(self.parse(text)?)
    }
}

fn parse_line(line: &str) -> Result<TaskCandidate, ValidationError> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    let mut task = TaskCandidate::new(String::new(), DEFAULT_TASK_MINUTES, Priority::Medium);

    while tokens.len() > 1 {
        let Some(&token) = tokens.last() else { break };
        if let Some(level) = token.strip_prefix('!') {
            task.priority = match level.to_ascii_lowercase().as_str() {
                "high" => Priority::High,
                "medium" => Priority::Medium,
                "low" => Priority::Low,
                _ => return Err(invalid("priority", token)),
            };
        } else if let Some(name) = token.strip_prefix('@') {
            task.preferred_bucket = Some(
                TimeBucket::ALL
                    .into_iter()
                    .find(|b| b.as_str().eq_ignore_ascii_case(name))
                    .ok_or_else(|| invalid("preferredBucket", token))?,
            );
        } else if let Some(date) = token.strip_prefix("due:") {
            task.deadline = Some(clock::parse_date(date)?);
        } else if let Some(minutes) = parse_duration(token) {
            task.duration_minutes = minutes;
        } else {
            break;
        }
        tokens.pop();
    }

    task.name = tokens.join(" ");
    task.validate()?;
    Ok(task)
}

/// `45m`, `45min`, `2h`, `1h30m`.
fn parse_duration(token: &str) -> Option<u32> {
    let token = token.to_ascii_lowercase();
    let (hours, rest) = match token.split_once('h') {
        Some((h, rest)) => (h.parse::<u32>().ok()?, rest),
        None => (0, token.as_str()),
    };
    let minutes = if rest.is_empty() {
        if hours == 0 {
            return None;
        }
        0
    } else {
        let digits = rest
            .strip_suffix("min")
            .or_else(|| rest.strip_suffix('m'))?;
        digits.parse::<u32>().ok()?
    };
    Some(hours * 60 + minutes)
}

fn invalid(field: &str, token: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: format!("unrecognized token '{token}'"),
    }
}
