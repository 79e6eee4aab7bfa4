//! Placed tasks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::TaskCandidate;
use crate::clock::{self, DAY_MINUTES};
use crate::error::ValidationError;
use crate::timeline::Span;

/// Reason reported for tasks that fit no slot.
pub const NO_SLOT_REASON: &str = "no available slot of sufficient length";

/// A task placed at a concrete time on a concrete day.
///
/// Owned by the caller once created; only the drag path or an explicit
/// edit changes its times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub stable_id: String,
    pub task_name: String,
    pub duration_minutes: u32,
    pub assigned_date: NaiveDate,
    #[serde(with = "clock::hhmm")]
    pub assigned_start: u32,
    #[serde(with = "clock::hhmm")]
    pub assigned_end: u32,
    #[serde(default)]
    pub source_slot_id: String,
    #[serde(default)]
    pub fit_score: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl Proposal {
    /// Hand-made proposal, e.g. re-hydrated from storage or added by the user.
    pub fn manual(
        stable_id: impl Into<String>,
        task_name: impl Into<String>,
        date: NaiveDate,
        start: u32,
        end: u32,
    ) -> Result<Self, ValidationError> {
        let span = Span::new(start, end)?;
        Ok(Self {
            stable_id: stable_id.into(),
            task_name: task_name.into(),
            duration_minutes: span.duration_minutes(),
            assigned_date: date,
            assigned_start: span.start,
            assigned_end: span.end,
            source_slot_id: String::new(),
            fit_score: 0.0,
            reasoning: String::new(),
        })
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.assigned_start,
            end: self.assigned_end.max(self.assigned_start),
        }
    }

    /// Move to `start`, keeping the duration. Clamped so the proposal stays inside the day.
    pub fn move_to(&mut self, start: u32) {
        let duration = self.duration_minutes.min(DAY_MINUTES);
        self.assigned_start = start.min(DAY_MINUTES - duration);
        self.assigned_end = self.assigned_start + duration;
    }
}

/// A task the assigner could not place. Data, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnscheduledTask {
    pub task: TaskCandidate,
    pub reason: String,
}

impl UnscheduledTask {
    pub fn no_slot(task: TaskCandidate) -> Self {
        Self {
            task,
            reason: NO_SLOT_REASON.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_manual_proposal() {
        let p = Proposal::manual("p1", "Walk", date(), 600, 630).unwrap();
        assert_eq!(p.duration_minutes, 30);
        assert!(Proposal::manual("p2", "Walk", date(), 630, 600).is_err());
    }

    #[test]
    fn test_move_to_clamps_inside_day() {
        let mut p = Proposal::manual("p1", "Walk", date(), 600, 690).unwrap();
        p.move_to(1430);
        assert_eq!((p.assigned_start, p.assigned_end), (1350, 1440));
        p.move_to(0);
        assert_eq!((p.assigned_start, p.assigned_end), (0, 90));
    }

    #[test]
    fn test_times_serialize_as_clock_strings() {
        let p = Proposal::manual("p1", "Walk", date(), 585, 615).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["assignedStart"], "09:45");
        assert_eq!(json["assignedEnd"], "10:15");
        assert_eq!(json["assignedDate"], "2024-06-01");

        let back: Proposal = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
