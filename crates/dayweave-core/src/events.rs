//! Events emitted by the planner and the day board, tagged by `type` on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;

/// Every state change on a day board produces an Event.
/// Hosts render them as notifications; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Event {
    ScheduleGenerated {
        date: NaiveDate,
        scheduled: usize,
        unscheduled: usize,
        at: DateTime<Utc>,
    },
    ProposalsPersisted {
        date: NaiveDate,
        saved: usize,
        failed: usize,
        at: DateTime<Utc>,
    },
    /// Pointer released before the drag threshold.
    ItemClicked {
        item_id: String,
        at: DateTime<Utc>,
    },
    DragStarted {
        proposal_id: String,
        pointer_id: u32,
        at: DateTime<Utc>,
    },
    /// Drop confirmed (or unchanged and committed locally).
    DragCommitted {
        proposal_id: String,
        #[serde(with = "clock::hhmm")]
        new_start: u32,
        #[serde(with = "clock::hhmm")]
        new_end: u32,
        at: DateTime<Utc>,
    },
    /// Remote confirmation failed; the proposal is back at its original time.
    DragRolledBack {
        proposal_id: String,
        #[serde(with = "clock::hhmm")]
        attempted_start: u32,
        #[serde(with = "clock::hhmm")]
        restored_start: u32,
        #[serde(with = "clock::hhmm")]
        restored_end: u32,
        error: String,
        at: DateTime<Utc>,
    },
    DragCancelled {
        proposal_id: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Id of the proposal or item the event is about, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Event::ScheduleGenerated { .. } | Event::ProposalsPersisted { .. } => None,
            Event::ItemClicked { item_id, .. } => Some(item_id),
            Event::DragStarted { proposal_id, .. }
            | Event::DragCommitted { proposal_id, .. }
            | Event::DragRolledBack { proposal_id, .. }
            | Event::DragCancelled { proposal_id, .. } => Some(proposal_id),
        }
    }
}
