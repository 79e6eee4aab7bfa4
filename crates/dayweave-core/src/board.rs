//! One rendered day.
//!
//! [`DayBoard`] owns everything a day view needs: the fixed entries, the
//! proposal store, the layout engine and the drag machine. The display items
//! it hands out always come from the last full re-layout, which runs after
//! every mutation.
//!
//! Drops are applied optimistically. [`DayBoard::confirm`] then asks the
//! repository; when that fails the proposal is put back exactly where it was.

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::clock::DAY_MINUTES;
use crate::drag::{DragConfig, DragOutcome, DragPhase, DragPreview, DragRescheduler, PendingCommit, Point, PointerId};
use crate::error::PersistenceError;
use crate::events::Event;
use crate::layout::{DisplayItem, LayoutConfig, LayoutEngine};
use crate::repository::{ProposalRepository, RetryPolicy};
use crate::scheduler::Proposal;
use crate::store::ProposalStore;
use crate::timeline::{project_events, CalendarEvent, FixedEntry, Span};

/// A drop the repository refused. The proposal has already been restored.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Move of '{proposal_id}' was rolled back: {error}")]
pub struct DragRollback {
    pub proposal_id: String,
    pub event: Event,
    #[source]
    pub error: PersistenceError,
}

/// A drop applied locally and waiting for confirmation.
#[derive(Debug, Clone, PartialEq)]
struct InFlight {
    commit: PendingCommit,
    /// Exact stored times before the drop.
    previous: Span,
}

pub struct DayBoard {
    date: NaiveDate,
    fixed: Vec<FixedEntry>,
    store: ProposalStore,
    engine: LayoutEngine,
    drag: DragRescheduler,
    items: Vec<DisplayItem>,
    in_flight: Option<InFlight>,
    events: Vec<Event>,
}

impl DayBoard {
    pub fn new(
        date: NaiveDate,
        fixed: Vec<FixedEntry>,
        proposals: Vec<Proposal>,
        layout: LayoutConfig,
        drag: DragConfig,
    ) -> Self {
        let mut board = Self {
            date,
            fixed,
            store: ProposalStore::from_proposals(proposals),
            engine: LayoutEngine::new(layout),
            drag: DragRescheduler::new(drag),
            items: Vec::new(),
            in_flight: None,
            events: Vec::new(),
        };
        board.relayout();
        board
    }

    /// Board for `date` from raw calendar events.
    pub fn from_events(
        date: NaiveDate,
        events: &[CalendarEvent],
        proposals: Vec<Proposal>,
        layout: LayoutConfig,
        drag: DragConfig,
    ) -> Self {
        Self::new(date, project_events(events, date), proposals, layout, drag)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn fixed(&self) -> &[FixedEntry] {
        &self.fixed
    }

    pub fn store(&self) -> &ProposalStore {
        &self.store
    }

    /// Items from the last re-layout, in visual order.
    pub fn display_items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&DisplayItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.drag.phase()
    }

    pub fn preview(&self) -> Option<DragPreview> {
        self.drag.preview()
    }

    /// The drop waiting for [`confirm`](Self::confirm), if any.
    pub fn pending(&self) -> Option<&PendingCommit> {
        self.in_flight.as_ref().map(|f| &f.commit)
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn set_fixed(&mut self, fixed: Vec<FixedEntry>) {
        self.fixed = fixed;
        self.relayout();
    }

    pub fn replace_proposals(&mut self, proposals: Vec<Proposal>) {
        self.store.replace_all(proposals);
        self.relayout();
    }

    pub fn insert_proposal(&mut self, proposal: Proposal) {
        self.store.insert(proposal);
        self.relayout();
    }

    pub fn remove_proposal(&mut self, id: &str) -> Option<Proposal> {
        let removed = self.store.remove(id);
        self.relayout();
        removed
    }

    /// Recompute every display item from the fixed entries and the store.
    pub fn relayout(&mut self) {
        let proposals: Vec<Proposal> = self
            .store
            .proposals()
            .iter()
            .filter(|p| p.assigned_date == self.date)
            .cloned()
            .collect();
        self.items = self.engine.layout_day(&self.fixed, &proposals);
    }

    // ── Pointer input ────────────────────────────────────────────────

    pub fn pointer_down(&mut self, pointer_id: PointerId, item_id: &str, at: Point) -> DragOutcome {
        let Some(item) = self.items.iter().find(|i| i.id == item_id) else {
            return DragOutcome::Ignored;
        };
        self.drag.pointer_down(pointer_id, item, at)
    }

    pub fn pointer_move(&mut self, pointer_id: PointerId, at: Point) -> DragOutcome {
        let outcome = self.drag.pointer_move(pointer_id, at);
        if let DragOutcome::Started(preview) = &outcome {
            self.events.push(Event::DragStarted {
                proposal_id: preview.proposal_id.clone(),
                pointer_id,
                at: Utc::now(),
            });
        }
        outcome
    }

    /// Release. A real move is applied to the store right away and awaits
    /// [`confirm`](Self::confirm).
    ///
    /// The drop moves the stored proposal by its start only; its duration is
    /// kept, so the returned commit carries the stored times, not the
    /// display ones.
    pub fn pointer_up(&mut self, pointer_id: PointerId, at: Point) -> DragOutcome {
        let mut outcome = self.drag.pointer_up(pointer_id, at);
        match &mut outcome {
            DragOutcome::Clicked { item_id } => {
                self.events.push(Event::ItemClicked {
                    item_id: item_id.clone(),
                    at: Utc::now(),
                });
            }
            DragOutcome::Dropped(commit) => {
                let Some((previous, duration)) = self
                    .store
                    .get(&commit.proposal_id)
                    .map(|p| (p.span(), p.duration_minutes))
                else {
                    tracing::warn!(proposal = %commit.proposal_id, "dropped proposal no longer exists");
                    self.drag.finish();
                    return self.cancelled(commit.proposal_id.clone());
                };

                if commit.is_noop() {
                    commit.target = previous;
                } else {
                    let start = self.latest_grid_start(commit.target.start, duration);
                    self.store.move_to(&commit.proposal_id, start);
                    commit.target = self
                        .store
                        .get(&commit.proposal_id)
                        .map_or(previous, Proposal::span);
                    self.relayout();
                }
                commit.original = previous;
                self.in_flight = Some(InFlight {
                    commit: commit.clone(),
                    previous,
                });
            }
            _ => {}
        }
        outcome
    }

    pub fn pointer_cancel(&mut self, pointer_id: PointerId) -> DragOutcome {
        match self.drag.pointer_cancel(pointer_id) {
            DragOutcome::Cancelled { proposal_id } => self.cancelled(proposal_id),
            other => other,
        }
    }

    /// Abandon the gesture regardless of pointer (e.g. Escape).
    pub fn cancel(&mut self) -> DragOutcome {
        match self.drag.cancel() {
            DragOutcome::Cancelled { proposal_id } => self.cancelled(proposal_id),
            other => other,
        }
    }

    /// Settle the pending drop against `repo`.
    ///
    /// Returns `Ok(None)` when nothing is pending. A drop that did not change
    /// the time is committed without calling the repository.
    ///
    /// # Errors
    /// When the repository fails, the proposal is restored to its exact
    /// previous times, the board is re-laid out and a [`DragRollback`] is
    /// returned.
    pub async fn confirm(
        &mut self,
        repo: &dyn ProposalRepository,
        policy: &RetryPolicy,
    ) -> Result<Option<Event>, DragRollback> {
        let Some(InFlight { commit, previous }) = self.in_flight.take() else {
            return Ok(None);
        };

        if commit.is_noop() {
            self.drag.finish();
            let event = Event::DragCommitted {
                proposal_id: commit.proposal_id.clone(),
                new_start: previous.start,
                new_end: previous.end,
                at: Utc::now(),
            };
            self.events.push(event.clone());
            return Ok(Some(event));
        }

        let outcome = match self.store.get(&commit.proposal_id).cloned() {
            Some(proposal) => policy.run("update", || repo.update(&proposal)).await,
            None => Err(PersistenceError::NotFound(commit.proposal_id.clone())),
        };

        self.drag.finish();
        match outcome {
            Ok(()) => {
                tracing::info!(
                    proposal = %commit.proposal_id,
                    start = commit.target.start,
                    end = commit.target.end,
                    "move confirmed"
                );
                let event = Event::DragCommitted {
                    proposal_id: commit.proposal_id,
                    new_start: commit.target.start,
                    new_end: commit.target.end,
                    at: Utc::now(),
                };
                self.events.push(event.clone());
                Ok(Some(event))
            }
            Err(error) => {
                self.store.restore(&commit.proposal_id, previous);
                self.relayout();
                tracing::warn!(proposal = %commit.proposal_id, error = %error, "move rolled back");
                let event = Event::DragRolledBack {
                    proposal_id: commit.proposal_id.clone(),
                    attempted_start: commit.target.start,
                    restored_start: previous.start,
                    restored_end: previous.end,
                    error: error.to_string(),
                    at: Utc::now(),
                };
                self.events.push(event.clone());
                Err(DragRollback {
                    proposal_id: commit.proposal_id,
                    event,
                    error,
                })
            }
        }
    }

    /// `start`, pulled back to the last grid line that still fits `duration`.
    fn latest_grid_start(&self, start: u32, duration: u32) -> u32 {
        let step = self.drag.config().grid_step.max(1);
        let latest = DAY_MINUTES.saturating_sub(duration) / step * step;
        start.min(latest)
    }

    fn cancelled(&mut self, proposal_id: String) -> DragOutcome {
        self.events.push(Event::DragCancelled {
            proposal_id: proposal_id.clone(),
            at: Utc::now(),
        });
        DragOutcome::Cancelled { proposal_id }
    }
}
