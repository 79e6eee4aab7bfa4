//! End-to-end day planning.
//!
//! Glues the pieces together: project calendar events onto the day, add the
//! proposals already stored for it as busy time, merge, and assign tasks into
//! what is left. The pure part is [`DayPlanner::plan`]; the async helpers
//! only fetch inputs from collaborators and store outputs.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::collaborators::{CalendarSource, TaskExtractor};
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::repository::{ProposalRepository, RetryPolicy};
use crate::scheduler::{AssignerConfig, GreedyAssigner, Proposal, ScheduleResult, TaskCandidate};
use crate::timeline::{
    project_events, BusyInterval, CalendarEvent, DayWindow, FixedEntry, IntervalMerger, MergeReport,
    SleepWindow, DEFAULT_MIN_SLOT_MINUTES,
};

/// Settings for the free-slot pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSettings {
    pub window: DayWindow,
    /// `None` disables the sleep window.
    pub sleep: Option<SleepWindow>,
    pub min_slot_minutes: u32,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            window: DayWindow::default(),
            sleep: Some(SleepWindow::default()),
            min_slot_minutes: DEFAULT_MIN_SLOT_MINUTES,
        }
    }
}

/// Everything one planning pass needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub date: NaiveDate,
    pub events: Vec<CalendarEvent>,
    /// Proposals already stored; those on `date` count as busy.
    pub existing: Vec<Proposal>,
    pub tasks: Vec<TaskCandidate>,
    /// Earliest usable minute, e.g. "now" when planning today.
    pub not_before: Option<u32>,
}

impl PlanRequest {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
            existing: Vec::new(),
            tasks: Vec::new(),
            not_before: None,
        }
    }

    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_existing(mut self, existing: Vec<Proposal>) -> Self {
        self.existing = existing;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskCandidate>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn not_before(mut self, minute: Option<u32>) -> Self {
        self.not_before = minute;
        self
    }
}

/// A proposal the repository did not accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSave {
    pub proposal_id: String,
    pub error: String,
}

/// Outcome of [`DayPlanner::persist`]. Local proposals are kept either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistReport {
    pub saved: Vec<String>,
    pub failed: Vec<FailedSave>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Plans one day at a time.
#[derive(Default)]
pub struct DayPlanner {
    merge: MergeSettings,
    assigner: GreedyAssigner,
}

impl DayPlanner {
    pub fn new(merge: MergeSettings, assigner: AssignerConfig) -> Self {
        Self {
            merge,
            assigner: GreedyAssigner::with_config(assigner),
        }
    }

    pub fn merge_settings(&self) -> &MergeSettings {
        &self.merge
    }

    fn merger(&self, not_before: Option<u32>) -> IntervalMerger {
        IntervalMerger::new()
            .with_min_slot(self.merge.min_slot_minutes)
            .with_window(self.merge.window)
            .with_sleep(self.merge.sleep)
            .not_before(not_before)
    }

    /// Busy time of `date`: projected events plus stored proposals.
    pub fn busy(&self, date: NaiveDate, fixed: &[FixedEntry], existing: &[Proposal]) -> Vec<BusyInterval> {
        fixed
            .iter()
            .map(FixedEntry::busy)
            .chain(
                existing
                    .iter()
                    .filter(|p| p.assigned_date == date)
                    .map(Proposal::span),
            )
            .collect()
    }

    /// Free-slot pass only.
    pub fn free_slots(&self, request: &PlanRequest) -> MergeReport {
        let fixed = project_events(&request.events, request.date);
        let busy = self.busy(request.date, &fixed, &request.existing);
        self.merger(request.not_before).run(&busy)
    }

    /// Full planning pass. Pure: equal requests give equal results.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for malformed tasks or an event that
    /// ends before it starts. Tasks that fit
    /// nowhere are reported in [`ScheduleResult::unscheduled`].
    pub fn plan(&self, request: &PlanRequest) -> Result<ScheduleResult, ValidationError> {
        for event in &request.events {
            event.validate()?;
        }
        let report = self.free_slots(request);
        let result = self.assigner.assign(request.date, &request.tasks, report.slots)?;
        tracing::info!(
            date = %request.date,
            scheduled = result.proposals.len(),
            unscheduled = result.unscheduled.len(),
            "planned day"
        );
        Ok(result)
    }

    /// Fetch events and extract tasks from collaborators, then [`plan`](Self::plan).
    pub async fn plan_day(
        &self,
        date: NaiveDate,
        calendar: &dyn CalendarSource,
        extractor: &dyn TaskExtractor,
        text: &str,
        existing: Vec<Proposal>,
    ) -> Result<ScheduleResult, CoreError> {
        let events = calendar.fetch_events(date).await?;
        let tasks = extractor.extract(text, date).await?;
        let request = PlanRequest::new(date)
            .with_events(events)
            .with_existing(existing)
            .with_tasks(tasks);
        Ok(self.plan(&request)?)
    }

    /// Create every proposal of `result` under `policy`.
    pub async fn persist(
        &self,
        result: &ScheduleResult,
        repo: &dyn ProposalRepository,
        policy: &RetryPolicy,
    ) -> PersistReport {
        let mut report = PersistReport::default();
        for proposal in &result.proposals {
            match policy.run("create", || repo.create(proposal)).await {
                Ok(()) => report.saved.push(proposal.stable_id.clone()),
                Err(e) => {
                    tracing::warn!(proposal = %proposal.stable_id, error = %e, "failed to save proposal");
                    report.failed.push(FailedSave {
                        proposal_id: proposal.stable_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

/// Summary event for a finished pass.
pub fn schedule_event(result: &ScheduleResult) -> Event {
    Event::ScheduleGenerated {
        date: result.date,
        scheduled: result.proposals.len(),
        unscheduled: result.unscheduled.len(),
        at: Utc::now(),
    }
}

/// Summary event for a persist run.
pub fn persist_event(date: NaiveDate, report: &PersistReport) -> Event {
    Event::ProposalsPersisted {
        date,
        saved: report.saved.len(),
        failed: report.failed.len(),
        at: Utc::now(),
    }
}
