//! Greedy task-to-slot assignment.
//!
//! Tasks are placed one at a time (high priority and long tasks first) into
//! the best-scoring slot currently available. The chosen slot is split and
//! its usable remainders return to the pool. There is no backtracking and no
//! randomness: equal inputs always produce equal schedules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use super::proposal::{Proposal, UnscheduledTask};
use super::scoring::{BucketMatch, FitBreakdown, FitScorer};
use super::task::{Priority, TaskCandidate, TimeBucket};
use crate::clock;
use crate::error::ValidationError;
use crate::timeline::{FreeSlot, DEFAULT_MIN_SLOT_MINUTES};

/// Maximum number of tasks accepted in one pass.
pub const MAX_TASKS_PER_PASS: usize = 50;

/// Scores closer than this are treated as ties.
const SCORE_EPSILON: f64 = 1e-9;

/// Assigner configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignerConfig {
    /// Remainders shorter than this are discarded (minutes)
    pub min_slot_minutes: u32,
    /// Placements start on this grid when the aligned interval still fits
    pub grid_step: u32,
    pub max_tasks: usize,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            min_slot_minutes: DEFAULT_MIN_SLOT_MINUTES,
            grid_step: 15,
            max_tasks: MAX_TASKS_PER_PASS,
        }
    }
}

/// Outcome of one assignment pass. Partial success is the normal case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub date: NaiveDate,
    /// Placed tasks, sorted by start time.
    pub proposals: Vec<Proposal>,
    pub unscheduled: Vec<UnscheduledTask>,
    /// Slots left in the pool after the pass.
    pub free_slots: Vec<FreeSlot>,
    /// Minutes of split remainders too short to keep.
    pub discarded_minutes: u32,
    pub explanation: String,
    /// True when every task was placed.
    pub success: bool,
}

/// Greedy assigner
pub struct GreedyAssigner {
    config: AssignerConfig,
    scorer: FitScorer,
}

impl GreedyAssigner {
    /// Create a new assigner with default config
    pub fn new() -> Self {
        Self::with_config(AssignerConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: AssignerConfig) -> Self {
        Self {
            config,
            scorer: FitScorer::new(),
        }
    }

    pub fn config(&self) -> &AssignerConfig {
        &self.config
    }

    /// Place `tasks` into `slots` for `date`.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if a task is malformed or there are more
    /// than `max_tasks` tasks. A task that fits nowhere is not an error.
    pub fn assign(
        &self,
        date: NaiveDate,
        tasks: &[TaskCandidate],
        slots: Vec<FreeSlot>,
    ) -> Result<ScheduleResult, ValidationError> {
        if tasks.len() > self.config.max_tasks {
            return Err(ValidationError::TooManyTasks {
                count: tasks.len(),
                max: self.config.max_tasks,
            });
        }
        for task in tasks {
            task.validate()?;
        }

        let total_free: u32 = slots.iter().map(|s| s.duration_minutes).sum();
        let mut pool = slots;
        pool.sort_by_key(|s| (s.start, s.end));
        let mut next_slot_seq = pool.len() + 1;

        let mut proposals = Vec::new();
        let mut unscheduled = Vec::new();
        let mut discarded_minutes = 0;

        for index in self.placement_order(tasks) {
            let task = &tasks[index];

            let Some((slot_index, breakdown)) = self.best_slot(task, &pool) else {
                tracing::debug!(task = %task.name, minutes = task.duration_minutes, "no slot fits");
                unscheduled.push(UnscheduledTask::no_slot(task.clone()));
                continue;
            };

            let slot = pool.remove(slot_index);
            let start = self.placement_start(&slot, task.duration_minutes);
            let end = start + task.duration_minutes;

            for (rem_start, rem_end) in [(slot.start, start), (end, slot.end)] {
                let length = rem_end.saturating_sub(rem_start);
                if length == 0 {
                    continue;
                }
                if length >= self.config.min_slot_minutes {
                    pool.push(FreeSlot::new(format!("slot_{next_slot_seq}"), rem_start, rem_end));
                    next_slot_seq += 1;
                } else {
                    discarded_minutes += length;
                }
            }
            pool.sort_by_key(|s| (s.start, s.end));

            tracing::debug!(
                task = %task.name,
                slot = %slot.id,
                start = %clock::format_hhmm(start),
                score = breakdown.total(),
                "placed task"
            );

            proposals.push(Proposal {
                stable_id: stable_id(date, index, &task.name, start),
                task_name: task.name.clone(),
                duration_minutes: task.duration_minutes,
                assigned_date: date,
                assigned_start: start,
                assigned_end: end,
                source_slot_id: slot.id.clone(),
                fit_score: breakdown.total(),
                reasoning: reasoning(task, &breakdown, start),
            });
        }

        proposals.sort_by(|a, b| {
            a.assigned_start
                .cmp(&b.assigned_start)
                .then_with(|| a.stable_id.cmp(&b.stable_id))
        });

        let explanation = explain(&proposals, &unscheduled, total_free);
        let success = unscheduled.is_empty();

        tracing::info!(
            %date,
            placed = proposals.len(),
            unscheduled = unscheduled.len(),
            "assignment pass complete"
        );

        Ok(ScheduleResult {
            date,
            proposals,
            unscheduled,
            free_slots: pool,
            discarded_minutes,
            explanation,
            success,
        })
    }

    /// Indices of `tasks` in placement order: priority descending, then
    /// duration descending, then input order.
    fn placement_order(&self, tasks: &[TaskCandidate]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..tasks.len()).collect();
        order.sort_by(|&a, &b| {
            let (ta, tb) = (&tasks[a], &tasks[b]);
            tb.priority
                .rank()
                .cmp(&ta.priority.rank())
                .then_with(|| tb.duration_minutes.cmp(&ta.duration_minutes))
                .then_with(|| a.cmp(&b))
        });
        order
    }

    /// Highest score wins; ties go to the least waste, then the earliest start.
    fn best_slot(&self, task: &TaskCandidate, pool: &[FreeSlot]) -> Option<(usize, FitBreakdown)> {
        let mut best: Option<(usize, FitBreakdown)> = None;
        for (i, slot) in pool.iter().enumerate() {
            let Some(candidate) = self.scorer.breakdown(task, slot) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((j, current)) => {
                    compare_candidates(&candidate, slot, current, &pool[*j]) == Ordering::Greater
                }
            };
            if better {
                best = Some((i, candidate));
            }
        }
        best
    }

    /// Earliest start in `slot`, aligned up to the grid when that still fits.
    fn placement_start(&self, slot: &FreeSlot, duration: u32) -> u32 {
        let step = self.config.grid_step;
        if step == 0 {
            return slot.start;
        }
        let aligned = slot.start.div_ceil(step) * step;
        if aligned + duration <= slot.end {
            aligned
        } else {
            slot.start
        }
    }
}

impl Default for GreedyAssigner {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_candidates(
    a: &FitBreakdown,
    a_slot: &FreeSlot,
    b: &FitBreakdown,
    b_slot: &FreeSlot,
) -> Ordering {
    let diff = a.total() - b.total();
    if diff.abs() > SCORE_EPSILON {
        return if diff > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    b.waste_minutes
        .cmp(&a.waste_minutes)
        .then_with(|| b_slot.start.cmp(&a_slot.start))
}

/// Deterministic id: the same pass over the same input yields the same ids.
/// The placement start keeps ids of a re-plan apart from earlier ones.
fn stable_id(date: NaiveDate, index: usize, name: &str, start: u32) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("dayweave/{date}/{index}/{name}/{start}").as_bytes(),
    )
    .to_string()
}

fn reasoning(task: &TaskCandidate, breakdown: &FitBreakdown, start: u32) -> String {
    let mut parts = Vec::new();

    match breakdown.bucket {
        BucketMatch::Matched { bucket } => {
            parts.push(format!("Placed in the {bucket}, matching its preferred time of day."))
        }
        BucketMatch::Mismatched { preferred, actual } => parts.push(format!(
            "Prefers the {preferred}, but the best available slot was in the {actual}."
        )),
        BucketMatch::NotApplicable => {}
    }

    let peak = matches!(
        TimeBucket::of_minute(start),
        Some(TimeBucket::Morning | TimeBucket::Afternoon)
    );
    parts.push(
        match (task.priority, peak) {
            (Priority::High, true) => "High priority task scheduled during peak hours.",
            (Priority::High, false) => "High priority task given first pick of the free time.",
            (Priority::Medium, _) => "Medium priority task placed in the best remaining slot.",
            (Priority::Low, _) => "Low priority task fitted into the remaining free time.",
        }
        .to_string(),
    );

    if let Some(deadline) = task.deadline {
        parts.push(format!("Due by {deadline}."));
    }

    parts.join(" ")
}

fn explain(proposals: &[Proposal], unscheduled: &[UnscheduledTask], total_free: u32) -> String {
    if proposals.is_empty() && unscheduled.is_empty() {
        return "No tasks to schedule.".to_string();
    }

    let mut lines = Vec::new();
    if !proposals.is_empty() {
        lines.push(format!("Scheduled {} task(s):", proposals.len()));
        for p in proposals {
            lines.push(format!(
                "  - {} ({}-{})",
                p.task_name,
                clock::format_hhmm(p.assigned_start),
                clock::format_hhmm(p.assigned_end)
            ));
        }
    }
    if !unscheduled.is_empty() {
        lines.push(format!("Could not schedule {} task(s):", unscheduled.len()));
        for u in unscheduled {
            lines.push(format!(
                "  - {} ({}m, {} priority): {}",
                u.task.name, u.task.duration_minutes, u.task.priority, u.reason
            ));
        }
        lines.push(format!(
            "Tip: you have {total_free} minutes of free time, but it may be fragmented across multiple small gaps."
        ));
    }
    lines.join("\n")
}
