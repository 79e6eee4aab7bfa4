//! Automatic placement of task candidates into free slots.
//!
//! This module provides:
//! - Task candidates with priority and time-of-day preference
//! - Fit scoring of (task, slot) pairs
//! - Greedy assignment producing proposals with human-readable reasoning

mod assigner;
mod proposal;
mod scoring;
mod task;

pub use assigner::{AssignerConfig, GreedyAssigner, ScheduleResult, MAX_TASKS_PER_PASS};
pub use proposal::{Proposal, UnscheduledTask, NO_SLOT_REASON};
pub use scoring::{
    BucketMatch, FitBreakdown, FitScorer, BUCKET_MATCH_BOOST, BUCKET_MISMATCH_PENALTY,
};
pub use task::{Priority, TaskCandidate, TimeBucket, MAX_TASK_NAME_LEN};
