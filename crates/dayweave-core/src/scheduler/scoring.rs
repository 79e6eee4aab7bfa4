//! Task/slot compatibility scoring.
//!
//! ```text
//! fit = efficiency + priority_boost + time_boost
//! efficiency = 1 - (slot - task) / slot
//! ```
//!
//! | Term | Value |
//! |------|-------|
//! | priority boost | 0.33 high, 0.20 medium, 0.10 low |
//! | time boost | +0.6 bucket match, -0.3 mismatch, 0 no preference |
//!
//! The time boost only biases placement toward where an activity belongs
//! (breakfast in the morning, dinner in the evening); it never forces it.

use serde::{Deserialize, Serialize};

use super::task::{TaskCandidate, TimeBucket};
use crate::timeline::FreeSlot;

/// Boost when the slot lies in the task's preferred bucket.
pub const BUCKET_MATCH_BOOST: f64 = 0.6;
/// Penalty when both buckets are known and differ.
pub const BUCKET_MISMATCH_PENALTY: f64 = -0.3;

/// How the time-of-day rule applied to a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum BucketMatch {
    /// The task has no preference, or the slot starts outside every bucket.
    NotApplicable,
    Matched { bucket: TimeBucket },
    Mismatched { preferred: TimeBucket, actual: TimeBucket },
}

impl BucketMatch {
    pub fn boost(&self) -> f64 {
        match self {
            Self::NotApplicable => 0.0,
            Self::Matched { .. } => BUCKET_MATCH_BOOST,
            Self::Mismatched { .. } => BUCKET_MISMATCH_PENALTY,
        }
    }
}

/// Components of one fit score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitBreakdown {
    pub efficiency: f64,
    pub priority_boost: f64,
    pub bucket: BucketMatch,
    /// Unused slot minutes if the task takes this slot.
    pub waste_minutes: u32,
}

impl FitBreakdown {
    pub fn total(&self) -> f64 {
        self.efficiency + self.priority_boost + self.bucket.boost()
    }
}

/// Scores (task, slot) pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitScorer;

impl FitScorer {
    pub fn new() -> Self {
        Self
    }

    /// Full breakdown, or `None` when the task does not fit the slot.
    pub fn breakdown(&self, task: &TaskCandidate, slot: &FreeSlot) -> Option<FitBreakdown> {
        if slot.duration_minutes == 0 || !slot.can_fit(task.duration_minutes) {
            return None;
        }

        let waste = slot.duration_minutes - task.duration_minutes;
        let efficiency = 1.0 - f64::from(waste) / f64::from(slot.duration_minutes);

        let bucket = match (task.preferred_bucket, TimeBucket::of_minute(slot.start)) {
            (Some(preferred), Some(actual)) if preferred == actual => {
                BucketMatch::Matched { bucket: actual }
            }
            (Some(preferred), Some(actual)) => BucketMatch::Mismatched { preferred, actual },
            _ => BucketMatch::NotApplicable,
        };

        Some(FitBreakdown {
            efficiency,
            priority_boost: task.priority.boost(),
            bucket,
            waste_minutes: waste,
        })
    }

    /// Fit score, or `None` when the task does not fit the slot.
    pub fn score(&self, task: &TaskCandidate, slot: &FreeSlot) -> Option<f64> {
        self.breakdown(task, slot).map(|b| b.total())
    }
}
