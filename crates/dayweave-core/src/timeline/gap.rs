//! Free-slot detection.
//!
//! Merges a day's busy intervals (calendar events plus the sleep window)
//! into a minimal busy cover, then walks the cover against the planning
//! window to find free slots long enough to be useful.

use serde::{Deserialize, Serialize};

use super::interval::{BusyInterval, DayWindow, SleepWindow, Span};
use crate::clock;

/// Default minimum free-slot length in minutes.
pub const DEFAULT_MIN_SLOT_MINUTES: u32 = 15;

/// A currently unoccupied range of the day. Exists for one scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    pub id: String,
    #[serde(with = "clock::hhmm")]
    pub start: u32,
    #[serde(with = "clock::hhmm")]
    pub end: u32,
    pub duration_minutes: u32,
}

impl FreeSlot {
    /// Create a free slot. `end` must not precede `start`.
    pub fn new(id: impl Into<String>, start: u32, end: u32) -> Self {
        let end = end.max(start);
        Self {
            id: id.into(),
            start,
            end,
            duration_minutes: end - start,
        }
    }

    /// Check if this slot can fit a task of given duration
    pub fn can_fit(&self, minutes: u32) -> bool {
        self.duration_minutes >= minutes
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }
}

/// Result of one merge pass.
///
/// `slots`, `busy` (clipped to `window`) and `discarded` partition `window`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// The effective planning window.
    pub window: Span,
    /// Minimal sorted cover of all busy time (including sleep).
    pub busy: Vec<BusyInterval>,
    /// Free slots at least the minimum length, sorted by start.
    pub slots: Vec<FreeSlot>,
    /// Free fragments shorter than the minimum length.
    pub discarded: Vec<Span>,
}

impl MergeReport {
    pub fn total_free_minutes(&self) -> u32 {
        self.slots.iter().map(|s| s.duration_minutes).sum()
    }
}

/// Merges busy time and derives free slots for one day.
#[derive(Debug, Clone)]
pub struct IntervalMerger {
    /// Minimum slot duration to keep (in minutes)
    min_slot_minutes: u32,
    window: DayWindow,
    sleep: Option<SleepWindow>,
    /// Earliest usable minute, e.g. "now" when planning today.
    not_before: Option<u32>,
}

impl IntervalMerger {
    /// Create a merger with default settings: 15 minute minimum, whole-day
    /// window, 23:00-07:00 sleep.
    pub fn new() -> Self {
        Self {
            min_slot_minutes: DEFAULT_MIN_SLOT_MINUTES,
            window: DayWindow::default(),
            sleep: Some(SleepWindow::default()),
            not_before: None,
        }
    }

    /// Set the minimum slot duration
    pub fn with_min_slot(mut self, minutes: u32) -> Self {
        self.min_slot_minutes = minutes;
        self
    }

    pub fn with_window(mut self, window: DayWindow) -> Self {
        self.window = window;
        self
    }

    /// Replace the sleep window; `None` disables it.
    pub fn with_sleep(mut self, sleep: Option<SleepWindow>) -> Self {
        self.sleep = sleep;
        self
    }

    /// Ignore any free time before `minute`.
    pub fn not_before(mut self, minute: Option<u32>) -> Self {
        self.not_before = minute;
        self
    }

    pub fn min_slot_minutes(&self) -> u32 {
        self.min_slot_minutes
    }

    /// Run a full pass over the given busy intervals.
    pub fn run(&self, busy: &[BusyInterval]) -> MergeReport {
        let mut all: Vec<BusyInterval> = busy.to_vec();
        if let Some(sleep) = &self.sleep {
            all.extend(sleep.day_intervals());
        }
        let merged = merge_intervals(&all);

        let window_start = self
            .not_before
            .map_or(self.window.start, |floor| floor.max(self.window.start));
        let window = Span {
            start: window_start.min(self.window.end),
            end: self.window.end,
        };

        let mut slots = Vec::new();
        let mut discarded = Vec::new();
        let mut cursor = window.start;

        let mut emit = |start: u32, end: u32| {
            if end <= start {
                return;
            }
            if end - start >= self.min_slot_minutes {
                let id = format!("slot_{}", slots.len() + 1);
                slots.push(FreeSlot::new(id, start, end));
            } else {
                discarded.push(Span { start, end });
            }
        };

        for interval in &merged {
            if interval.end <= cursor {
                continue;
            }
            if interval.start >= window.end {
                break;
            }
            if interval.start > cursor {
                emit(cursor, interval.start);
            }
            cursor = interval.end.min(window.end);
        }
        if cursor < window.end {
            emit(cursor, window.end);
        }

        tracing::debug!(
            busy = merged.len(),
            slots = slots.len(),
            discarded = discarded.len(),
            "merged busy intervals"
        );

        MergeReport {
            window,
            busy: merged,
            slots,
            discarded,
        }
    }

    /// Find the free slots for the given busy intervals.
    pub fn free_slots(&self, busy: &[BusyInterval]) -> Vec<FreeSlot> {
        self.run(busy).slots
    }
}

impl Default for IntervalMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Sweep-merge intervals into a minimal sorted, non-overlapping cover.
///
/// Touching intervals (`next.start == running.end`) are merged too.
pub fn merge_intervals(intervals: &[BusyInterval]) -> Vec<BusyInterval> {
    let mut sorted: Vec<BusyInterval> = intervals
        .iter()
        .copied()
        .filter(|i| i.start < i.end)
        .collect();
    sorted.sort_by_key(|i| (i.start, i.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(running) if interval.start <= running.end => {
                running.end = running.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Convenience function to find free slots with default settings
pub fn detect_free_slots(busy: &[BusyInterval]) -> Vec<FreeSlot> {
    IntervalMerger::new().free_slots(busy)
}
