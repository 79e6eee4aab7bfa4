//! Day timeline primitives.
//!
//! This module provides:
//! - Day-relative intervals (busy time, sleep window, planning window)
//! - Calendar event projection onto a single day
//! - Interval merging and free-slot detection

mod event;
mod gap;
mod interval;

pub use event::{project_events, CalendarEvent, FixedEntry};
pub use gap::{
    detect_free_slots, merge_intervals, FreeSlot, IntervalMerger, MergeReport,
    DEFAULT_MIN_SLOT_MINUTES,
};
pub use interval::{BusyInterval, DayWindow, SleepWindow, Span};
