//! # dayweave Core Library
//!
//! Day-planning engine: finds free time around fixed calendar events, places
//! task candidates into it, lays the day out into non-overlapping columns and
//! lets the user drag proposals to new times. A standalone CLI binary exposes
//! every operation over the same library.
//!
//! ## Architecture
//!
//! - **Timeline**: busy-interval merging and free-slot detection
//! - **Scheduler**: fit scoring and greedy assignment of tasks to slots
//! - **Layout**: pure column layout of fixed events and proposals
//! - **Drag**: pointer state machine with optimistic apply and rollback
//! - **Storage**: TOML configuration; proposals persist through a repository
//!
//! ## Key Components
//!
//! - [`IntervalMerger`]: free slots of one day
//! - [`GreedyAssigner`]: task placement
//! - [`LayoutEngine`]: display geometry
//! - [`DayBoard`]: one rendered, draggable day
//! - [`DayPlanner`]: end-to-end planning against collaborators
//! - [`Config`]: application configuration management

pub mod board;
pub mod clock;
pub mod collaborators;
pub mod drag;
pub mod error;
pub mod events;
pub mod layout;
pub mod planner;
pub mod repository;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod timeline;

pub use board::{DayBoard, DragRollback};
pub use clock::{TimeValue, DAY_MINUTES};
pub use collaborators::{CalendarSource, JsonCalendarFile, LineTaskExtractor, StaticCalendar, TaskExtractor};
pub use drag::{DragConfig, DragOutcome, DragPhase, DragPreview, DragRescheduler, PendingCommit, Point, PointerId};
pub use error::{ConfigError, CoreError, PersistenceError, ValidationError};
pub use events::Event;
pub use layout::{DisplayItem, ItemKind, LayoutConfig, LayoutEngine, TimelineEntry};
pub use planner::{DayPlanner, MergeSettings, PersistReport, PlanRequest};
pub use repository::{InMemoryRepository, JsonFileRepository, ProposalRepository, RetryPolicy};
pub use scheduler::{
    FitScorer, GreedyAssigner, Priority, Proposal, ScheduleResult, TaskCandidate, TimeBucket,
    UnscheduledTask,
};
pub use storage::Config;
pub use store::ProposalStore;
pub use timeline::{
    BusyInterval, CalendarEvent, DayWindow, FixedEntry, FreeSlot, IntervalMerger, MergeReport,
    SleepWindow, Span,
};
