//! Drag-to-reschedule gesture.
//!
//! A pointer-driven state machine. It never touches proposals itself: it
//! produces previews while dragging and a [`PendingCommit`] on drop, which
//! the owning [`DayBoard`](crate::board::DayBoard) applies and confirms.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> PointerDown -> Distinguishing -> Dragging -> (Dropped | Cancelled) -> Idle
//!                      \-> Idle (release below threshold: click)
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::{self, DAY_MINUTES};
use crate::layout::DisplayItem;
use crate::timeline::Span;

/// Identifier of the pointer (mouse, touch contact, pen) driving a gesture.
pub type PointerId = u32;

/// Opacity of the item being dragged.
pub const DRAG_OPACITY: f64 = 0.5;

/// Pointer position in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drag configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    /// Movement (px, either axis) that turns a press into a drag
    pub threshold_px: f64,
    /// Drops snap to this step (minutes)
    pub grid_step: u32,
    pub pixels_per_minute: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold_px: 5.0,
            grid_step: 15,
            pixels_per_minute: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    #[default]
    Idle,
    PointerDown,
    Distinguishing,
    Dragging,
    /// Waiting for the board to confirm or roll back.
    Dropped,
    Cancelled,
}

/// The gesture in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub pointer_id: PointerId,
    pub proposal_id: String,
    pub origin: Point,
    /// Times of the item when the pointer went down.
    pub original: Span,
    /// Clamped, unsnapped offset in minutes.
    pub offset_minutes: f64,
    allowed_up: u32,
    allowed_down: u32,
}

/// Where the dragged item is drawn right now. Not snapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPreview {
    pub proposal_id: String,
    pub offset_minutes: f64,
    pub start: f64,
    pub end: f64,
    pub top: f64,
    pub opacity: f64,
}

/// A drop waiting to be applied and confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommit {
    pub proposal_id: String,
    pub original: Span,
    pub target: Span,
}

impl PendingCommit {
    /// The drop lands where the item started.
    pub fn is_noop(&self) -> bool {
        self.original == self.target
    }
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Not ours: wrong pointer, fixed item, or a session already running.
    Ignored,
    /// Pressed, but still below the threshold.
    Armed,
    Started(DragPreview),
    Moved(DragPreview),
    Clicked { item_id: String },
    Dropped(PendingCommit),
    Cancelled { proposal_id: String },
}

/// Drag state machine for one day board.
#[derive(Debug, Clone, Default)]
pub struct DragRescheduler {
    config: DragConfig,
    phase: DragPhase,
    session: Option<DragSession>,
}

impl DragRescheduler {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            phase: DragPhase::Idle,
            session: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == DragPhase::Idle
    }

    /// Current preview while dragging.
    pub fn preview(&self) -> Option<DragPreview> {
        match (self.phase, &self.session) {
            (DragPhase::Dragging, Some(session)) => Some(self.preview_of(session)),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Press on `item`. Only proposed items can be dragged.
    pub fn pointer_down(&mut self, pointer_id: PointerId, item: &DisplayItem, at: Point) -> DragOutcome {
        if self.phase != DragPhase::Idle || !item.is_movable() {
            return DragOutcome::Ignored;
        }

        let original = Span {
            start: item.start,
            end: item.end.max(item.start),
        };
        self.session = Some(DragSession {
            pointer_id,
            proposal_id: item.id.clone(),
            origin: at,
            original,
            offset_minutes: 0.0,
            allowed_up: original.start,
            allowed_down: DAY_MINUTES.saturating_sub(original.end),
        });
        self.phase = DragPhase::PointerDown;
        tracing::debug!(proposal = %item.id, pointer_id, "pointer down");
        DragOutcome::Armed
    }

    pub fn pointer_move(&mut self, pointer_id: PointerId, at: Point) -> DragOutcome {
        if !self.owns(pointer_id) {
            return DragOutcome::Ignored;
        }

        match self.phase {
            DragPhase::PointerDown | DragPhase::Distinguishing => {
                self.phase = DragPhase::Distinguishing;
                if !self.past_threshold(at) {
                    return DragOutcome::Armed;
                }
                self.phase = DragPhase::Dragging;
                self.track(at);
                match self.preview() {
                    Some(preview) => {
                        tracing::debug!(proposal = %preview.proposal_id, "drag started");
                        DragOutcome::Started(preview)
                    }
                    None => DragOutcome::Ignored,
                }
            }
            DragPhase::Dragging => {
                self.track(at);
                self.preview().map_or(DragOutcome::Ignored, DragOutcome::Moved)
            }
            _ => DragOutcome::Ignored,
        }
    }

    pub fn pointer_up(&mut self, pointer_id: PointerId, at: Point) -> DragOutcome {
        if !self.owns(pointer_id) {
            return DragOutcome::Ignored;
        }

        match self.phase {
            DragPhase::PointerDown | DragPhase::Distinguishing => {
                let item_id = self.reset().map(|s| s.proposal_id).unwrap_or_default();
                DragOutcome::Clicked { item_id }
            }
            DragPhase::Dragging => {
                self.track(at);
                let Some(session) = self.session.as_ref() else {
                    return DragOutcome::Ignored;
                };
                let commit = PendingCommit {
                    proposal_id: session.proposal_id.clone(),
                    original: session.original,
                    target: self.drop_target(session),
                };
                self.phase = DragPhase::Dropped;
                tracing::debug!(
                    proposal = %commit.proposal_id,
                    from = commit.original.start,
                    to = commit.target.start,
                    "dropped"
                );
                DragOutcome::Dropped(commit)
            }
            _ => DragOutcome::Ignored,
        }
    }

    /// The platform cancelled the pointer.
    pub fn pointer_cancel(&mut self, pointer_id: PointerId) -> DragOutcome {
        if !self.owns(pointer_id) {
            return DragOutcome::Ignored;
        }
        self.cancel()
    }

    /// Abandon the gesture regardless of pointer (e.g. Escape).
    /// A drop already awaiting confirmation cannot be cancelled.
    pub fn cancel(&mut self) -> DragOutcome {
        match self.phase {
            DragPhase::PointerDown | DragPhase::Distinguishing | DragPhase::Dragging => {
                self.phase = DragPhase::Cancelled;
                let proposal_id = self.reset().map(|s| s.proposal_id).unwrap_or_default();
                tracing::debug!(proposal = %proposal_id, "drag cancelled");
                DragOutcome::Cancelled { proposal_id }
            }
            _ => DragOutcome::Ignored,
        }
    }

    /// Close a dropped session once the board has settled it.
    pub fn finish(&mut self) -> Option<DragSession> {
        if self.phase == DragPhase::Dropped {
            self.reset()
        } else {
            None
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn owns(&self, pointer_id: PointerId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.pointer_id == pointer_id)
    }

    fn reset(&mut self) -> Option<DragSession> {
        self.phase = DragPhase::Idle;
        self.session.take()
    }

    fn past_threshold(&self, at: Point) -> bool {
        self.session.as_ref().is_some_and(|s| {
            (at.x - s.origin.x).abs() > self.config.threshold_px
                || (at.y - s.origin.y).abs() > self.config.threshold_px
        })
    }

    fn pixels_per_minute(&self) -> f64 {
        if self.config.pixels_per_minute > 0.0 {
            self.config.pixels_per_minute
        } else {
            1.0
        }
    }

    fn track(&mut self, at: Point) {
        let ppm = self.pixels_per_minute();
        if let Some(session) = self.session.as_mut() {
            let raw = (at.y - session.origin.y) / ppm;
            session.offset_minutes =
                raw.clamp(-f64::from(session.allowed_up), f64::from(session.allowed_down));
        }
    }

    fn preview_of(&self, session: &DragSession) -> DragPreview {
        let start = f64::from(session.original.start) + session.offset_minutes;
        DragPreview {
            proposal_id: session.proposal_id.clone(),
            offset_minutes: session.offset_minutes,
            start,
            end: start + f64::from(session.original.duration_minutes()),
            top: start * self.pixels_per_minute(),
            opacity: DRAG_OPACITY,
        }
    }

    fn drop_target(&self, session: &DragSession) -> Span {
        let duration = session.original.duration_minutes().min(DAY_MINUTES);
        let snapped = clock::snap_to_grid(session.offset_minutes, self.config.grid_step);
        let start = clock::clamp_minute(
            i64::from(session.original.start) + snapped,
            0,
            DAY_MINUTES - duration,
        );
        Span {
            start,
            end: start + duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ItemKind;

    fn item(kind: ItemKind, start: u32, end: u32) -> DisplayItem {
        DisplayItem {
            id: "p1".into(),
            title: "Write".into(),
            kind,
            start,
            end,
            visual_start: start,
            visual_end: end,
            column_index: 0,
            column_count: 1,
            top: f64::from(start),
            height: f64::from(end - start),
            left: 0.0,
            width: 100.0,
        }
    }

    fn drag(machine: &mut DragRescheduler, from: u32, to: u32, dy: f64) -> DragOutcome {
        let y0 = f64::from(from);
        machine.pointer_down(1, &item(ItemKind::Proposed, from, to), Point::new(10.0, y0));
        machine.pointer_move(1, Point::new(10.0, y0 + dy / 2.0));
        machine.pointer_move(1, Point::new(10.0, y0 + dy));
        machine.pointer_up(1, Point::new(10.0, y0 + dy))
    }

    #[test]
    fn test_drop_snaps_to_grid() {
        let mut machine = DragRescheduler::default();
        let DragOutcome::Dropped(commit) = drag(&mut machine, 540, 570, 47.0) else {
            panic!("expected drop");
        };
        assert_eq!(commit.target, Span { start: 585, end: 615 });
        assert_eq!(commit.original, Span { start: 540, end: 570 });
        assert_eq!(machine.phase(), DragPhase::Dropped);
        assert!(machine.finish().is_some());
        assert!(machine.is_idle());
    }

    #[test]
    fn test_release_below_threshold_is_click() {
        let mut machine = DragRescheduler::default();
        machine.pointer_down(1, &item(ItemKind::Proposed, 540, 570), Point::new(0.0, 540.0));
        assert_eq!(machine.pointer_move(1, Point::new(3.0, 544.0)), DragOutcome::Armed);
        assert_eq!(machine.phase(), DragPhase::Distinguishing);
        assert_eq!(
            machine.pointer_up(1, Point::new(3.0, 544.0)),
            DragOutcome::Clicked { item_id: "p1".into() }
        );
        assert!(machine.is_idle());
    }

    #[test]
    fn test_horizontal_movement_starts_drag() {
        let mut machine = DragRescheduler::default();
        machine.pointer_down(1, &item(ItemKind::Proposed, 540, 570), Point::new(0.0, 540.0));
        let outcome = machine.pointer_move(1, Point::new(8.0, 540.0));
        assert!(matches!(outcome, DragOutcome::Started(ref p) if p.offset_minutes == 0.0));
    }

    #[test]
    fn test_fixed_items_not_draggable() {
        let mut machine = DragRescheduler::default();
        let outcome = machine.pointer_down(1, &item(ItemKind::Fixed, 540, 570), Point::default());
        assert_eq!(outcome, DragOutcome::Ignored);
        assert!(machine.is_idle());
    }

    #[test]
    fn test_preview_unsnapped_and_clamped() {
        let mut machine = DragRescheduler::default();
        machine.pointer_down(1, &item(ItemKind::Proposed, 60, 120), Point::new(0.0, 60.0));
        let DragOutcome::Started(preview) = machine.pointer_move(1, Point::new(0.0, 67.0)) else {
            panic!("expected drag start");
        };
        assert_eq!(preview.start, 67.0);
        assert_eq!(preview.opacity, DRAG_OPACITY);

        let DragOutcome::Moved(preview) = machine.pointer_move(1, Point::new(0.0, -500.0)) else {
            panic!("expected move");
        };
        assert_eq!(preview.offset_minutes, -60.0);
        assert_eq!(preview.start, 0.0);
    }

    #[test]
    fn test_drop_past_day_end_clamped() {
        let mut machine = DragRescheduler::default();
        let DragOutcome::Dropped(commit) = drag(&mut machine, 1320, 1380, 500.0) else {
            panic!("expected drop");
        };
        assert_eq!(commit.target, Span { start: 1380, end: 1440 });
    }

    #[test]
    fn test_other_pointer_ignored() {
        let mut machine = DragRescheduler::default();
        machine.pointer_down(1, &item(ItemKind::Proposed, 540, 570), Point::new(0.0, 540.0));
        assert_eq!(machine.pointer_move(2, Point::new(0.0, 600.0)), DragOutcome::Ignored);
        assert_eq!(machine.pointer_up(2, Point::new(0.0, 600.0)), DragOutcome::Ignored);
        assert_eq!(machine.pointer_cancel(2), DragOutcome::Ignored);
        assert_eq!(machine.phase(), DragPhase::PointerDown);
    }

    #[test]
    fn test_second_press_ignored_while_active() {
        let mut machine = DragRescheduler::default();
        machine.pointer_down(1, &item(ItemKind::Proposed, 540, 570), Point::new(0.0, 540.0));
        let outcome = machine.pointer_down(2, &item(ItemKind::Proposed, 600, 630), Point::new(0.0, 600.0));
        assert_eq!(outcome, DragOutcome::Ignored);
        assert_eq!(machine.session().unwrap().pointer_id, 1);
    }

    #[test]
    fn test_cancel_discards_session() {
        let mut machine = DragRescheduler::default();
        machine.pointer_down(1, &item(ItemKind::Proposed, 540, 570), Point::new(0.0, 540.0));
        machine.pointer_move(1, Point::new(0.0, 600.0));
        assert_eq!(
            machine.pointer_cancel(1),
            DragOutcome::Cancelled { proposal_id: "p1".into() }
        );
        assert!(machine.is_idle());
        assert!(machine.session().is_none());
    }

    #[test]
    fn test_dropped_session_cannot_be_cancelled() {
        let mut machine = DragRescheduler::default();
        drag(&mut machine, 540, 570, 30.0);
        assert_eq!(machine.cancel(), DragOutcome::Ignored);
        assert_eq!(machine.phase(), DragPhase::Dropped);
    }

    #[test]
    fn test_small_drag_is_noop() {
        let mut machine = DragRescheduler::default();
        let DragOutcome::Dropped(commit) = drag(&mut machine, 540, 570, 6.0) else {
            panic!("expected drop");
        };
        assert!(commit.is_noop());
    }

    #[test]
    fn test_pixel_scale_applies_to_offset() {
        let mut machine = DragRescheduler::new(DragConfig {
            pixels_per_minute: 2.0,
            ..DragConfig::default()
        });
        machine.pointer_down(1, &item(ItemKind::Proposed, 540, 570), Point::new(0.0, 1080.0));
        machine.pointer_move(1, Point::new(0.0, 1140.0));
        let DragOutcome::Dropped(commit) = machine.pointer_up(1, Point::new(0.0, 1140.0)) else {
            panic!("expected drop");
        };
        assert_eq!(commit.target.start, 570);
    }
}
