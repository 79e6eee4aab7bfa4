//! Timeline layout.
//!
//! Turns a day's fixed events and proposals into render geometry:
//!
//! 1. normalize to minutes (proposals snap to the grid)
//! 2. pad short items to a minimum visual height
//! 3. sort by start, longer items first on ties
//! 4. cluster items whose visual ranges overlap
//! 5. pack each cluster into columns, first fit
//!
//! Column counts are computed per cluster. Two neighbouring clusters that do
//! not overlap each other may therefore show different column widths; the
//! packing is local on purpose and is not evened out across the day.
//!
//! Layout is a pure function of its input and is recomputed in full after
//! every change. [`DisplayItem`]s are never the source of truth.

use serde::{Deserialize, Serialize};

use crate::clock::{self, DAY_MINUTES};
use crate::scheduler::Proposal;
use crate::timeline::{FixedEntry, Span};

/// Layout configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Items shorter than this are drawn this tall (minutes)
    pub min_visual_height: u32,
    /// Proposal times snap to this step (minutes)
    pub grid_step: u32,
    /// Vertical scale: one minute is this many pixels
    pub pixels_per_minute: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_visual_height: 20,
            grid_step: 15,
            pixels_per_minute: 1.0,
        }
    }
}

/// Whether an item can be moved by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Fixed,
    Proposed,
}

/// One item to lay out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimelineEntry {
    Fixed { id: String, title: String, span: Span },
    Proposed { id: String, title: String, span: Span },
}

impl TimelineEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Fixed { id, .. } | Self::Proposed { id, .. } => id,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Fixed { .. } => ItemKind::Fixed,
            Self::Proposed { .. } => ItemKind::Proposed,
        }
    }
}

impl From<&FixedEntry> for TimelineEntry {
    fn from(entry: &FixedEntry) -> Self {
        Self::Fixed {
            id: entry.id.clone(),
            title: entry.title.clone(),
            span: entry.span,
        }
    }
}

impl From<&Proposal> for TimelineEntry {
    fn from(proposal: &Proposal) -> Self {
        Self::Proposed {
            id: proposal.stable_id.clone(),
            title: proposal.task_name.clone(),
            span: proposal.span(),
        }
    }
}

/// Render geometry for one item.
///
/// `top`/`height` are in pixels, `left`/`width` in percent of the day column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItem {
    pub id: String,
    pub title: String,
    pub kind: ItemKind,
    #[serde(with = "clock::hhmm")]
    pub start: u32,
    #[serde(with = "clock::hhmm")]
    pub end: u32,
    pub visual_start: u32,
    pub visual_end: u32,
    pub column_index: usize,
    pub column_count: usize,
    pub top: f64,
    pub height: f64,
    pub left: f64,
    pub width: f64,
}

impl DisplayItem {
    pub fn duration_minutes(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_movable(&self) -> bool {
        self.kind == ItemKind::Proposed
    }
}

/// Lays out a day's items into non-overlapping columns.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out fixed events and proposals of one day.
    pub fn layout_day(&self, fixed: &[FixedEntry], proposals: &[Proposal]) -> Vec<DisplayItem> {
        let entries: Vec<TimelineEntry> = fixed
            .iter()
            .map(TimelineEntry::from)
            .chain(proposals.iter().map(TimelineEntry::from))
            .collect();
        self.layout(&entries)
    }

    /// Lay out arbitrary entries. Output is in visual order.
    pub fn layout(&self, entries: &[TimelineEntry]) -> Vec<DisplayItem> {
        let mut items: Vec<DisplayItem> = entries.iter().map(|e| self.normalize(e)).collect();

        items.sort_by(|a, b| {
            a.visual_start
                .cmp(&b.visual_start)
                .then_with(|| {
                    (b.visual_end - b.visual_start).cmp(&(a.visual_end - a.visual_start))
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut cluster_start = 0;
        let mut cluster_end = 0;
        for i in 0..items.len() {
            if i > cluster_start && items[i].visual_start >= cluster_end {
                self.pack(&mut items[cluster_start..i]);
                cluster_start = i;
            }
            if i == cluster_start {
                cluster_end = items[i].visual_end;
            } else {
                cluster_end = cluster_end.max(items[i].visual_end);
            }
        }
        if cluster_start < items.len() {
            self.pack(&mut items[cluster_start..]);
        }

        items
    }

    /// Minutes, grid snapping for proposals, and the padded visual range.
    fn normalize(&self, entry: &TimelineEntry) -> DisplayItem {
        let (id, title, span) = match entry {
            TimelineEntry::Fixed { id, title, span } | TimelineEntry::Proposed { id, title, span } => {
                (id, title, span)
            }
        };

        let (start, end) = match entry.kind() {
            ItemKind::Proposed => {
                let step = self.config.grid_step.clamp(1, DAY_MINUTES);
                let start = clock::clamp_minute(
                    clock::snap_to_grid(f64::from(span.start), step),
                    0,
                    DAY_MINUTES - step,
                );
                let end = clock::clamp_minute(
                    clock::snap_to_grid(f64::from(span.end), step),
                    start + step,
                    DAY_MINUTES,
                );
                (start, end)
            }
            ItemKind::Fixed => {
                let start = span.start.min(DAY_MINUTES);
                (start, span.end.clamp(start, DAY_MINUTES))
            }
        };

        let height_minutes = (end - start).max(self.config.min_visual_height).min(DAY_MINUTES);
        let visual_start = start.min(DAY_MINUTES - height_minutes);
        let visual_end = visual_start + height_minutes;

        DisplayItem {
            id: id.clone(),
            title: title.clone(),
            kind: entry.kind(),
            start,
            end,
            visual_start,
            visual_end,
            column_index: 0,
            column_count: 1,
            top: f64::from(visual_start) * self.config.pixels_per_minute,
            height: f64::from(height_minutes) * self.config.pixels_per_minute,
            left: 0.0,
            width: 100.0,
        }
    }

    /// First-fit column packing within one cluster.
    fn pack(&self, cluster: &mut [DisplayItem]) {
        let mut column_ends: Vec<u32> = Vec::new();
        for item in cluster.iter_mut() {
            let column = match column_ends.iter().position(|&end| end <= item.visual_start) {
                Some(column) => column,
                None => {
                    column_ends.push(0);
                    column_ends.len() - 1
                }
            };
            column_ends[column] = item.visual_end;
            item.column_index = column;
        }

        let count = column_ends.len().max(1);
        for item in cluster.iter_mut() {
            item.column_count = count;
            item.width = 100.0 / count as f64;
            item.left = item.column_index as f64 * 100.0 / count as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(id: &str, start: u32, end: u32) -> TimelineEntry {
        TimelineEntry::Fixed {
            id: id.to_string(),
            title: id.to_string(),
            span: Span { start, end },
        }
    }

    fn proposed(id: &str, start: u32, end: u32) -> TimelineEntry {
        TimelineEntry::Proposed {
            id: id.to_string(),
            title: id.to_string(),
            span: Span { start, end },
        }
    }

    fn find<'a>(items: &'a [DisplayItem], id: &str) -> &'a DisplayItem {
        items.iter().find(|i| i.id == id).unwrap()
    }

    #[test]
    fn test_single_item_full_width() {
        let items = LayoutEngine::default().layout(&[fixed("a", 540, 600)]);
        let a = &items[0];
        assert_eq!((a.top, a.height, a.left, a.width), (540.0, 60.0, 0.0, 100.0));
        assert_eq!((a.column_index, a.column_count), (0, 1));
    }

    #[test]
    fn test_overlapping_pair_split_in_two_columns() {
        let items = LayoutEngine::default().layout(&[fixed("a", 540, 600), proposed("b", 570, 630)]);
        let (a, b) = (find(&items, "a"), find(&items, "b"));
        assert_eq!((a.column_index, b.column_index), (0, 1));
        assert_eq!((a.column_count, b.column_count), (2, 2));
        assert_eq!((a.width, b.left), (50.0, 50.0));
    }

    #[test]
    fn test_back_to_back_items_share_column() {
        let items = LayoutEngine::default().layout(&[fixed("a", 540, 600), fixed("b", 600, 660)]);
        assert!(items.iter().all(|i| i.column_count == 1 && i.column_index == 0));
    }

    #[test]
    fn test_short_item_padded_for_overlap() {
        // 5 minute event is drawn 20 minutes tall and collides with the next one
        let items = LayoutEngine::default().layout(&[fixed("a", 540, 545), fixed("b", 550, 600)]);
        let a = find(&items, "a");
        assert_eq!((a.start, a.end), (540, 545));
        assert_eq!((a.visual_start, a.visual_end), (540, 560));
        assert_eq!(a.height, 20.0);
        assert_eq!(a.column_count, 2);
    }

    #[test]
    fn test_column_reuse_in_cluster() {
        // a spans everything, b and c sit side by side with a, c reuses b's column
        let items = LayoutEngine::default().layout(&[
            fixed("a", 540, 720),
            fixed("b", 540, 600),
            fixed("c", 600, 660),
        ]);
        assert_eq!(find(&items, "a").column_index, 0);
        assert_eq!(find(&items, "b").column_index, 1);
        assert_eq!(find(&items, "c").column_index, 1);
        assert!(items.iter().all(|i| i.column_count == 2));
    }

    #[test]
    fn test_column_counts_are_per_cluster() {
        let items = LayoutEngine::default().layout(&[
            fixed("a", 540, 600),
            fixed("b", 540, 600),
            fixed("c", 540, 600),
            fixed("d", 700, 760),
        ]);
        assert_eq!(find(&items, "a").column_count, 3);
        assert_eq!(find(&items, "d").column_count, 1);
        assert_eq!(find(&items, "d").width, 100.0);
    }

    #[test]
    fn test_longer_item_anchors_cluster() {
        let items = LayoutEngine::default().layout(&[fixed("short", 540, 570), fixed("long", 540, 660)]);
        assert_eq!(items[0].id, "long");
        assert_eq!(find(&items, "long").column_index, 0);
    }

    #[test]
    fn test_proposal_snapped_but_fixed_untouched() {
        let items = LayoutEngine::default().layout(&[fixed("f", 547, 583), proposed("p", 547, 583)]);
        let (f, p) = (find(&items, "f"), find(&items, "p"));
        assert_eq!((f.start, f.end), (547, 583));
        assert_eq!((p.start, p.end), (540, 585));
    }

    #[test]
    fn test_proposal_gets_at_least_one_step() {
        let items = LayoutEngine::default().layout(&[proposed("p", 600, 605)]);
        assert_eq!((items[0].start, items[0].end), (600, 615));
    }

    #[test]
    fn test_late_item_clamped_inside_day() {
        let items = LayoutEngine::default().layout(&[fixed("late", 1435, 1440), proposed("p", 1440, 1440)]);
        for item in &items {
            assert!(item.visual_end <= DAY_MINUTES);
            assert!(item.height > 0.0);
            assert!(item.top + item.height <= 1440.0);
        }
        let p = find(&items, "p");
        assert_eq!((p.start, p.end), (1425, 1440));
    }

    #[test]
    fn test_pixel_scale() {
        let engine = LayoutEngine::new(LayoutConfig {
            pixels_per_minute: 2.0,
            ..LayoutConfig::default()
        });
        let items = engine.layout(&[fixed("a", 60, 90)]);
        assert_eq!((items[0].top, items[0].height), (120.0, 60.0));
    }

    #[test]
    fn test_layout_day_mixes_kinds() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let fixed_entries = vec![FixedEntry::new("ev", "Standup", Span { start: 540, end: 570 })];
        let proposals = vec![Proposal::manual("p1", "Write", date, 540, 600).unwrap()];
        let items = LayoutEngine::default().layout_day(&fixed_entries, &proposals);
        assert_eq!(items.len(), 2);
        assert_eq!(find(&items, "p1").kind, ItemKind::Proposed);
        assert_eq!(find(&items, "ev").kind, ItemKind::Fixed);
        assert!(find(&items, "p1").is_movable());
    }
}
