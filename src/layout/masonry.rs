use std::collections::HashMap;

use crate::models::{GalleryItem, LayoutState, PositionedItem};

/// Natural pixel sizes keyed by media ref, filled in by preloading.
pub type MeasuredSizes = HashMap<String, (u32, u32)>;

/// Configuration for the shortest-column masonry algorithm.
///
/// Items keep their input order; each one drops into whichever column is
/// currently shortest.
#[derive(Debug, Clone, PartialEq)]
pub struct MasonryLayout {
    /// Gap between columns and between stacked items (default: 16)
    pub gap: f32,
    /// Multiplier applied to caller height hints (default: 1)
    pub height_scale: f32,
}

impl Default for MasonryLayout {
    fn default() -> Self {
        Self {
            gap: 16.0,
            height_scale: 1.0,
        }
    }
}

impl MasonryLayout {
    pub fn new(gap: f32, height_scale: f32) -> Self {
        Self {
            gap: gap.max(0.0),
            height_scale: if height_scale > 0.0 { height_scale } else { 1.0 },
        }
    }

    fn item_height(&self, item: &GalleryItem, column_width: f32, measured: &MeasuredSizes) -> f32 {
        if let Some(hint) = item.height_hint.filter(|h| *h > 0.0) {
            return hint * self.height_scale;
        }
        match measured.get(&item.media_ref) {
            Some(&(w, h)) if w > 0 && h > 0 => column_width * h as f32 / w as f32,
            // Videos without a probe default to 16:9, everything else square.
            _ if item.is_video() => column_width * 9.0 / 16.0,
            _ => column_width,
        }
    }

    /// Lay out `items` across `columns` columns of a container `width` wide.
    pub fn compute(&self, items: &[GalleryItem], columns: usize, width: f32) -> Vec<PositionedItem> {
        self.compute_measured(items, columns, width, &MeasuredSizes::new())
    }

    /// Computes the full layout from scratch.
    ///
    /// # Algorithm
    /// 1. Derive the column width from the container width and gaps.
    /// 2. For each item in order, pick the column with the smallest running
    ///    height (lowest index on ties).
    /// 3. Place the item at that column's running height and grow the column
    ///    by the item height plus one gap.
    ///
    /// An unmeasured (zero-width) container produces an empty layout.
    pub fn compute_measured(
        &self,
        items: &[GalleryItem],
        columns: usize,
        width: f32,
        measured: &MeasuredSizes,
    ) -> Vec<PositionedItem> {
        let state = LayoutState::new(columns, width, self.gap);
        let Some(column_width) = state.column_width() else {
            return Vec::new();
        };
        if items.is_empty() {
            return Vec::new();
        }

        let mut heights = vec![0.0f32; state.column_count];
        let mut out = Vec::with_capacity(items.len());

        for item in items {
            let column = shortest_column(&heights);
            let height = self.item_height(item, column_width, measured);
            let x = column as f32 * (column_width + state.gap_px);
            let y = heights[column];
            heights[column] += height + state.gap_px;
            out.push(PositionedItem {
                item: item.clone(),
                column,
                x,
                y,
                width: column_width,
                height,
            });
        }

        out
    }

    /// Height of the tallest column, without the trailing gap.
    pub fn total_height(&self, positioned: &[PositionedItem]) -> f32 {
        positioned
            .iter()
            .map(PositionedItem::bottom)
            .fold(0.0f32, f32::max)
    }
}

fn shortest_column(heights: &[f32]) -> usize {
    let mut best = 0;
    for (index, height) in heights.iter().enumerate().skip(1) {
        if *height < heights[best] {
            best = index;
        }
    }
    best
}
