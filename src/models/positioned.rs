use super::GalleryItem;

/// A gallery item with its layout-engine-computed box, in container pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedItem {
    pub item: GalleryItem,
    pub column: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PositionedItem {
    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Inputs of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutState {
    pub column_count: usize,
    pub container_width: f32,
    pub gap_px: f32,
}

impl LayoutState {
    pub fn new(column_count: usize, container_width: f32, gap_px: f32) -> Self {
        Self {
            column_count: column_count.max(1),
            container_width,
            gap_px: gap_px.max(0.0),
        }
    }

    /// Width of a single column, or `None` while the container is unmeasured.
    pub fn column_width(&self) -> Option<f32> {
        if self.container_width <= 0.0 {
            return None;
        }
        let columns = self.column_count.max(1) as f32;
        let width = (self.container_width - self.gap_px * (columns - 1.0)) / columns;
        (width > 0.0).then_some(width)
    }
}
