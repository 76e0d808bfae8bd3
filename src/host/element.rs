/// Addressable handle of a rendered box. Components receive these from the
/// host instead of querying a render tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u64);

/// Measured metrics of an element. `width` doubles as the client width of
/// scroll containers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBox {
    pub width: f32,
    pub height: f32,
    pub margin_right: f32,
    pub scroll_left: f32,
    pub scroll_width: f32,
}

impl ElementBox {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_margin_right(mut self, margin: f32) -> Self {
        self.margin_right = margin;
        self
    }

    pub fn with_scroll_width(mut self, scroll_width: f32) -> Self {
        self.scroll_width = scroll_width;
        self
    }

    /// Largest reachable `scroll_left`.
    pub fn max_scroll(&self) -> f32 {
        (self.scroll_width - self.width).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}
