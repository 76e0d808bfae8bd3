pub mod breakpoints;
pub mod layout_cache;
pub mod masonry;

pub use breakpoints::{Breakpoints, ResponsiveValue, DEFAULT_COLUMN_BREAKPOINTS};
pub use layout_cache::LayoutCache;
pub use masonry::{MasonryLayout, MeasuredSizes};
