use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use xxhash_rust::xxh3::xxh3_64;

use super::masonry::{MasonryLayout, MeasuredSizes};
use crate::models::{GalleryItem, PositionedItem};

/// Maximum number of cached layouts to keep in memory.
const MAX_CACHE_ENTRIES: usize = 8;

/// Key for the layout cache. Floats are keyed by their bit patterns so a hit
/// reproduces the exact same output.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct CacheKey {
    columns: usize,
    width_bits: u32,
    gap_bits: u32,
    scale_bits: u32,
    list_hash: u64,
}

/// Placement of one item, enough to rebuild a `PositionedItem`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    column: usize,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Layout cache for masonry passes.
///
/// Resizing back and forth between breakpoints revisits the same handful of
/// (columns, width) pairs; those hits skip the placement loop entirely.
///
/// The list hash covers id, media ref and height hint of every item in order,
/// plus any measured natural size, so any change to the list misses.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, Vec<Slot>>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(MAX_CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Computes a fast hash of the item list and the sizes measured for it.
    pub fn compute_list_hash(items: &[GalleryItem], measured: &MeasuredSizes) -> u64 {
        let mut hasher_input = Vec::with_capacity(items.len() * 64);

        for item in items {
            hasher_input.extend_from_slice(item.id.as_bytes());
            hasher_input.push(0);
            hasher_input.extend_from_slice(item.media_ref.as_bytes());
            hasher_input.push(0);
            let hint = item.height_hint.map(f32::to_bits).unwrap_or(u32::MAX);
            hasher_input.extend_from_slice(&hint.to_le_bytes());
            if let Some((w, h)) = measured.get(&item.media_ref) {
                hasher_input.extend_from_slice(&w.to_le_bytes());
                hasher_input.extend_from_slice(&h.to_le_bytes());
            }
        }

        xxh3_64(&hasher_input)
    }

    fn key(layout: &MasonryLayout, columns: usize, width: f32, list_hash: u64) -> CacheKey {
        CacheKey {
            columns: columns.max(1),
            width_bits: width.to_bits(),
            gap_bits: layout.gap.to_bits(),
            scale_bits: layout.height_scale.to_bits(),
            list_hash,
        }
    }

    /// Computes the layout, using cached placements when available.
    pub fn compute(
        &self,
        layout: &MasonryLayout,
        items: &[GalleryItem],
        columns: usize,
        width: f32,
        measured: &MeasuredSizes,
    ) -> Vec<PositionedItem> {
        if items.is_empty() || width <= 0.0 {
            return Vec::new();
        }

        let key = Self::key(layout, columns, width, Self::compute_list_hash(items, measured));

        if let Some(slots) = self.cache.lock().get(&key) {
            if slots.len() == items.len() {
                return rebuild(items, slots);
            }
        }

        let positioned = layout.compute_measured(items, columns, width, measured);
        let slots = positioned
            .iter()
            .map(|p| Slot {
                column: p.column,
                x: p.x,
                y: p.y,
                width: p.width,
                height: p.height,
            })
            .collect();
        self.cache.lock().put(key, slots);
        positioned
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

fn rebuild(items: &[GalleryItem], slots: &[Slot]) -> Vec<PositionedItem> {
    items
        .iter()
        .zip(slots.iter())
        .map(|(item, slot)| PositionedItem {
            item: item.clone(),
            column: slot.column,
            x: slot.x,
            y: slot.y,
            width: slot.width,
            height: slot.height,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_items(n: usize) -> Vec<GalleryItem> {
        (0..n)
            .map(|i| GalleryItem::new(format!("g{}", i), format!("/g/{}.jpg", i), 100.0 + i as f32 * 37.0))
            .collect()
    }

    #[test]
    fn test_list_hash_changes_on_order() {
        let items = make_items(3);
        let mut reversed = items.clone();
        reversed.reverse();
        let measured = MeasuredSizes::new();
        assert_eq!(
            LayoutCache::compute_list_hash(&items, &measured),
            LayoutCache::compute_list_hash(&items, &measured)
        );
        assert_ne!(
            LayoutCache::compute_list_hash(&items, &measured),
            LayoutCache::compute_list_hash(&reversed, &measured)
        );
    }

    #[test]
    fn test_list_hash_changes_on_measurement() {
        let items = vec![GalleryItem::without_hint("a", "/a.jpg")];
        let mut measured = MeasuredSizes::new();
        let before = LayoutCache::compute_list_hash(&items, &measured);
        measured.insert("/a.jpg".into(), (10, 20));
        assert_ne!(before, LayoutCache::compute_list_hash(&items, &measured));
    }

    #[test]
    fn test_cache_hit_matches_compute() {
        let cache = LayoutCache::new();
        let layout = MasonryLayout::default();
        let items = make_items(10);
        let measured = MeasuredSizes::new();

        let first = cache.compute(&layout, &items, 3, 1200.0, &measured);
        let second = cache.compute(&layout, &items, 3, 1200.0, &measured);
        assert_eq!(first, second);
        assert_eq!(first, layout.compute(&items, 3, 1200.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = LayoutCache::new();
        let layout = MasonryLayout::default();
        let items = make_items(4);
        let measured = MeasuredSizes::new();
        for i in 0..(MAX_CACHE_ENTRIES + 5) {
            cache.compute(&layout, &items, 2, 800.0 + i as f32, &measured);
        }
        assert_eq!(cache.len(), MAX_CACHE_ENTRIES);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_items() {
        let cache = LayoutCache::new();
        let layout = MasonryLayout::default();
        assert!(cache
            .compute(&layout, &[], 3, 1200.0, &MeasuredSizes::new())
            .is_empty());
        assert!(cache.is_empty());
    }
}
