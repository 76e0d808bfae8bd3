use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Viewport;
use crate::layout::{Breakpoints, DEFAULT_COLUMN_BREAKPOINTS};
use crate::models::{CardItem, GalleryItem, LogoItem};
use crate::motion::{AnimationStyle, Ease, EntranceDirection};
use crate::preload::DEFAULT_WORKERS;

/// Smallest autoplay interval the carousel accepts.
pub const MIN_CAROUSEL_INTERVAL_MS: u64 = 1500;

/// One row of a column breakpoint table, e.g. `{ query: "(min-width: 600px)", columns: 3 }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnBreakpoint {
    pub query: String,
    pub columns: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GalleryOptions {
    /// Gap between columns and stacked items, in pixels.
    pub gap_px: f32,
    pub animation_style: AnimationStyle,
    pub entrance_direction: EntranceDirection,
    /// Per-index entrance delay.
    pub stagger_ms: f64,
    pub entrance_duration_ms: f64,
    pub relayout_duration_ms: f64,
    /// Ease used by relayout tweens (`power3.out` style names).
    pub ease: String,
    pub scale_on_hover: bool,
    pub hover_scale: f32,
    pub color_overlay_on_hover: bool,
    pub blur_to_focus: bool,
    /// Multiplier applied to item height hints.
    pub height_scale: f32,
    /// Ordered column table; empty means the built-in table.
    pub breakpoints: Vec<ColumnBreakpoint>,
    pub default_columns: usize,
    /// Seed for random entrance directions; unseeded when absent.
    pub random_seed: Option<u64>,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            gap_px: 16.0,
            animation_style: AnimationStyle::Tween,
            entrance_direction: EntranceDirection::Bottom,
            stagger_ms: 50.0,
            entrance_duration_ms: 800.0,
            relayout_duration_ms: 600.0,
            ease: "power3.out".to_string(),
            scale_on_hover: true,
            hover_scale: 0.95,
            color_overlay_on_hover: false,
            blur_to_focus: true,
            height_scale: 1.0,
            breakpoints: Vec::new(),
            default_columns: 1,
            random_seed: None,
        }
    }
}

impl GalleryOptions {
    pub fn relayout_ease(&self) -> Result<Ease> {
        self.ease.parse()
    }

    pub fn column_breakpoints(&self) -> Result<Breakpoints<usize>> {
        if self.breakpoints.is_empty() {
            return Ok(DEFAULT_COLUMN_BREAKPOINTS.clone());
        }
        let entries: Vec<(&str, usize)> = self
            .breakpoints
            .iter()
            .map(|b| (b.query.as_str(), b.columns.max(1)))
            .collect();
        Breakpoints::parse(&entries, self.default_columns.max(1))
    }

    /// Clamp out-of-range values and check the parsed fields.
    pub fn validate(&mut self) -> Result<()> {
        self.gap_px = self.gap_px.max(0.0);
        self.stagger_ms = self.stagger_ms.max(0.0);
        self.entrance_duration_ms = self.entrance_duration_ms.max(0.0);
        self.relayout_duration_ms = self.relayout_duration_ms.max(0.0);
        if self.height_scale <= 0.0 {
            self.height_scale = 1.0;
        }
        if self.hover_scale <= 0.0 {
            self.hover_scale = 1.0;
        }
        self.default_columns = self.default_columns.max(1);
        self.relayout_ease()?;
        self.column_breakpoints()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarqueeDirection {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MarqueeOptions {
    /// Pixels per second. A negative speed reverses the direction.
    pub speed: f32,
    pub direction: MarqueeDirection,
    pub gap_px: f32,
    pub item_height_px: f32,
    pub pause_on_hover: bool,
    pub fade_edges: bool,
    pub suspend_when_hidden: bool,
    pub scale_on_hover: bool,
}

impl Default for MarqueeOptions {
    fn default() -> Self {
        Self {
            speed: 120.0,
            direction: MarqueeDirection::Left,
            gap_px: 32.0,
            item_height_px: 28.0,
            pause_on_hover: true,
            fade_edges: false,
            suspend_when_hidden: true,
            scale_on_hover: false,
        }
    }
}

impl MarqueeOptions {
    /// Signed velocity in px/s; positive scrolls the track left.
    pub fn target_velocity(&self) -> f32 {
        let dir = match self.direction {
            MarqueeDirection::Left => 1.0,
            MarqueeDirection::Right => -1.0,
        };
        let sign = if self.speed < 0.0 { -1.0 } else { 1.0 };
        self.speed.abs() * dir * sign
    }

    pub fn validate(&mut self) {
        self.gap_px = self.gap_px.max(0.0);
        self.item_height_px = self.item_height_px.max(0.0);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CarouselOptions {
    pub initial_scroll_px: f32,
    pub auto_play: bool,
    pub interval_ms: u64,
    pub pause_on_hover: bool,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            initial_scroll_px: 0.0,
            auto_play: true,
            interval_ms: 3500,
            pause_on_hover: true,
        }
    }
}

impl CarouselOptions {
    /// Autoplay interval with the floor applied.
    pub fn effective_interval_ms(&self) -> u64 {
        self.interval_ms.max(MIN_CAROUSEL_INTERVAL_MS)
    }

    pub fn validate(&mut self) {
        self.interval_ms = self.effective_interval_ms();
        self.initial_scroll_px = self.initial_scroll_px.max(0.0);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    pub reduced_motion: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            reduced_motion: false,
        }
    }
}

impl ViewportConfig {
    pub fn to_viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height).with_reduced_motion(self.reduced_motion)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GallerySection {
    pub items: Vec<GalleryItem>,
    /// Directory scanned for items when `items` is empty.
    pub media_dir: Option<PathBuf>,
    pub options: GalleryOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MarqueeSection {
    pub items: Vec<LogoItem>,
    pub options: MarqueeOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CarouselSection {
    pub items: Vec<CardItem>,
    pub options: CarouselOptions,
}

/// Everything a showcase run needs: viewport, the three sections and the
/// preloader size.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SiteManifest {
    pub viewport: ViewportConfig,
    pub gallery: GallerySection,
    pub marquee: MarqueeSection,
    pub carousel: CarouselSection,
    pub preload_workers: usize,
}

impl Default for SiteManifest {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            gallery: GallerySection::default(),
            marquee: MarqueeSection::default(),
            carousel: CarouselSection::default(),
            preload_workers: DEFAULT_WORKERS,
        }
    }
}

impl SiteManifest {
    /// Load, validate and apply `ATELIER_*` environment overrides.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|source| Error::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = Self::from_yaml_str(&s)?;
        manifest.apply_overrides(|key| std::env::var(key).ok());
        Ok(manifest)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(s)?;
        manifest.validated()
    }

    pub fn validated(mut self) -> Result<Self> {
        self.gallery.options.validate()?;
        self.marquee.options.validate();
        self.carousel.options.validate();
        self.preload_workers = self.preload_workers.max(1);
        Ok(self)
    }

    /// Apply overrides looked up through `lookup` (the process environment
    /// in production). Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(reduced) = lookup("ATELIER_REDUCED_MOTION").and_then(|v| parse_flag(&v)) {
            debug!(reduced, "Reduced motion overridden from environment");
            self.viewport.reduced_motion = reduced;
        }
        if let Some(workers) = lookup("ATELIER_PRELOAD_WORKERS").and_then(|v| v.trim().parse::<usize>().ok()) {
            debug!(workers, "Preload workers overridden from environment");
            self.preload_workers = workers.max(1);
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let manifest = SiteManifest::from_yaml_str("{}").unwrap();
        assert_eq!(manifest.gallery.options.gap_px, 16.0);
        assert_eq!(manifest.gallery.options.stagger_ms, 50.0);
        assert_eq!(
            manifest.gallery.options.entrance_direction,
            EntranceDirection::Bottom
        );
        assert_eq!(manifest.marquee.options.speed, 120.0);
        assert_eq!(manifest.marquee.options.gap_px, 32.0);
        assert_eq!(manifest.carousel.options.interval_ms, 3500);
        assert_eq!(manifest.preload_workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_parse_manifest() {
        let yaml = r#"
viewport:
  width: 1600
  height: 900
gallery:
  options:
    animation-style: css-transition
    entrance-direction: random
    random-seed: 42
    breakpoints:
      - { query: "(min-width: 1200px)", columns: 6 }
  items:
    - { id: "1", media-ref: "/a.jpg", height: 400 }
    - { id: "2", media-ref: "/b.mp4" }
marquee:
  options: { direction: right, speed: 80 }
  items:
    - { media-ref: "/logo.svg", link-href: "https://example.com" }
carousel:
  options: { interval-ms: 200, auto-play: false }
  items:
    - { media-ref: "/card.jpg", title: "Card" }
"#;
        let manifest = SiteManifest::from_yaml_str(yaml).unwrap();
        let gallery = &manifest.gallery;
        assert_eq!(gallery.items.len(), 2);
        assert_eq!(gallery.options.animation_style, AnimationStyle::CssTransition);
        assert_eq!(gallery.options.random_seed, Some(42));
        let columns = gallery.options.column_breakpoints().unwrap();
        assert_eq!(columns.resolve(&manifest.viewport.to_viewport()), 6);
        assert_eq!(manifest.marquee.options.target_velocity(), -80.0);
        assert_eq!(manifest.carousel.options.interval_ms, MIN_CAROUSEL_INTERVAL_MS);
        assert!(!manifest.carousel.options.auto_play);
    }

    #[test]
    fn test_invalid_ease_rejected() {
        let err = SiteManifest::from_yaml_str("gallery: { options: { ease: wobble } }").unwrap_err();
        assert!(matches!(err, Error::InvalidEase(_)));
    }

    #[test]
    fn test_invalid_query_rejected() {
        let yaml = "gallery: { options: { breakpoints: [ { query: \"wide\", columns: 2 } ] } }";
        let err = SiteManifest::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_target_velocity_signs() {
        let mut opts = MarqueeOptions::default();
        assert_eq!(opts.target_velocity(), 120.0);
        opts.speed = -50.0;
        assert_eq!(opts.target_velocity(), -50.0);
        opts.direction = MarqueeDirection::Right;
        assert_eq!(opts.target_velocity(), 50.0);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ATELIER_REDUCED_MOTION", "yes"),
            ("ATELIER_PRELOAD_WORKERS", "0"),
        ]
        .into_iter()
        .collect();
        let mut manifest = SiteManifest::default();
        manifest.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert!(manifest.viewport.reduced_motion);
        assert_eq!(manifest.preload_workers, 1);

        let mut manifest = SiteManifest::default();
        manifest.apply_overrides(|_| Some("maybe".into()));
        assert!(!manifest.viewport.reduced_motion);
        assert_eq!(manifest.preload_workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_missing_file() {
        let err = SiteManifest::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, Error::ManifestIo { .. }));
    }
}
