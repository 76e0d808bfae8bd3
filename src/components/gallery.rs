//! Masonry gallery with staggered entrance, hover tracks and a lightbox.
//!
//! Column count follows the breakpoint table, the container width follows
//! its resize observer (or the window resize fallback). Entrance waits for
//! the asset batch to settle, runs once per mount and is re-armed only by a
//! new item list. Every later pass is a relayout.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::modal::{Modal, ModalTarget};
use super::Component;
use crate::config::GalleryOptions;
use crate::error::Result;
use crate::host::{holds, Dispatch, ElementId, Handle, Host, HostEvent, Listen};
use crate::layout::{LayoutCache, MasonryLayout, MeasuredSizes, ResponsiveValue};
use crate::models::{GalleryItem, PositionedItem};
use crate::motion::{strategy_for, Ease, EntranceStrategy, LayoutTracks, MotionContext, Props, Track};
use crate::preload::{AssetPreloader, AssetRequest};

const HOVER_MS: f64 = 300.0;
const HOVER_OVERLAY_OPACITY: f32 = 0.3;

/// Minimum container height used to centre entrances from `center`.
const MIN_CONTAINER_HEIGHT: f32 = 200.0;

/// Hover state of one item, animated independently of layout.
struct HoverTracks {
    scale: Track<f32>,
    overlay: Track<f32>,
}

impl HoverTracks {
    fn new() -> Self {
        Self {
            scale: Track::new(1.0),
            overlay: Track::new(0.0),
        }
    }
}

/// What a renderer draws for one item on the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedItem {
    pub id: String,
    pub props: Props,
    /// Hover scale, composed on top of `props.scale`.
    pub hover_scale: f32,
    pub overlay_opacity: f32,
    /// Loaded poster to show for a video item.
    pub poster: Option<String>,
}

pub struct Gallery {
    options: GalleryOptions,
    items: Vec<GalleryItem>,
    container: ElementId,
    container_width: f32,
    columns: ResponsiveValue<usize>,
    container_observer: Option<Handle>,
    window_resize: Option<Handle>,
    preloader: Arc<AssetPreloader>,
    preload_task: Option<Handle>,
    measured: MeasuredSizes,
    posters: HashMap<String, String>,
    assets_ready: bool,
    engine: MasonryLayout,
    cache: LayoutCache,
    layout: Vec<PositionedItem>,
    strategy: Box<dyn EntranceStrategy>,
    relayout_ease: Ease,
    entered: bool,
    tracks: LayoutTracks,
    hover: HashMap<String, HoverTracks>,
    frame: Option<Handle>,
    modal: Modal<PositionedItem>,
}

impl Gallery {
    pub fn mount(
        host: &Host,
        container: ElementId,
        items: Vec<GalleryItem>,
        options: GalleryOptions,
        preloader: Arc<AssetPreloader>,
    ) -> Result<Self> {
        let relayout_ease = options.relayout_ease()?;
        let columns = ResponsiveValue::attach(host, options.column_breakpoints()?);
        let container_observer = host.observe_resize(container);
        let window_resize = match container_observer {
            Some(_) => None,
            None => {
                debug!("Resize observation unavailable, falling back to window resize");
                Some(host.listen(Listen::WindowResize))
            }
        };

        let mut gallery = Self {
            engine: MasonryLayout::new(options.gap_px, options.height_scale),
            strategy: strategy_for(
                options.animation_style,
                options.entrance_direction,
                options.random_seed,
            ),
            relayout_ease,
            options,
            items,
            container,
            container_width: host.element(container).map(|b| b.width).unwrap_or(0.0),
            columns,
            container_observer,
            window_resize,
            preloader,
            preload_task: None,
            measured: MeasuredSizes::new(),
            posters: HashMap::new(),
            assets_ready: false,
            cache: LayoutCache::new(),
            layout: Vec::new(),
            entered: false,
            tracks: LayoutTracks::new(),
            hover: HashMap::new(),
            frame: None,
            modal: Modal::new(),
        };
        gallery.start_preload(host);
        gallery.recompute(host);
        Ok(gallery)
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn layout(&self) -> &[PositionedItem] {
        &self.layout
    }

    pub fn columns(&self) -> usize {
        *self.columns.value()
    }

    pub fn container_width(&self) -> f32 {
        self.container_width
    }

    /// Height of the tallest column.
    pub fn content_height(&self) -> f32 {
        self.engine.total_height(&self.layout)
    }

    pub fn assets_ready(&self) -> bool {
        self.assets_ready
    }

    pub fn has_entered(&self) -> bool {
        self.entered
    }

    pub fn is_animating(&self) -> bool {
        self.frame.is_some()
    }

    pub fn modal(&self) -> &Modal<PositionedItem> {
        &self.modal
    }

    /// Replace the item list. An identical list is a no-op; a different one
    /// re-arms the entrance and preloads again.
    pub fn set_items(&mut self, host: &Host, items: Vec<GalleryItem>) {
        if items == self.items {
            trace!("Gallery items unchanged");
            return;
        }
        debug!(count = items.len(), "Gallery items replaced");
        self.items = items;
        self.entered = false;
        self.assets_ready = false;
        self.measured.clear();
        self.posters.clear();
        self.tracks.clear();
        self.hover.clear();
        self.start_preload(host);
        self.recompute(host);
    }

    pub fn hover(&mut self, host: &Host, id: &str, hovered: bool) {
        if !self.layout.iter().any(|p| p.id() == id) {
            return;
        }
        let now = host.now_ms();
        let tracks = self
            .hover
            .entry(id.to_string())
            .or_insert_with(HoverTracks::new);
        if self.options.scale_on_hover {
            let scale = if hovered { self.options.hover_scale } else { 1.0 };
            tracks.scale.to(now, scale, HOVER_MS, 0.0, Ease::POWER2_OUT);
        }
        if self.options.color_overlay_on_hover {
            let opacity = if hovered { HOVER_OVERLAY_OPACITY } else { 0.0 };
            tracks.overlay.to(now, opacity, HOVER_MS, 0.0, Ease::Out(1));
        }
        self.ensure_frame(host);
    }

    /// Open the lightbox on the clicked item.
    pub fn click(&mut self, host: &Host, id: &str) {
        if let Some(p) = self.layout.iter().find(|p| p.id() == id) {
            self.modal.open(host, p.clone());
        }
    }

    pub fn modal_click(&mut self, host: &Host, target: ModalTarget) {
        self.modal.click(host, target);
    }

    pub fn close_modal(&mut self, host: &Host) {
        self.modal.close(host);
    }

    pub fn render(&self) -> Vec<RenderedItem> {
        self.layout
            .iter()
            .map(|p| {
                let props = self
                    .tracks
                    .get(p.id())
                    .map(Track::value)
                    .unwrap_or_else(|| Props {
                        opacity: 0.0,
                        ..Props::at(p.x, p.y, p.width, p.height)
                    });
                let (hover_scale, overlay_opacity) = self
                    .hover
                    .get(p.id())
                    .map(|h| (h.scale.value(), h.overlay.value()))
                    .unwrap_or((1.0, 0.0));
                RenderedItem {
                    id: p.item.id.clone(),
                    props,
                    hover_scale,
                    overlay_opacity,
                    poster: self.posters.get(&p.item.media_ref).cloned(),
                }
            })
            .collect()
    }

    fn start_preload(&mut self, host: &Host) {
        let assets = self
            .items
            .iter()
            .map(|item| {
                AssetRequest::new(item.media_ref.clone(), item.kind).with_poster(item.poster.clone())
            })
            .collect();
        self.preload_task = Some(self.preloader.preload(host, assets));
    }

    fn motion_context(&self, host: &Host) -> MotionContext {
        let viewport = host.viewport();
        MotionContext {
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            container_width: self.container_width,
            container_height: self.content_height().max(MIN_CONTAINER_HEIGHT),
            stagger_ms: self.options.stagger_ms,
            entrance_duration_ms: self.options.entrance_duration_ms,
            relayout_duration_ms: self.options.relayout_duration_ms,
            entrance_ease: Ease::POWER3_OUT,
            relayout_ease: self.relayout_ease,
            blur_to_focus: self.options.blur_to_focus,
        }
    }

    /// Full layout pass followed by entrance or relayout motion.
    fn recompute(&mut self, host: &Host) {
        self.layout = self.cache.compute(
            &self.engine,
            &self.items,
            self.columns(),
            self.container_width,
            &self.measured,
        );
        debug!(
            columns = self.columns(),
            width = self.container_width,
            items = self.layout.len(),
            "Gallery layout pass"
        );
        if !self.assets_ready || self.layout.is_empty() {
            return;
        }

        let now = host.now_ms();
        let ctx = self.motion_context(host);
        if self.entered {
            self.strategy.relayout(now, &self.layout, &mut self.tracks, &ctx);
        } else {
            self.strategy.enter(now, &self.layout, &mut self.tracks, &ctx);
            self.entered = true;
        }
        self.ensure_frame(host);
    }

    fn ensure_frame(&mut self, host: &Host) {
        if self.frame.is_none() {
            self.frame = Some(host.request_frame());
        }
    }

    fn on_frame(&mut self, host: &Host, now: f64) {
        self.frame = None;
        if self.strategy.needs_frame() {
            let ctx = self.motion_context(host);
            self.strategy.frame(now, &self.layout, &mut self.tracks, &ctx);
        }
        let mut running = false;
        for track in self.tracks.values_mut() {
            running |= track.tick(now);
        }
        for hover in self.hover.values_mut() {
            running |= hover.scale.tick(now);
            running |= hover.overlay.tick(now);
        }
        if running || self.strategy.needs_frame() {
            self.frame = Some(host.request_frame());
        }
    }

    fn on_container_resize(&mut self, host: &Host) {
        let width = host.element(self.container).map(|b| b.width).unwrap_or(0.0);
        if width != self.container_width {
            self.container_width = width;
            self.recompute(host);
        }
    }
}

impl Component for Gallery {
    fn handle(&mut self, host: &Host, dispatch: &Dispatch) {
        if self.columns.handle(host, dispatch).is_some() {
            self.recompute(host);
            return;
        }
        if holds(&self.container_observer, dispatch) || holds(&self.window_resize, dispatch) {
            self.on_container_resize(host);
            return;
        }
        if holds(&self.preload_task, dispatch) {
            if let HostEvent::AssetsSettled { assets } = &dispatch.event {
                debug!(count = assets.len(), "Gallery assets settled");
                for asset in assets {
                    if let Some(size) = asset.size {
                        self.measured.insert(asset.media_ref.clone(), size);
                    }
                    if let Some(poster) = &asset.poster {
                        self.posters.insert(asset.media_ref.clone(), poster.clone());
                    }
                }
                self.preload_task = None;
                self.assets_ready = true;
                self.recompute(host);
            }
            return;
        }
        if holds(&self.frame, dispatch) {
            if let HostEvent::Frame { timestamp_ms } = dispatch.event {
                self.on_frame(host, timestamp_ms);
            }
            return;
        }
        self.modal.handle(host, dispatch);
    }
}
