//! Looping logo track.
//!
//! Every frame the velocity eases toward its target with a 0.25 s time
//! constant and the offset integrates it, wrapped into
//! `[0, sequence_width)`. The track repeats the item list `copy_count` times
//! so one full sequence of headroom always sits past the container edge.

use std::sync::Arc;

use tracing::{debug, trace};

use super::Component;
use crate::config::MarqueeOptions;
use crate::host::{holds, Dispatch, ElementId, Handle, Host, HostEvent, Listen};
use crate::models::{LogoItem, MediaKind};
use crate::preload::{AssetPreloader, AssetRequest};

/// Smoothing time constant, in seconds.
const SMOOTH_TAU: f32 = 0.25;
const MIN_COPIES: usize = 2;
const COPY_HEADROOM: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarqueeState {
    pub sequence_width: f32,
    pub copy_count: usize,
    pub offset: f32,
    pub velocity: f32,
    pub hovered: bool,
}

impl Default for MarqueeState {
    fn default() -> Self {
        Self {
            sequence_width: 0.0,
            copy_count: MIN_COPIES,
            offset: 0.0,
            velocity: 0.0,
            hovered: false,
        }
    }
}

impl MarqueeState {
    /// Recompute the sequence width and copy count, re-normalising the offset.
    pub fn measure(&mut self, container_width: f32, sequence_width: f32) {
        let sequence_width = sequence_width.ceil();
        if sequence_width <= 0.0 {
            return;
        }
        self.sequence_width = sequence_width;
        let needed = (container_width.max(0.0) / sequence_width).ceil() as usize + COPY_HEADROOM;
        self.copy_count = needed.max(MIN_COPIES);
        self.offset = wrap(self.offset, sequence_width);
    }

    /// One integration step of `dt` seconds toward `target` px/s.
    pub fn step(&mut self, dt: f32, target: f32) {
        let easing = 1.0 - (-dt / SMOOTH_TAU).exp();
        self.velocity += (target - self.velocity) * easing;
        if self.sequence_width > 0.0 {
            self.offset = wrap(self.offset + self.velocity * dt, self.sequence_width);
        }
    }
}

fn wrap(offset: f32, width: f32) -> f32 {
    let wrapped = offset.rem_euclid(width);
    // rem_euclid can round up to `width` for tiny negative inputs.
    if wrapped >= width {
        0.0
    } else {
        wrapped
    }
}

/// Rendered width of one pass of `items` at `item_height`, each followed by
/// one gap.
pub fn estimate_sequence_width(items: &[LogoItem], item_height: f32, gap: f32) -> f32 {
    items
        .iter()
        .map(|item| (item_height * item.aspect_ratio()).ceil() + gap)
        .sum()
}

/// Render output for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MarqueeFrame {
    pub translate_x: f32,
    pub copy_count: usize,
    pub item_height: f32,
    pub gap: f32,
    pub fade_edges: bool,
    pub scale_on_hover: bool,
}

pub struct Marquee {
    options: MarqueeOptions,
    items: Vec<LogoItem>,
    container: ElementId,
    sequence: ElementId,
    state: MarqueeState,
    resize_observers: Vec<Handle>,
    window_resize: Option<Handle>,
    visibility: Option<Handle>,
    intersection: Option<Handle>,
    viewport_listener: Option<Handle>,
    preloader: Arc<AssetPreloader>,
    preload_task: Option<Handle>,
    frame: Option<Handle>,
    last_timestamp: Option<f64>,
    in_view: bool,
    tab_visible: bool,
    reduced_motion: bool,
}

impl Marquee {
    /// Mount on a `container` element whose first child sequence is
    /// `sequence`.
    pub fn mount(
        host: &Host,
        container: ElementId,
        sequence: ElementId,
        items: Vec<LogoItem>,
        options: MarqueeOptions,
        preloader: Arc<AssetPreloader>,
    ) -> Self {
        let observers: Vec<Handle> = [container, sequence]
            .into_iter()
            .filter_map(|el| host.observe_resize(el))
            .collect();
        let window_resize = if observers.len() < 2 {
            debug!("Resize observation unavailable, falling back to window resize");
            Some(host.listen(Listen::WindowResize))
        } else {
            None
        };

        let (visibility, intersection) = if options.suspend_when_hidden {
            (
                Some(host.listen(Listen::VisibilityChange)),
                host.observe_intersection(container),
            )
        } else {
            (None, None)
        };

        let mut marquee = Self {
            options,
            items,
            container,
            sequence,
            state: MarqueeState::default(),
            resize_observers: observers,
            window_resize,
            visibility,
            intersection,
            viewport_listener: Some(host.listen(Listen::ViewportChange)),
            preloader,
            preload_task: None,
            frame: None,
            last_timestamp: None,
            in_view: true,
            tab_visible: !host.tab_hidden(),
            reduced_motion: host.prefers_reduced_motion(),
        };
        marquee.start_preload(host);
        marquee.update_dimensions(host);
        marquee.sync_loop(host);
        marquee
    }

    pub fn state(&self) -> &MarqueeState {
        &self.state
    }

    pub fn items(&self) -> &[LogoItem] {
        &self.items
    }

    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    pub fn render(&self) -> MarqueeFrame {
        MarqueeFrame {
            translate_x: -self.state.offset,
            copy_count: self.state.copy_count,
            item_height: self.options.item_height_px,
            gap: self.options.gap_px,
            fade_edges: self.options.fade_edges,
            scale_on_hover: self.options.scale_on_hover,
        }
    }

    /// Pointer entered or left the track. Ignored unless hover pauses.
    pub fn set_hovered(&mut self, hovered: bool) {
        if self.options.pause_on_hover {
            self.state.hovered = hovered;
        }
    }

    /// Replace the logos; the offset is kept and re-normalised.
    pub fn set_items(&mut self, host: &Host, items: Vec<LogoItem>) {
        if items == self.items {
            return;
        }
        self.items = items;
        self.start_preload(host);
        self.update_dimensions(host);
    }

    fn start_preload(&mut self, host: &Host) {
        let assets = self
            .items
            .iter()
            .map(|item| {
                let kind = MediaKind::from_media_ref(&item.media_ref).unwrap_or(MediaKind::Image);
                AssetRequest::new(item.media_ref.clone(), kind)
            })
            .collect();
        self.preload_task = Some(self.preloader.preload(host, assets));
    }

    fn target_velocity(&self) -> f32 {
        if self.options.pause_on_hover && self.state.hovered {
            0.0
        } else {
            self.options.target_velocity()
        }
    }

    fn update_dimensions(&mut self, host: &Host) {
        let (Some(container), Some(sequence)) =
            (host.element(self.container), host.element(self.sequence))
        else {
            return;
        };
        self.state.measure(container.width, sequence.width);
        trace!(
            sequence_width = self.state.sequence_width,
            copies = self.state.copy_count,
            "Marquee measured"
        );
    }

    fn should_run(&self) -> bool {
        if self.reduced_motion {
            return false;
        }
        !self.options.suspend_when_hidden || (self.in_view && self.tab_visible)
    }

    /// Start or stop the frame loop to match the current conditions. A
    /// resumed loop starts with `dt = 0`.
    fn sync_loop(&mut self, host: &Host) {
        let run = self.should_run();
        if run && self.frame.is_none() {
            debug!("Marquee loop started");
            self.last_timestamp = None;
            self.frame = Some(host.request_frame());
        } else if !run && self.frame.is_some() {
            debug!("Marquee loop suspended");
            self.frame = None;
            self.last_timestamp = None;
        }
    }

    fn on_frame(&mut self, host: &Host, timestamp_ms: f64) {
        self.frame = None;
        let last = self.last_timestamp.unwrap_or(timestamp_ms);
        let dt = ((timestamp_ms - last).max(0.0) / 1000.0) as f32;
        self.last_timestamp = Some(timestamp_ms);
        let target = self.target_velocity();
        self.state.step(dt, target);
        self.frame = Some(host.request_frame());
    }
}

impl Component for Marquee {
    fn handle(&mut self, host: &Host, dispatch: &Dispatch) {
        if holds(&self.frame, dispatch) {
            if let HostEvent::Frame { timestamp_ms } = dispatch.event {
                self.on_frame(host, timestamp_ms);
            }
            return;
        }
        if self.resize_observers.iter().any(|h| h.owns(dispatch))
            || holds(&self.window_resize, dispatch)
        {
            self.update_dimensions(host);
            return;
        }
        if holds(&self.preload_task, dispatch) {
            self.preload_task = None;
            self.update_dimensions(host);
            return;
        }
        match &dispatch.event {
            HostEvent::VisibilityChanged { hidden } if holds(&self.visibility, dispatch) => {
                self.tab_visible = !hidden;
                self.sync_loop(host);
            }
            HostEvent::Intersection { intersecting, .. } if holds(&self.intersection, dispatch) => {
                self.in_view = *intersecting;
                self.sync_loop(host);
            }
            HostEvent::ViewportChanged if holds(&self.viewport_listener, dispatch) => {
                self.reduced_motion = host.prefers_reduced_motion();
                self.sync_loop(host);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Capabilities, ElementBox, Viewport};

    fn mount_with(host: &Host, container_w: f32, seq_w: f32, options: MarqueeOptions) -> Marquee {
        let container = host.mount_element(ElementBox::sized(container_w, 28.0));
        let sequence = host.mount_element(ElementBox::sized(seq_w, 28.0));
        Marquee::mount(
            host,
            container,
            sequence,
            vec![LogoItem::new("https://cdn.example.com/logo.svg")],
            options,
            Arc::new(AssetPreloader::new(1)),
        )
    }

    fn mount(host: &Host, container_w: f32, seq_w: f32) -> Marquee {
        mount_with(host, container_w, seq_w, MarqueeOptions::default())
    }

    fn frames(host: &Host, marquee: &mut Marquee, n: usize, ms: f64) {
        for _ in 0..n {
            for dispatch in host.advance(ms) {
                marquee.handle(host, &dispatch);
            }
        }
    }

    #[test]
    fn test_copy_count_scenario() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let marquee = mount(&host, 1600.0, 1000.0);
        let state = marquee.state();
        assert_eq!(state.sequence_width, 1000.0);
        assert_eq!(state.copy_count, 4);
        assert!(state.copy_count as f32 * state.sequence_width >= 1600.0 + 1000.0);
    }

    #[test]
    fn test_copy_count_minimum() {
        let mut state = MarqueeState::default();
        state.measure(0.0, 500.0);
        assert_eq!(state.copy_count, MIN_COPIES);
        state.measure(100.0, 0.0);
        assert_eq!(state.sequence_width, 500.0);
    }

    #[test]
    fn test_offset_invariant() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let mut marquee = mount(&host, 1600.0, 333.0);
        for i in 0..600 {
            frames(&host, &mut marquee, 1, if i % 7 == 0 { 250.0 } else { 16.0 });
            let s = marquee.state();
            assert!(s.offset >= 0.0 && s.offset < s.sequence_width, "offset {}", s.offset);
            assert!(s.copy_count as f32 * s.sequence_width >= 1600.0 + s.sequence_width);
        }
        assert!(marquee.state().velocity > 100.0);
    }

    #[test]
    fn test_reverse_direction_wraps() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let options = MarqueeOptions {
            speed: -200.0,
            ..MarqueeOptions::default()
        };
        let mut marquee = mount_with(&host, 800.0, 300.0, options);
        frames(&host, &mut marquee, 200, 16.0);
        let s = marquee.state();
        assert!(s.velocity < 0.0);
        assert!(s.offset >= 0.0 && s.offset < 300.0);
    }

    #[test]
    fn test_reduced_motion_is_static() {
        let host = Host::new(Viewport::new(1600.0, 900.0).with_reduced_motion(true));
        let mut marquee = mount(&host, 1600.0, 1000.0);
        assert!(!marquee.is_running());
        let before = marquee.render();
        frames(&host, &mut marquee, 120, 16.0);
        assert_eq!(marquee.render(), before);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_hover_eases_to_stop() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let mut marquee = mount(&host, 1600.0, 1000.0);
        frames(&host, &mut marquee, 120, 16.0);
        let cruising = marquee.state().velocity;
        marquee.set_hovered(true);
        frames(&host, &mut marquee, 1, 16.0);
        let after_one = marquee.state().velocity;
        assert!(after_one < cruising && after_one > 0.0);
        frames(&host, &mut marquee, 200, 16.0);
        assert!(marquee.state().velocity.abs() < 0.01);
    }

    #[test]
    fn test_suspend_and_resume_without_jump() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let mut marquee = mount(&host, 1600.0, 1000.0);
        frames(&host, &mut marquee, 60, 16.0);

        host.set_tab_hidden(true);
        frames(&host, &mut marquee, 1, 16.0);
        assert!(!marquee.is_running());
        assert_eq!(host.pending_frames(), 0);
        let parked = marquee.state().offset;

        frames(&host, &mut marquee, 1, 10_000.0);
        host.set_tab_hidden(false);
        frames(&host, &mut marquee, 1, 16.0);
        assert!(marquee.is_running());
        // First resumed frame has dt = 0.
        frames(&host, &mut marquee, 1, 16.0);
        assert_eq!(marquee.state().offset, parked);
        frames(&host, &mut marquee, 1, 16.0);
        assert_ne!(marquee.state().offset, parked);
    }

    #[test]
    fn test_offscreen_suspends() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let mut marquee = mount(&host, 1600.0, 1000.0);
        host.set_intersecting(marquee.container, false);
        frames(&host, &mut marquee, 1, 16.0);
        assert!(!marquee.is_running());
        host.set_intersecting(marquee.container, true);
        frames(&host, &mut marquee, 1, 16.0);
        assert!(marquee.is_running());
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn test_resize_renormalises_offset() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let mut marquee = mount(&host, 1600.0, 1000.0);
        frames(&host, &mut marquee, 300, 16.0);
        let offset = marquee.state().offset;
        assert!(offset > 0.0);

        host.resize_element(marquee.sequence, 400.0, 28.0);
        frames(&host, &mut marquee, 1, 0.0);
        let s = marquee.state();
        assert_eq!(s.sequence_width, 400.0);
        assert_eq!(s.copy_count, 6);
        assert!(s.offset < 400.0);
        assert!((s.offset - offset.rem_euclid(400.0)).abs() < 1e-3);
    }

    #[test]
    fn test_asset_batch_remeasures() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        image::RgbaImage::new(120, 40).save(&logo).unwrap();

        // Without resize observation only the asset batch can trigger a
        // re-measure of the sequence.
        let host = Host::with_capabilities(
            Viewport::new(1600.0, 900.0),
            Capabilities {
                resize_observer: false,
                intersection_observer: true,
            },
        );
        let container = host.mount_element(ElementBox::sized(1600.0, 28.0));
        let sequence = host.mount_element(ElementBox::sized(1000.0, 28.0));
        let mut marquee = Marquee::mount(
            &host,
            container,
            sequence,
            vec![LogoItem::new(logo.to_string_lossy())],
            MarqueeOptions::default(),
            Arc::new(AssetPreloader::new(1)),
        );

        // Frames run normally; the settled batch is held back.
        fn route(host: &Host, marquee: &mut Marquee, batch: Vec<Dispatch>, held: &mut Vec<Dispatch>) {
            for dispatch in batch {
                if holds(&marquee.preload_task, &dispatch) {
                    held.push(dispatch);
                } else {
                    marquee.handle(host, &dispatch);
                }
            }
        }
        let mut settled = Vec::new();
        for _ in 0..300 {
            route(&host, &mut marquee, host.advance(16.0), &mut settled);
        }
        for _ in 0..500 {
            if !settled.is_empty() {
                break;
            }
            route(&host, &mut marquee, host.drain(), &mut settled);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert_eq!(settled.len(), 1);
        assert!(matches!(settled[0].event, HostEvent::AssetsSettled { .. }));

        let offset = marquee.state().offset;
        assert!(offset > 0.0);
        host.update_element(sequence, |b| b.width = 400.0);
        assert_eq!(marquee.state().sequence_width, 1000.0);

        marquee.handle(&host, &settled[0]);
        let s = marquee.state();
        assert_eq!(s.sequence_width, 400.0);
        assert_eq!(s.copy_count, 6);
        assert!((s.offset - offset.rem_euclid(400.0)).abs() < 1e-3);
        assert!(marquee.preload_task.is_none());
    }

    #[test]
    fn test_window_resize_fallback() {
        let host = Host::with_capabilities(
            Viewport::new(1600.0, 900.0),
            Capabilities {
                resize_observer: false,
                intersection_observer: false,
            },
        );
        let mut marquee = mount(&host, 1600.0, 1000.0);
        assert_eq!(host.listener_count(Listen::WindowResize), 1);
        host.resize_element(marquee.container, 2600.0, 28.0);
        host.set_viewport_size(2600.0, 900.0);
        frames(&host, &mut marquee, 1, 16.0);
        assert_eq!(marquee.state().copy_count, 5);
        assert!(marquee.is_running());
    }

    #[test]
    fn test_never_two_frames() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let mut marquee = mount(&host, 1600.0, 1000.0);
        for hidden in [true, false, false, true, false] {
            host.set_tab_hidden(hidden);
            frames(&host, &mut marquee, 1, 16.0);
            assert!(host.pending_frames() <= 1);
        }
    }

    #[test]
    fn test_estimate_sequence_width() {
        let items = vec![
            LogoItem::new("/a.svg").with_size(200.0, 100.0),
            LogoItem::new("/b.svg"),
        ];
        assert_eq!(estimate_sequence_width(&items, 28.0, 32.0), 56.0 + 32.0 + 28.0 + 32.0);
    }

    #[test]
    fn test_drop_releases() {
        let host = Host::new(Viewport::new(1600.0, 900.0));
        let marquee = mount(&host, 1600.0, 1000.0);
        assert!(host.observer_count() > 0);
        drop(marquee);
        assert_eq!(host.registration_count(), 0);
    }
}
