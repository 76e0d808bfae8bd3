//! Entrance and relayout strategies for gallery items.
//!
//! Two interchangeable strategies drive the same per-item tracks:
//! - [`TweenEntrance`]: each item flies in from an off-screen origin with a
//!   staggered delay; relayouts tween geometry only.
//! - [`CssTransitionEntrance`]: items sit at their final slot, hidden and
//!   nudged down, until an "entered" flip one frame later starts a staggered
//!   transition for all of them at once.
//!
//! Neither strategy touches hover tracks, which the gallery keeps separately.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

use super::ease::Ease;
use super::tween::{Props, Track};
use crate::models::PositionedItem;

/// Distance past the viewport edge that tween entrances start from.
const OFFSCREEN_MARGIN: f32 = 200.0;

/// Downward offset used by the transition-class strategy before the flip.
const CSS_ENTRANCE_OFFSET: f32 = 24.0;

/// Initial blur radius when blur-to-focus is on.
const ENTRANCE_BLUR: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntranceDirection {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationStyle {
    #[default]
    Tween,
    CssTransition,
}

/// Timing and geometry shared by every strategy call of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionContext {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub container_width: f32,
    pub container_height: f32,
    pub stagger_ms: f64,
    pub entrance_duration_ms: f64,
    pub relayout_duration_ms: f64,
    pub entrance_ease: Ease,
    pub relayout_ease: Ease,
    pub blur_to_focus: bool,
}

pub type LayoutTracks = HashMap<String, Track<Props>>;

fn resting(p: &PositionedItem) -> Props {
    Props::at(p.x, p.y, p.width, p.height)
}

fn track_for<'a>(tracks: &'a mut LayoutTracks, p: &PositionedItem) -> &'a mut Track<Props> {
    tracks
        .entry(p.item.id.clone())
        .or_insert_with(|| Track::new(resting(p)))
}

pub trait EntranceStrategy: Send {
    /// First pass after assets settle.
    fn enter(&mut self, now_ms: f64, layout: &[PositionedItem], tracks: &mut LayoutTracks, ctx: &MotionContext);

    /// Later passes: geometry only, no delay, no fade.
    fn relayout(&mut self, now_ms: f64, layout: &[PositionedItem], tracks: &mut LayoutTracks, ctx: &MotionContext);

    /// Work deferred to the next animation frame.
    fn frame(&mut self, _now_ms: f64, _layout: &[PositionedItem], _tracks: &mut LayoutTracks, _ctx: &MotionContext) {}

    /// True while [`EntranceStrategy::frame`] still has work queued.
    fn needs_frame(&self) -> bool {
        false
    }
}

pub fn strategy_for(
    style: AnimationStyle,
    direction: EntranceDirection,
    seed: Option<u64>,
) -> Box<dyn EntranceStrategy> {
    match style {
        AnimationStyle::Tween => Box::new(TweenEntrance::new(direction, seed)),
        AnimationStyle::CssTransition => Box::new(CssTransitionEntrance::default()),
    }
}

pub struct TweenEntrance {
    direction: EntranceDirection,
    rng: StdRng,
}

impl TweenEntrance {
    pub fn new(direction: EntranceDirection, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { direction, rng }
    }

    fn resolve_direction(&mut self) -> EntranceDirection {
        match self.direction {
            EntranceDirection::Random => match self.rng.random_range(0..4) {
                0 => EntranceDirection::Top,
                1 => EntranceDirection::Bottom,
                2 => EntranceDirection::Left,
                _ => EntranceDirection::Right,
            },
            direction => direction,
        }
    }

    /// Where an item starts its entrance.
    pub fn origin(&mut self, p: &PositionedItem, ctx: &MotionContext) -> (f32, f32) {
        match self.resolve_direction() {
            EntranceDirection::Top => (p.x, -OFFSCREEN_MARGIN),
            EntranceDirection::Bottom => (p.x, ctx.viewport_height + OFFSCREEN_MARGIN),
            EntranceDirection::Left => (-OFFSCREEN_MARGIN, p.y),
            EntranceDirection::Right => (ctx.viewport_width + OFFSCREEN_MARGIN, p.y),
            EntranceDirection::Center => (
                ctx.container_width / 2.0 - p.width / 2.0,
                ctx.container_height / 2.0 - p.height / 2.0,
            ),
            EntranceDirection::Random => (p.x, p.y),
        }
    }
}

impl EntranceStrategy for TweenEntrance {
    fn enter(&mut self, now_ms: f64, layout: &[PositionedItem], tracks: &mut LayoutTracks, ctx: &MotionContext) {
        debug!(items = layout.len(), direction = ?self.direction, "Tween entrance");
        for (index, p) in layout.iter().enumerate() {
            let (x, y) = self.origin(p, ctx);
            let from = Props {
                x,
                y,
                width: p.width,
                height: p.height,
                opacity: 0.0,
                scale: 1.0,
                blur: if ctx.blur_to_focus { ENTRANCE_BLUR } else { 0.0 },
            };
            track_for(tracks, p).from_to(
                now_ms,
                from,
                resting(p),
                ctx.entrance_duration_ms,
                index as f64 * ctx.stagger_ms,
                ctx.entrance_ease,
            );
        }
    }

    fn relayout(&mut self, now_ms: f64, layout: &[PositionedItem], tracks: &mut LayoutTracks, ctx: &MotionContext) {
        for p in layout {
            let track = track_for(tracks, p);
            let target = track.target().with_geometry_of(resting(p));
            track.to(now_ms, target, ctx.relayout_duration_ms, 0.0, ctx.relayout_ease);
        }
    }
}

/// Transition-class strategy. `entered` flips once, on the frame after
/// [`EntranceStrategy::enter`].
#[derive(Debug, Default)]
pub struct CssTransitionEntrance {
    entered: bool,
    flip_pending: bool,
}

impl CssTransitionEntrance {
    pub fn entered(&self) -> bool {
        self.entered
    }

    fn hidden(p: &PositionedItem) -> Props {
        Props {
            y: p.y + CSS_ENTRANCE_OFFSET,
            opacity: 0.0,
            ..resting(p)
        }
    }
}

impl EntranceStrategy for CssTransitionEntrance {
    fn enter(&mut self, _now_ms: f64, layout: &[PositionedItem], tracks: &mut LayoutTracks, _ctx: &MotionContext) {
        for p in layout {
            track_for(tracks, p).set(Self::hidden(p));
        }
        self.entered = false;
        self.flip_pending = true;
    }

    fn relayout(&mut self, now_ms: f64, layout: &[PositionedItem], tracks: &mut LayoutTracks, ctx: &MotionContext) {
        for p in layout {
            let track = track_for(tracks, p);
            if self.flip_pending {
                track.set(Self::hidden(p));
                continue;
            }
            let target = track.target().with_geometry_of(resting(p));
            track.to(now_ms, target, ctx.relayout_duration_ms, 0.0, ctx.relayout_ease);
        }
    }

    fn frame(&mut self, now_ms: f64, layout: &[PositionedItem], tracks: &mut LayoutTracks, ctx: &MotionContext) {
        if !self.flip_pending {
            return;
        }
        self.flip_pending = false;
        self.entered = true;
        debug!(items = layout.len(), "Entered flip");
        for (index, p) in layout.iter().enumerate() {
            track_for(tracks, p).to(
                now_ms,
                resting(p),
                ctx.entrance_duration_ms,
                index as f64 * ctx.stagger_ms,
                ctx.entrance_ease,
            );
        }
    }

    fn needs_frame(&self) -> bool {
        self.flip_pending
    }
}
