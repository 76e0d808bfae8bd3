//! Snap-scrolling card rail that advances one step on a timer.

use tracing::{debug, trace};

use super::Component;
use crate::config::CarouselOptions;
use crate::host::{holds, Dispatch, ElementId, Handle, Host, HostEvent, Listen, ScrollBehavior};
use crate::models::CardItem;

/// Step used until the first card can be measured.
const DEFAULT_STEP_PX: f32 = 300.0;

/// Distance from the scroll maximum treated as "at the end".
const END_EPSILON_PX: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselState {
    pub item_count: usize,
    /// Derived from the scroll offset; best effort.
    pub current_index: usize,
    pub scroll_offset: f32,
    pub can_scroll_left: bool,
    pub can_scroll_right: bool,
    pub auto_play: bool,
}

pub struct Carousel {
    options: CarouselOptions,
    items: Vec<CardItem>,
    viewport_el: ElementId,
    first_card: Option<ElementId>,
    step: f32,
    state: CarouselState,
    resize_observers: Vec<Handle>,
    window_resize: Option<Handle>,
    scroll_listener: Option<Handle>,
    visibility: Option<Handle>,
    viewport_listener: Option<Handle>,
    timer: Option<Handle>,
    frame: Option<Handle>,
    pointer_down: bool,
    hovered: bool,
    tab_hidden: bool,
    reduced_motion: bool,
}

impl Carousel {
    /// Mount on a scroll viewport element, its rail and the first card
    /// wrapper (absent while the rail is empty).
    pub fn mount(
        host: &Host,
        viewport_el: ElementId,
        rail: ElementId,
        first_card: Option<ElementId>,
        items: Vec<CardItem>,
        options: CarouselOptions,
    ) -> Self {
        let resize_observers: Vec<Handle> = [viewport_el, rail]
            .into_iter()
            .filter_map(|el| host.observe_resize(el))
            .collect();
        let window_resize = if resize_observers.len() < 2 {
            Some(host.listen(Listen::WindowResize))
        } else {
            None
        };

        let mut carousel = Self {
            state: CarouselState {
                item_count: items.len(),
                current_index: 0,
                scroll_offset: 0.0,
                can_scroll_left: false,
                can_scroll_right: true,
                auto_play: options.auto_play,
            },
            options,
            items,
            viewport_el,
            first_card,
            step: DEFAULT_STEP_PX,
            resize_observers,
            window_resize,
            scroll_listener: Some(host.listen(Listen::Scroll(viewport_el))),
            visibility: Some(host.listen(Listen::VisibilityChange)),
            viewport_listener: Some(host.listen(Listen::ViewportChange)),
            timer: None,
            frame: None,
            pointer_down: false,
            hovered: false,
            tab_hidden: host.tab_hidden(),
            reduced_motion: host.prefers_reduced_motion(),
        };
        host.scroll_to(viewport_el, carousel.options.initial_scroll_px, ScrollBehavior::Instant);
        carousel.measure_step(host);
        carousel.update_arrows(host);
        carousel.schedule(host);
        carousel
    }

    pub fn state(&self) -> &CarouselState {
        &self.state
    }

    pub fn items(&self) -> &[CardItem] {
        &self.items
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Paused for a reason other than reduced motion.
    pub fn is_paused(&self) -> bool {
        self.pointer_down || (self.options.pause_on_hover && self.hovered) || self.tab_hidden
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer.is_some()
    }

    pub fn next(&mut self, host: &Host) {
        host.scroll_by(self.viewport_el, self.step, scroll_behavior(host));
        self.schedule(host);
    }

    pub fn prev(&mut self, host: &Host) {
        host.scroll_by(self.viewport_el, -self.step, scroll_behavior(host));
        self.schedule(host);
    }

    pub fn set_pointer_down(&mut self, host: &Host, down: bool) {
        self.pointer_down = down;
        self.schedule(host);
    }

    pub fn set_hovered(&mut self, host: &Host, hovered: bool) {
        self.hovered = hovered;
        self.schedule(host);
    }

    /// A card's expanded view closed: bring the following card into view.
    pub fn on_card_close(&mut self, host: &Host, index: usize) {
        let left = self.step * (index as f32 + 1.0);
        host.scroll_to(self.viewport_el, left, scroll_behavior(host));
        self.state.current_index = index;
    }

    /// Swap the card list; the step is re-measured.
    pub fn set_items(&mut self, host: &Host, items: Vec<CardItem>, first_card: Option<ElementId>) {
        self.state.item_count = items.len();
        self.items = items;
        self.first_card = first_card;
        self.measure_step(host);
        self.update_arrows(host);
    }

    fn measure_step(&mut self, host: &Host) {
        let Some(card) = self.first_card.and_then(|id| host.element(id)) else {
            return;
        };
        let step = (card.width + card.margin_right).round();
        if step > 0.0 && step != self.step {
            trace!(step, "Carousel step measured");
            self.step = step;
        }
    }

    /// Refresh the derived state on the next frame; bursts of scroll events
    /// share one pending frame.
    fn update_arrows(&mut self, host: &Host) {
        if self.frame.is_none() {
            self.frame = Some(host.request_frame());
        }
    }

    fn apply_arrows(&mut self, host: &Host) {
        let Some(el) = host.element(self.viewport_el) else {
            return;
        };
        let step = if self.step > 0.0 { self.step } else { 1.0 };
        self.state.scroll_offset = el.scroll_left;
        self.state.can_scroll_left = el.scroll_left > 0.0;
        self.state.can_scroll_right = el.scroll_left < el.scroll_width - el.width - 1.0;
        self.state.current_index = (el.scroll_left / step).round() as usize;
    }

    /// (Re)arm the autoplay timer when nothing holds it back.
    fn schedule(&mut self, host: &Host) {
        self.timer = None;
        if !self.options.auto_play || self.is_paused() || self.reduced_motion {
            return;
        }
        self.timer = Some(host.set_timeout(self.options.effective_interval_ms() as f64));
    }

    fn play_next(&mut self, host: &Host) {
        let Some(el) = host.element(self.viewport_el) else {
            return;
        };
        let behavior = scroll_behavior(host);
        if el.scroll_left >= el.max_scroll() - END_EPSILON_PX {
            debug!("Carousel wrapped to start");
            host.scroll_to(self.viewport_el, 0.0, behavior);
        } else {
            host.scroll_by(self.viewport_el, self.step, behavior);
        }
    }
}

fn scroll_behavior(host: &Host) -> ScrollBehavior {
    if host.prefers_reduced_motion() {
        ScrollBehavior::Instant
    } else {
        ScrollBehavior::Smooth
    }
}

impl Component for Carousel {
    fn handle(&mut self, host: &Host, dispatch: &Dispatch) {
        if holds(&self.timer, dispatch) {
            self.timer = None;
            self.play_next(host);
            self.schedule(host);
            return;
        }
        if holds(&self.frame, dispatch) {
            self.frame = None;
            self.apply_arrows(host);
            return;
        }
        if holds(&self.scroll_listener, dispatch) {
            self.update_arrows(host);
            return;
        }
        if self.resize_observers.iter().any(|h| h.owns(dispatch))
            || holds(&self.window_resize, dispatch)
        {
            self.measure_step(host);
            self.update_arrows(host);
            return;
        }
        match dispatch.event {
            HostEvent::VisibilityChanged { hidden } if holds(&self.visibility, dispatch) => {
                self.tab_hidden = hidden;
                self.schedule(host);
            }
            // Size changes only re-measure; the countdown survives them.
            HostEvent::ViewportChanged if holds(&self.viewport_listener, dispatch) => {
                let reduced = host.prefers_reduced_motion();
                if reduced != self.reduced_motion {
                    self.reduced_motion = reduced;
                    self.schedule(host);
                }
            }
            _ => {}
        }
    }
}
