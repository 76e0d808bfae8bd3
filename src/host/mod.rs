//! Injected stand-in for the browser environment.
//!
//! The host owns the clock, frame requests, timers, global listeners,
//! resize/intersection observers, element metrics, the document scroll lock
//! and the overlay layer. Components acquire registrations as owned
//! [`Handle`]s and react to the [`Dispatch`]es produced by [`Host::advance`]
//! and [`Host::drain`]. Everything runs on one thread; the only cross-thread
//! entry point is the inbox used by [`HostSender`].

pub mod element;
pub mod handles;
pub mod viewport;

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

pub use element::{ElementBox, ElementId, ScrollBehavior};
pub use handles::{holds, Handle, OverlaySurface, ScrollLock};
pub use viewport::{MediaQuery, Viewport};

use crate::preload::SettledAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

/// Global or element-scoped event sources a component can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listen {
    KeyDown,
    VisibilityChange,
    WindowResize,
    ViewportChange,
    Scroll(ElementId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Enter,
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Frame { timestamp_ms: f64 },
    Timer,
    Key(Key),
    VisibilityChanged { hidden: bool },
    WindowResized,
    ViewportChanged,
    Scrolled { element: ElementId },
    Resized { element: ElementId },
    Intersection { element: ElementId, intersecting: bool },
    AssetsSettled { assets: Vec<SettledAsset> },
}

/// An event addressed to the registration identified by `token`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub token: Token,
    pub event: HostEvent,
}

/// Optional platform primitives. Missing ones make the matching `observe_*`
/// call return `None` so callers can fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub resize_observer: bool,
    pub intersection_observer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            resize_observer: true,
            intersection_observer: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Registration {
    Frame,
    Timer { deadline_ms: f64 },
    Listener(Listen),
    ResizeObserver(ElementId),
    IntersectionObserver(ElementId),
    Task,
}

pub(crate) struct HostState {
    now_ms: f64,
    next_id: u64,
    registrations: BTreeMap<Token, Registration>,
    queue: VecDeque<Dispatch>,
    elements: HashMap<ElementId, ElementBox>,
    viewport: Viewport,
    capabilities: Capabilities,
    document_ready: bool,
    pub(crate) document_overflow: String,
    pub(crate) scroll_locks: usize,
    pub(crate) overlays: BTreeSet<u64>,
    last_scroll_behavior: Option<ScrollBehavior>,
}

impl HostState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn release(&mut self, token: Token) {
        if self.registrations.remove(&token).is_some() {
            trace!(?token, "Released registration");
        }
        self.queue.retain(|d| d.token != token);
    }

    fn notify(&mut self, filter: impl Fn(&Registration) -> bool, event: HostEvent) {
        let targets: Vec<Token> = self
            .registrations
            .iter()
            .filter(|(_, reg)| filter(reg))
            .map(|(token, _)| *token)
            .collect();
        for token in targets {
            self.queue.push_back(Dispatch {
                token,
                event: event.clone(),
            });
        }
    }

    fn notify_listeners(&mut self, what: Listen, event: HostEvent) {
        self.notify(|reg| *reg == Registration::Listener(what), event);
    }

    fn count(&self, filter: impl Fn(&Registration) -> bool) -> usize {
        self.registrations.values().filter(|reg| filter(reg)).count()
    }
}

/// Posts completions from worker threads into the host inbox.
#[derive(Clone)]
pub struct HostSender {
    tx: flume::Sender<Dispatch>,
}

impl HostSender {
    /// Returns false when the host is gone.
    pub fn post(&self, token: Token, event: HostEvent) -> bool {
        self.tx.send(Dispatch { token, event }).is_ok()
    }
}

#[derive(Clone)]
pub struct Host {
    state: Arc<Mutex<HostState>>,
    inbox_tx: flume::Sender<Dispatch>,
    inbox_rx: flume::Receiver<Dispatch>,
}

impl Host {
    /// Interactive host with a ready document.
    pub fn new(viewport: Viewport) -> Self {
        Self::with_capabilities(viewport, Capabilities::default())
    }

    /// Host for non-interactive evaluation: media conditions cannot be
    /// evaluated and the document is not available.
    pub fn headless() -> Self {
        let host = Self::with_capabilities(Viewport::headless(), Capabilities::default());
        host.state.lock().document_ready = false;
        host
    }

    pub fn with_capabilities(viewport: Viewport, capabilities: Capabilities) -> Self {
        let (inbox_tx, inbox_rx) = flume::unbounded();
        let state = HostState {
            now_ms: 0.0,
            next_id: 0,
            registrations: BTreeMap::new(),
            queue: VecDeque::new(),
            elements: HashMap::new(),
            viewport,
            capabilities,
            document_ready: true,
            document_overflow: String::new(),
            scroll_locks: 0,
            overlays: BTreeSet::new(),
            last_scroll_behavior: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            inbox_tx,
            inbox_rx,
        }
    }

    fn register(&self, registration: Registration) -> Handle {
        let mut state = self.state.lock();
        let token = Token(state.next_id());
        state.registrations.insert(token, registration);
        Handle::new(token, Arc::downgrade(&self.state))
    }

    // ---- registrations ----

    /// One-shot animation frame request.
    pub fn request_frame(&self) -> Handle {
        self.register(Registration::Frame)
    }

    /// One-shot timer firing `delay_ms` from now.
    pub fn set_timeout(&self, delay_ms: f64) -> Handle {
        let deadline_ms = self.now_ms() + delay_ms.max(0.0);
        self.register(Registration::Timer { deadline_ms })
    }

    pub fn listen(&self, what: Listen) -> Handle {
        self.register(Registration::Listener(what))
    }

    pub fn observe_resize(&self, element: ElementId) -> Option<Handle> {
        if !self.capabilities().resize_observer {
            return None;
        }
        Some(self.register(Registration::ResizeObserver(element)))
    }

    pub fn observe_intersection(&self, element: ElementId) -> Option<Handle> {
        if !self.capabilities().intersection_observer {
            return None;
        }
        Some(self.register(Registration::IntersectionObserver(element)))
    }

    /// Token for completions posted from other threads through [`HostSender`].
    pub fn task(&self) -> Handle {
        self.register(Registration::Task)
    }

    pub fn sender(&self) -> HostSender {
        HostSender {
            tx: self.inbox_tx.clone(),
        }
    }

    pub fn lock_scroll(&self) -> ScrollLock {
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut state.document_overflow, "hidden".to_string());
        state.scroll_locks += 1;
        ScrollLock::new(previous, Arc::downgrade(&self.state))
    }

    /// Mount a node in the top-level overlay layer. `None` until the
    /// document is available.
    pub fn overlay(&self) -> Option<OverlaySurface> {
        let mut state = self.state.lock();
        if !state.document_ready {
            return None;
        }
        let layer = state.next_id();
        state.overlays.insert(layer);
        Some(OverlaySurface::new(layer, Arc::downgrade(&self.state)))
    }

    // ---- ambient reads ----

    pub fn now_ms(&self) -> f64 {
        self.state.lock().now_ms
    }

    pub fn viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    pub fn capabilities(&self) -> Capabilities {
        self.state.lock().capabilities
    }

    pub fn prefers_reduced_motion(&self) -> bool {
        self.state.lock().viewport.reduced_motion
    }

    pub fn tab_hidden(&self) -> bool {
        self.state.lock().viewport.tab_hidden
    }

    pub fn document_ready(&self) -> bool {
        self.state.lock().document_ready
    }

    // ---- elements ----

    pub fn mount_element(&self, metrics: ElementBox) -> ElementId {
        let mut state = self.state.lock();
        let id = ElementId(state.next_id());
        state.elements.insert(id, metrics);
        id
    }

    pub fn element(&self, id: ElementId) -> Option<ElementBox> {
        self.state.lock().elements.get(&id).copied()
    }

    pub fn remove_element(&self, id: ElementId) {
        self.state.lock().elements.remove(&id);
    }

    /// Apply new metrics; resize observers of the element are notified when
    /// its box changed.
    pub fn update_element(&self, id: ElementId, update: impl FnOnce(&mut ElementBox)) {
        let mut state = self.state.lock();
        let Some(metrics) = state.elements.get_mut(&id) else {
            return;
        };
        let before = *metrics;
        update(metrics);
        let after = *metrics;
        let resized = before.width != after.width
            || before.height != after.height
            || before.margin_right != after.margin_right
            || before.scroll_width != after.scroll_width;
        if resized {
            state.notify(
                |reg| *reg == Registration::ResizeObserver(id),
                HostEvent::Resized { element: id },
            );
        }
    }

    pub fn resize_element(&self, id: ElementId, width: f32, height: f32) {
        self.update_element(id, |b| {
            b.width = width;
            b.height = height;
        });
    }

    /// Scroll an element, clamping into its scrollable range. Returns the
    /// resulting offset.
    pub fn scroll_to(&self, id: ElementId, left: f32, behavior: ScrollBehavior) -> f32 {
        let mut state = self.state.lock();
        let Some(metrics) = state.elements.get_mut(&id) else {
            return 0.0;
        };
        let target = left.clamp(0.0, metrics.max_scroll());
        let changed = metrics.scroll_left != target;
        metrics.scroll_left = target;
        state.last_scroll_behavior = Some(behavior);
        if changed {
            state.notify_listeners(Listen::Scroll(id), HostEvent::Scrolled { element: id });
        }
        target
    }

    pub fn scroll_by(&self, id: ElementId, delta: f32, behavior: ScrollBehavior) -> f32 {
        let current = self.element(id).map(|b| b.scroll_left).unwrap_or(0.0);
        self.scroll_to(id, current + delta, behavior)
    }

    pub fn last_scroll_behavior(&self) -> Option<ScrollBehavior> {
        self.state.lock().last_scroll_behavior
    }

    // ---- environment drivers ----

    pub fn set_viewport_size(&self, width: f32, height: f32) {
        let mut state = self.state.lock();
        if state.viewport.width == width && state.viewport.height == height {
            return;
        }
        state.viewport.width = width;
        state.viewport.height = height;
        state.notify_listeners(Listen::ViewportChange, HostEvent::ViewportChanged);
        state.notify_listeners(Listen::WindowResize, HostEvent::WindowResized);
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        let mut state = self.state.lock();
        if state.viewport.reduced_motion == reduced {
            return;
        }
        state.viewport.reduced_motion = reduced;
        state.notify_listeners(Listen::ViewportChange, HostEvent::ViewportChanged);
    }

    pub fn set_interactive(&self, interactive: bool) {
        let mut state = self.state.lock();
        if state.viewport.interactive == interactive {
            return;
        }
        state.viewport.interactive = interactive;
        state.notify_listeners(Listen::ViewportChange, HostEvent::ViewportChanged);
    }

    pub fn set_tab_hidden(&self, hidden: bool) {
        let mut state = self.state.lock();
        if state.viewport.tab_hidden == hidden {
            return;
        }
        state.viewport.tab_hidden = hidden;
        state.notify_listeners(
            Listen::VisibilityChange,
            HostEvent::VisibilityChanged { hidden },
        );
    }

    pub fn set_intersecting(&self, element: ElementId, intersecting: bool) {
        self.state.lock().notify(
            |reg| *reg == Registration::IntersectionObserver(element),
            HostEvent::Intersection {
                element,
                intersecting,
            },
        );
    }

    pub fn mark_document_ready(&self) {
        self.state.lock().document_ready = true;
    }

    pub fn press_key(&self, key: Key) {
        self.state
            .lock()
            .notify_listeners(Listen::KeyDown, HostEvent::Key(key));
    }

    // ---- driving ----

    /// Queued events plus inbox completions, without moving the clock.
    pub fn drain(&self) -> Vec<Dispatch> {
        let mut state = self.state.lock();
        let mut out: Vec<Dispatch> = state.queue.drain(..).collect();
        while let Ok(dispatch) = self.inbox_rx.try_recv() {
            if state.registrations.contains_key(&dispatch.token) {
                out.push(dispatch);
            } else {
                trace!(token = ?dispatch.token, "Dropped completion for released task");
            }
        }
        out
    }

    /// Move the clock by `ms`, then yield pending events, due timers and one
    /// frame callback per outstanding frame request.
    pub fn advance(&self, ms: f64) -> Vec<Dispatch> {
        {
            let mut state = self.state.lock();
            state.now_ms += ms.max(0.0);
        }
        let mut out = self.drain();

        let mut state = self.state.lock();
        let now = state.now_ms;

        let mut due: Vec<(f64, Token)> = state
            .registrations
            .iter()
            .filter_map(|(token, reg)| match reg {
                Registration::Timer { deadline_ms } if *deadline_ms <= now => {
                    Some((*deadline_ms, *token))
                }
                _ => None,
            })
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, token) in due {
            state.registrations.remove(&token);
            out.push(Dispatch {
                token,
                event: HostEvent::Timer,
            });
        }

        let frames: Vec<Token> = state
            .registrations
            .iter()
            .filter(|(_, reg)| **reg == Registration::Frame)
            .map(|(token, _)| *token)
            .collect();
        for token in frames {
            state.registrations.remove(&token);
            out.push(Dispatch {
                token,
                event: HostEvent::Frame { timestamp_ms: now },
            });
        }
        out
    }

    // ---- introspection ----

    pub fn pending_frames(&self) -> usize {
        self.state.lock().count(|reg| *reg == Registration::Frame)
    }

    pub fn pending_timers(&self) -> usize {
        self.state
            .lock()
            .count(|reg| matches!(reg, Registration::Timer { .. }))
    }

    pub fn listener_count(&self, what: Listen) -> usize {
        self.state
            .lock()
            .count(|reg| *reg == Registration::Listener(what))
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().count(|reg| {
            matches!(
                reg,
                Registration::ResizeObserver(_) | Registration::IntersectionObserver(_)
            )
        })
    }

    pub fn registration_count(&self) -> usize {
        self.state.lock().registrations.len()
    }

    pub fn document_overflow(&self) -> String {
        self.state.lock().document_overflow.clone()
    }

    pub fn scroll_locked(&self) -> bool {
        self.state.lock().scroll_locks > 0
    }

    pub fn overlay_count(&self) -> usize {
        self.state.lock().overlays.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_is_one_shot() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        let frame = host.request_frame();
        let fired = host.advance(16.0);
        assert_eq!(fired.len(), 1);
        assert!(frame.owns(&fired[0]));
        assert_eq!(fired[0].event, HostEvent::Frame { timestamp_ms: 16.0 });
        assert!(host.advance(16.0).is_empty());
    }

    #[test]
    fn test_dropped_handle_cancels() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        let frame = host.request_frame();
        let timer = host.set_timeout(10.0);
        drop(frame);
        drop(timer);
        assert_eq!(host.registration_count(), 0);
        assert!(host.advance(100.0).is_empty());
    }

    #[test]
    fn test_timer_fires_at_deadline() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        let _timer = host.set_timeout(100.0);
        assert!(host.advance(99.0).is_empty());
        let fired = host.advance(1.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event, HostEvent::Timer);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_queued_events_discarded_on_release() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        let listener = host.listen(Listen::KeyDown);
        host.press_key(Key::Escape);
        drop(listener);
        assert!(host.drain().is_empty());
    }

    #[test]
    fn test_viewport_change_notifies_once_per_listener() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        let _a = host.listen(Listen::ViewportChange);
        let _b = host.listen(Listen::WindowResize);
        host.set_viewport_size(1200.0, 600.0);
        host.set_viewport_size(1200.0, 600.0);
        let events = host.drain();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_scroll_lock_restores_previous() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        host.state.lock().document_overflow = "auto".into();
        let lock = host.lock_scroll();
        assert_eq!(host.document_overflow(), "hidden");
        assert!(host.scroll_locked());
        drop(lock);
        assert_eq!(host.document_overflow(), "auto");
        assert!(!host.scroll_locked());
    }

    #[test]
    fn test_overlay_requires_document() {
        let host = Host::headless();
        assert!(host.overlay().is_none());
        host.mark_document_ready();
        let surface = host.overlay();
        assert!(surface.is_some());
        assert_eq!(host.overlay_count(), 1);
        drop(surface);
        assert_eq!(host.overlay_count(), 0);
    }

    #[test]
    fn test_missing_capabilities() {
        let host = Host::with_capabilities(
            Viewport::new(800.0, 600.0),
            Capabilities {
                resize_observer: false,
                intersection_observer: false,
            },
        );
        let el = host.mount_element(ElementBox::sized(10.0, 10.0));
        assert!(host.observe_resize(el).is_none());
        assert!(host.observe_intersection(el).is_none());
    }

    #[test]
    fn test_scroll_clamps_and_notifies() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        let el = host.mount_element(ElementBox::sized(400.0, 300.0).with_scroll_width(1000.0));
        let _scroll = host.listen(Listen::Scroll(el));
        assert_eq!(host.scroll_to(el, 5000.0, ScrollBehavior::Smooth), 600.0);
        assert_eq!(host.scroll_by(el, -100.0, ScrollBehavior::Instant), 500.0);
        assert_eq!(host.last_scroll_behavior(), Some(ScrollBehavior::Instant));
        assert_eq!(host.drain().len(), 2);
    }

    #[test]
    fn test_inbox_only_reaches_live_tasks() {
        let host = Host::new(Viewport::new(800.0, 600.0));
        let task = host.task();
        let token = task.token();
        let sender = host.sender();
        assert!(sender.post(token, HostEvent::AssetsSettled { assets: Vec::new() }));
        assert_eq!(host.drain().len(), 1);
        drop(task);
        sender.post(token, HostEvent::AssetsSettled { assets: Vec::new() });
        assert!(host.drain().is_empty());
    }
}
