//! Single-item lightbox rendered on the overlay layer.
//!
//! Phases run `Closed -> Opening -> Open -> Closing -> Closed`. While an item
//! is set the modal holds the scroll lock, one key listener and the overlay
//! surface; all three are released when it returns to `Closed` or is
//! dropped. Open and close retarget the same tracks, so the last request
//! wins and nothing queues.

use tracing::debug;

use crate::host::{holds, Dispatch, Handle, Host, HostEvent, Key, Listen, OverlaySurface, ScrollLock};
use crate::motion::{Ease, Lerp, Track};

const BACKDROP_IN_MS: f64 = 220.0;
const CARD_IN_MS: f64 = 280.0;
const OUT_MS: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Click targets inside the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalTarget {
    Backdrop,
    Card,
    CloseButton,
}

/// Animated state of the content card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPose {
    pub opacity: f32,
    pub y: f32,
    pub scale: f32,
}

impl CardPose {
    pub const REST: CardPose = CardPose {
        opacity: 1.0,
        y: 0.0,
        scale: 1.0,
    };
    const ENTER_FROM: CardPose = CardPose {
        opacity: 0.0,
        y: 10.0,
        scale: 0.94,
    };
    const EXIT_TO: CardPose = CardPose {
        opacity: 0.0,
        y: 20.0,
        scale: 0.98,
    };
}

impl Lerp for CardPose {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        Self {
            opacity: f32::lerp(from.opacity, to.opacity, t),
            y: f32::lerp(from.y, to.y, t),
            scale: f32::lerp(from.scale, to.scale, t),
        }
    }
}

pub struct Modal<T> {
    item: Option<T>,
    phase: ModalPhase,
    backdrop: Track<f32>,
    card: Track<CardPose>,
    scroll_lock: Option<ScrollLock>,
    key_listener: Option<Handle>,
    surface: Option<OverlaySurface>,
    frame: Option<Handle>,
}

impl<T> Default for Modal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Modal<T> {
    pub fn new() -> Self {
        Self {
            item: None,
            phase: ModalPhase::Closed,
            backdrop: Track::new(0.0),
            card: Track::new(CardPose::ENTER_FROM),
            scroll_lock: None,
            key_listener: None,
            surface: None,
            frame: None,
        }
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.item.is_some()
    }

    /// True while content is mounted on an overlay surface.
    pub fn is_mounted(&self) -> bool {
        self.surface.is_some() && self.item.is_some()
    }

    pub fn backdrop_opacity(&self) -> f32 {
        self.backdrop.value()
    }

    pub fn card_pose(&self) -> CardPose {
        self.card.value()
    }

    pub fn open(&mut self, host: &Host, item: T) {
        self.item = Some(item);
        match self.phase {
            ModalPhase::Closed => {
                self.scroll_lock = Some(host.lock_scroll());
                self.key_listener = Some(host.listen(Listen::KeyDown));
                self.surface = host.overlay();
                if self.surface.is_none() {
                    debug!("No overlay surface yet, opening without animation");
                    self.backdrop.set(1.0);
                    self.card.set(CardPose::REST);
                    self.phase = ModalPhase::Open;
                    return;
                }
                let now = host.now_ms();
                self.backdrop.from_to(now, 0.0, 1.0, BACKDROP_IN_MS, 0.0, Ease::POWER2_OUT);
                self.card
                    .from_to(now, CardPose::ENTER_FROM, CardPose::REST, CARD_IN_MS, 0.0, Ease::POWER3_OUT);
                self.set_phase(ModalPhase::Opening);
                self.frame = Some(host.request_frame());
            }
            ModalPhase::Closing => {
                let now = host.now_ms();
                self.backdrop.to(now, 1.0, BACKDROP_IN_MS, 0.0, Ease::POWER2_OUT);
                self.card.to(now, CardPose::REST, CARD_IN_MS, 0.0, Ease::POWER3_OUT);
                self.set_phase(ModalPhase::Opening);
                self.ensure_frame(host);
            }
            ModalPhase::Opening | ModalPhase::Open => {}
        }
    }

    pub fn close(&mut self, host: &Host) {
        match self.phase {
            ModalPhase::Closed | ModalPhase::Closing => {}
            ModalPhase::Opening | ModalPhase::Open => {
                if self.surface.is_none() {
                    self.finish_close();
                    return;
                }
                let now = host.now_ms();
                self.card.to(now, CardPose::EXIT_TO, OUT_MS, 0.0, Ease::POWER2_OUT);
                self.backdrop.to(now, 0.0, OUT_MS, 0.0, Ease::POWER2_OUT);
                self.set_phase(ModalPhase::Closing);
                self.ensure_frame(host);
            }
        }
    }

    /// Clicks on the card stop there; backdrop and close button dismiss.
    pub fn click(&mut self, host: &Host, target: ModalTarget) {
        match target {
            ModalTarget::Card => {}
            ModalTarget::Backdrop | ModalTarget::CloseButton => self.close(host),
        }
    }

    pub fn handle(&mut self, host: &Host, dispatch: &Dispatch) {
        if holds(&self.key_listener, dispatch) {
            if dispatch.event == HostEvent::Key(Key::Escape) {
                self.close(host);
            }
            return;
        }
        if !holds(&self.frame, dispatch) {
            return;
        }
        let HostEvent::Frame { timestamp_ms } = dispatch.event else {
            return;
        };
        self.frame = None;
        let backdrop_running = self.backdrop.tick(timestamp_ms);
        let card_running = self.card.tick(timestamp_ms);
        if backdrop_running || card_running {
            self.frame = Some(host.request_frame());
            return;
        }
        match self.phase {
            ModalPhase::Opening => self.set_phase(ModalPhase::Open),
            ModalPhase::Closing => self.finish_close(),
            ModalPhase::Open | ModalPhase::Closed => {}
        }
    }

    fn ensure_frame(&mut self, host: &Host) {
        if self.frame.is_none() {
            self.frame = Some(host.request_frame());
        }
    }

    fn set_phase(&mut self, phase: ModalPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "Modal phase");
            self.phase = phase;
        }
    }

    fn finish_close(&mut self) {
        self.set_phase(ModalPhase::Closed);
        self.item = None;
        self.frame = None;
        self.key_listener = None;
        self.surface = None;
        self.scroll_lock = None;
        self.backdrop.set(0.0);
        self.card.set(CardPose::ENTER_FROM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Viewport;

    fn run(host: &Host, modal: &mut Modal<&'static str>, frames: usize) {
        for _ in 0..frames {
            for dispatch in host.advance(16.0) {
                modal.handle(host, &dispatch);
            }
        }
    }

    fn assert_released(host: &Host) {
        assert_eq!(host.listener_count(Listen::KeyDown), 0);
        assert!(!host.scroll_locked());
        assert_eq!(host.overlay_count(), 0);
        assert_eq!(host.registration_count(), 0);
    }

    #[test]
    fn test_open_then_settle() {
        let host = Host::new(Viewport::new(1280.0, 800.0));
        let mut modal = Modal::new();
        modal.open(&host, "a");
        assert_eq!(modal.phase(), ModalPhase::Opening);
        assert!(host.scroll_locked());
        assert_eq!(host.listener_count(Listen::KeyDown), 1);
        assert_eq!(host.overlay_count(), 1);

        run(&host, &mut modal, 30);
        assert_eq!(modal.phase(), ModalPhase::Open);
        assert_eq!(modal.card_pose(), CardPose::REST);
        assert_eq!(modal.backdrop_opacity(), 1.0);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_open_then_immediate_close_leaks_nothing() {
        let host = Host::new(Viewport::new(1280.0, 800.0));
        let mut modal = Modal::new();
        modal.open(&host, "a");
        run(&host, &mut modal, 2);
        modal.close(&host);
        assert_eq!(modal.phase(), ModalPhase::Closing);
        assert!(modal.is_open());

        run(&host, &mut modal, 30);
        assert_eq!(modal.phase(), ModalPhase::Closed);
        assert!(modal.item().is_none());
        assert_released(&host);
    }

    #[test]
    fn test_escape_closes() {
        let host = Host::new(Viewport::new(1280.0, 800.0));
        let mut modal = Modal::new();
        modal.open(&host, "a");
        run(&host, &mut modal, 30);
        host.press_key(Key::ArrowLeft);
        host.press_key(Key::Escape);
        run(&host, &mut modal, 1);
        assert_eq!(modal.phase(), ModalPhase::Closing);
        run(&host, &mut modal, 30);
        assert_released(&host);
    }

    #[test]
    fn test_card_click_does_not_close() {
        let host = Host::new(Viewport::new(1280.0, 800.0));
        let mut modal = Modal::new();
        modal.open(&host, "a");
        run(&host, &mut modal, 30);
        modal.click(&host, ModalTarget::Card);
        assert_eq!(modal.phase(), ModalPhase::Open);
        modal.click(&host, ModalTarget::Backdrop);
        assert_eq!(modal.phase(), ModalPhase::Closing);
    }

    #[test]
    fn test_reopen_during_close() {
        let host = Host::new(Viewport::new(1280.0, 800.0));
        let mut modal = Modal::new();
        modal.open(&host, "a");
        run(&host, &mut modal, 30);
        modal.close(&host);
        run(&host, &mut modal, 3);
        modal.open(&host, "b");
        assert_eq!(modal.phase(), ModalPhase::Opening);
        assert_eq!(modal.item(), Some(&"b"));
        assert_eq!(host.listener_count(Listen::KeyDown), 1);
        assert!(host.pending_frames() <= 1);
        run(&host, &mut modal, 30);
        assert_eq!(modal.phase(), ModalPhase::Open);
    }

    #[test]
    fn test_repeated_cycles_keep_one_listener() {
        let host = Host::new(Viewport::new(1280.0, 800.0));
        let mut modal = Modal::new();
        for _ in 0..5 {
            modal.open(&host, "a");
            assert_eq!(host.listener_count(Listen::KeyDown), 1);
            modal.close(&host);
            run(&host, &mut modal, 30);
        }
        assert_released(&host);
    }

    #[test]
    fn test_no_surface_closes_immediately() {
        let host = Host::headless();
        let mut modal = Modal::new();
        modal.open(&host, "a");
        assert_eq!(modal.phase(), ModalPhase::Open);
        assert!(!modal.is_mounted());
        modal.close(&host);
        assert_eq!(modal.phase(), ModalPhase::Closed);
        assert_released(&host);
    }

    #[test]
    fn test_drop_releases_everything() {
        let host = Host::new(Viewport::new(1280.0, 800.0));
        let mut modal = Modal::new();
        modal.open(&host, "a");
        drop(modal);
        assert_released(&host);
        assert_eq!(host.document_overflow(), "");
    }
}
