//! Owned registrations. Every frame request, timer, listener, observer and
//! task a component acquires is one of these; dropping it releases the
//! registration and discards any dispatch already queued for it.

use std::fmt;
use std::sync::Weak;

use parking_lot::Mutex;

use super::{Dispatch, HostState, Token};

pub struct Handle {
    token: Token,
    state: Weak<Mutex<HostState>>,
}

impl Handle {
    pub(super) fn new(token: Token, state: Weak<Mutex<HostState>>) -> Self {
        Self { token, state }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// True when `dispatch` was produced for this registration.
    pub fn owns(&self, dispatch: &Dispatch) -> bool {
        dispatch.token == self.token
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("token", &self.token).finish()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().release(self.token);
        }
    }
}

/// True when the optional handle in `slot` owns `dispatch`.
pub fn holds(slot: &Option<Handle>, dispatch: &Dispatch) -> bool {
    slot.as_ref().is_some_and(|h| h.owns(dispatch))
}

/// Document scroll lock. Restores the overflow value that was in effect when
/// the lock was taken, not an unconditional reset.
pub struct ScrollLock {
    previous: String,
    state: Weak<Mutex<HostState>>,
}

impl ScrollLock {
    pub(super) fn new(previous: String, state: Weak<Mutex<HostState>>) -> Self {
        Self { previous, state }
    }

    pub fn previous_overflow(&self) -> &str {
        &self.previous
    }
}

impl fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLock")
            .field("previous", &self.previous)
            .finish()
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock();
            state.document_overflow = std::mem::take(&mut self.previous);
            state.scroll_locks = state.scroll_locks.saturating_sub(1);
        }
    }
}

/// A mounted node in the top-level overlay layer, outside the calling
/// component's containment.
pub struct OverlaySurface {
    layer: u64,
    state: Weak<Mutex<HostState>>,
}

impl OverlaySurface {
    pub(super) fn new(layer: u64, state: Weak<Mutex<HostState>>) -> Self {
        Self { layer, state }
    }

    pub fn layer(&self) -> u64 {
        self.layer
    }
}

impl fmt::Debug for OverlaySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlaySurface")
            .field("layer", &self.layer)
            .finish()
    }
}

impl Drop for OverlaySurface {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().overlays.remove(&self.layer);
        }
    }
}
