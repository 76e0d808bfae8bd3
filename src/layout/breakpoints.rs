use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::Result;
use crate::host::{holds, Dispatch, Handle, Host, Listen, MediaQuery, Viewport};

/// Column counts used by the gallery when no table is configured.
pub static DEFAULT_COLUMN_BREAKPOINTS: Lazy<Breakpoints<usize>> = Lazy::new(|| {
    Breakpoints::new(
        vec![
            (MediaQuery::MinWidth(1500.0), 5),
            (MediaQuery::MinWidth(1000.0), 4),
            (MediaQuery::MinWidth(600.0), 3),
            (MediaQuery::MinWidth(400.0), 2),
        ],
        1,
    )
});

/// Ordered `(query, value)` table; the first matching query wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoints<T> {
    entries: Vec<(MediaQuery, T)>,
    default: T,
}

impl<T: Clone + PartialEq> Breakpoints<T> {
    pub fn new(entries: Vec<(MediaQuery, T)>, default: T) -> Self {
        Self { entries, default }
    }

    pub fn parse(entries: &[(&str, T)], default: T) -> Result<Self> {
        let entries = entries
            .iter()
            .map(|(query, value)| Ok((query.parse::<MediaQuery>()?, value.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(entries, default))
    }

    /// Resolve against a viewport snapshot. Non-interactive viewports always
    /// yield the default.
    pub fn resolve(&self, viewport: &Viewport) -> T {
        if !viewport.interactive {
            return self.default.clone();
        }
        self.entries
            .iter()
            .find(|(query, _)| query.matches(viewport))
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| self.default.clone())
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }
}

/// A breakpoint table bound to the host's viewport-change notifications.
#[derive(Debug)]
pub struct ResponsiveValue<T> {
    breakpoints: Breakpoints<T>,
    value: T,
    listener: Option<Handle>,
}

impl<T: Clone + PartialEq + std::fmt::Debug> ResponsiveValue<T> {
    pub fn attach(host: &Host, breakpoints: Breakpoints<T>) -> Self {
        let value = breakpoints.resolve(&host.viewport());
        Self {
            breakpoints,
            value,
            listener: Some(host.listen(Listen::ViewportChange)),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Re-evaluates on this value's own viewport notifications. Returns the
    /// new value only when it differs from the current one.
    pub fn handle(&mut self, host: &Host, dispatch: &Dispatch) -> Option<T> {
        if !holds(&self.listener, dispatch) {
            return None;
        }
        let next = self.breakpoints.resolve(&host.viewport());
        if next == self.value {
            return None;
        }
        debug!(from = ?self.value, to = ?next, "Breakpoint value changed");
        self.value = next.clone();
        Some(next)
    }

    pub fn detach(&mut self) {
        self.listener = None;
    }
}
