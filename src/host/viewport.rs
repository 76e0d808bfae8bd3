use std::str::FromStr;

use crate::error::{Error, Result};

/// Snapshot of the ambient display conditions a component may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub reduced_motion: bool,
    pub tab_hidden: bool,
    /// False while media conditions cannot be evaluated (headless render).
    pub interactive: bool,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            reduced_motion: false,
            tab_hidden: false,
            interactive: true,
        }
    }

    pub fn headless() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            reduced_motion: false,
            tab_hidden: false,
            interactive: false,
        }
    }

    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }
}

/// The subset of CSS media conditions the components rely on.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaQuery {
    MinWidth(f32),
    MaxWidth(f32),
    ReducedMotion,
    All(Vec<MediaQuery>),
}

impl MediaQuery {
    pub fn matches(&self, viewport: &Viewport) -> bool {
        match self {
            Self::MinWidth(px) => viewport.width >= *px,
            Self::MaxWidth(px) => viewport.width <= *px,
            Self::ReducedMotion => viewport.reduced_motion,
            Self::All(parts) => parts.iter().all(|q| q.matches(viewport)),
        }
    }

    fn parse_feature(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidQuery(raw.to_string());
        let inner = raw
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let (name, value) = inner.split_once(':').ok_or_else(invalid)?;
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "min-width" => Ok(Self::MinWidth(parse_px(value).ok_or_else(invalid)?)),
            "max-width" => Ok(Self::MaxWidth(parse_px(value).ok_or_else(invalid)?)),
            "prefers-reduced-motion" if value.eq_ignore_ascii_case("reduce") => {
                Ok(Self::ReducedMotion)
            }
            _ => Err(invalid()),
        }
    }
}

fn parse_px(value: &str) -> Option<f32> {
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|v| v.is_finite())
}

impl FromStr for MediaQuery {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s
            .split(" and ")
            .map(Self::parse_feature)
            .collect::<Result<Vec<_>>>()?;
        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Self::All(parts))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_min_width() {
        let q: MediaQuery = "(min-width:1500px)".parse().unwrap();
        assert_eq!(q, MediaQuery::MinWidth(1500.0));
        let q: MediaQuery = "( max-width : 599px )".parse().unwrap();
        assert_eq!(q, MediaQuery::MaxWidth(599.0));
    }

    #[test]
    fn test_parse_conjunction() {
        let q: MediaQuery = "(min-width: 600px) and (max-width: 999px)".parse().unwrap();
        assert!(q.matches(&Viewport::new(800.0, 600.0)));
        assert!(!q.matches(&Viewport::new(1200.0, 600.0)));
    }

    #[test]
    fn test_reduced_motion_query() {
        let q: MediaQuery = "(prefers-reduced-motion: reduce)".parse().unwrap();
        assert!(!q.matches(&Viewport::new(800.0, 600.0)));
        assert!(q.matches(&Viewport::new(800.0, 600.0).with_reduced_motion(true)));
    }

    #[test]
    fn test_invalid_query() {
        assert!("min-width: 10px".parse::<MediaQuery>().is_err());
        assert!("(orientation: landscape)".parse::<MediaQuery>().is_err());
        assert!("(min-width: wide)".parse::<MediaQuery>().is_err());
    }
}
