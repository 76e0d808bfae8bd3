use serde::Deserialize;

/// A logo in the marquee track.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogoItem {
    pub media_ref: String,
    #[serde(default)]
    pub link_href: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    /// Intrinsic width, used with `height` to estimate the rendered width.
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

impl LogoItem {
    pub fn new(media_ref: impl Into<String>) -> Self {
        Self {
            media_ref: media_ref.into(),
            link_href: None,
            alt: None,
            width: None,
            height: None,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_link(mut self, href: impl Into<String>) -> Self {
        self.link_href = Some(href.into());
        self
    }

    /// Width/height ratio, square when unknown.
    pub fn aspect_ratio(&self) -> f32 {
        match (self.width, self.height) {
            (Some(w), Some(h)) if h > 0.0 && w > 0.0 => w / h,
            _ => 1.0,
        }
    }
}

/// A card shown by the carousel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CardItem {
    pub media_ref: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl CardItem {
    pub fn new(media_ref: impl Into<String>) -> Self {
        Self {
            media_ref: media_ref.into(),
            title: None,
        }
    }
}
