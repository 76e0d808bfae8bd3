use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" | "svg" | "avif" => {
                Some(Self::Image)
            }
            "webm" | "mp4" | "mkv" | "avi" | "mov" => Some(Self::Video),
            _ => None,
        }
    }

    /// Guess the kind from a path or URL, ignoring any query string.
    pub fn from_media_ref(media_ref: &str) -> Option<Self> {
        let trimmed = media_ref.split(['?', '#']).next().unwrap_or(media_ref);
        Path::new(trimmed)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// One entry of a gallery. Immutable once handed to a component; `id` is the
/// key every animation track and layout slot is addressed by.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGalleryItem")]
pub struct GalleryItem {
    pub id: String,
    pub media_ref: String,
    pub height_hint: Option<f32>,
    pub kind: MediaKind,
    /// Still frame shown for a video until it plays.
    pub poster: Option<String>,
}

impl GalleryItem {
    /// Create an image item with an explicit height hint.
    pub fn new(id: impl Into<String>, media_ref: impl Into<String>, height_hint: f32) -> Self {
        let media_ref = media_ref.into();
        Self {
            id: id.into(),
            kind: MediaKind::from_media_ref(&media_ref).unwrap_or(MediaKind::Image),
            media_ref,
            height_hint: Some(height_hint),
            poster: None,
        }
    }

    /// Create an item whose height is derived by the layout engine.
    pub fn without_hint(id: impl Into<String>, media_ref: impl Into<String>) -> Self {
        let media_ref = media_ref.into();
        Self {
            id: id.into(),
            kind: MediaKind::from_media_ref(&media_ref).unwrap_or(MediaKind::Image),
            media_ref,
            height_hint: None,
            poster: None,
        }
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawGalleryItem {
    id: String,
    media_ref: String,
    #[serde(default, alias = "height")]
    height_hint: Option<f32>,
    #[serde(default)]
    kind: Option<MediaKind>,
    #[serde(default)]
    poster: Option<String>,
}

impl From<RawGalleryItem> for GalleryItem {
    fn from(raw: RawGalleryItem) -> Self {
        let kind = raw
            .kind
            .or_else(|| MediaKind::from_media_ref(&raw.media_ref))
            .unwrap_or(MediaKind::Image);
        Self {
            id: raw.id,
            media_ref: raw.media_ref,
            height_hint: raw.height_hint,
            kind,
            poster: raw.poster,
        }
    }
}
