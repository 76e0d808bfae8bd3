use std::path::Path;

use anyhow::{Context, Result};
use image::ImageReader;

/// Read pixel dimensions from the image header without decoding pixels.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open image: {:?}", path))?
        .with_guessed_format()
        .context("Failed to guess image format")?;
    let (width, height) = reader
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions: {:?}", path))?;
    anyhow::ensure!(width > 0 && height > 0, "Image has no pixels: {:?}", path);
    Ok((width, height))
}

/// True for refs the preloader cannot resolve locally (remote or inline).
pub fn is_remote_ref(media_ref: &str) -> bool {
    let lower = media_ref.trim_start().to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("data:")
        || lower.starts_with("//")
}
