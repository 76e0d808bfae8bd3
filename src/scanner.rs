//! Builds a gallery from a media directory.
//!
//! - Recursive or flat walk using walkdir
//! - Media kind detection by file extension
//! - Natural image height as the item height hint
//! - Sorted by path so ids are stable between runs

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::image_loader;
use crate::models::{GalleryItem, MediaKind};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to scan directories recursively.
    pub recursive: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    pub follow_symlinks: bool,
    /// Read image headers for height hints.
    pub probe_dimensions: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 0,
            follow_symlinks: false,
            probe_dimensions: true,
        }
    }
}

struct DiscoveredEntry {
    path: PathBuf,
    kind: MediaKind,
}

/// Scan `dir` and return one gallery item per media file.
pub fn scan_media_dir(dir: &Path, config: &ScanConfig) -> Result<Vec<GalleryItem>> {
    info!("Starting scan of {:?}", dir);
    let discovered = discover_files(dir, config)?;

    let items: Vec<GalleryItem> = discovered
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let media_ref = entry.path.to_string_lossy().into_owned();
            let id = format!("{}-{}", index + 1, file_stem(&entry.path));
            let hint = if config.probe_dimensions && entry.kind == MediaKind::Image {
                match image_loader::read_dimensions(&entry.path) {
                    Ok((_, height)) => Some(height as f32),
                    Err(e) => {
                        warn!("Failed to probe {:?}: {:#}", entry.path, e);
                        None
                    }
                }
            } else {
                None
            };
            let item = match hint {
                Some(h) => GalleryItem::new(id, media_ref, h),
                None => GalleryItem::without_hint(id, media_ref),
            };
            item.with_kind(entry.kind)
        })
        .collect();

    info!("Scan complete: {} media files", items.len());
    Ok(items)
}

fn discover_files(dir: &Path, config: &ScanConfig) -> Result<Vec<DiscoveredEntry>> {
    let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);

    if !config.recursive {
        walker = walker.max_depth(1);
    } else if config.max_depth > 0 {
        walker = walker.max_depth(config.max_depth);
    }

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself being unreadable is fatal; anything below is skipped.
            Err(e) if e.depth() == 0 => {
                return Err(Error::Scan {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let Some(kind) = MediaKind::from_extension(ext) else {
            continue;
        };
        entries.push(DiscoveredEntry {
            path: path.to_path_buf(),
            kind,
        });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::new(30, 45).save(dir.path().join("b.png")).unwrap();
        image::RgbaImage::new(10, 20).save(dir.path().join("a.png")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not media").unwrap();
        fs::write(dir.path().join("clip.mp4"), b"\0\0\0\x18ftyp").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        image::RgbaImage::new(8, 8).save(dir.path().join("nested/c.png")).unwrap();
        dir
    }

    #[test]
    fn test_scan_recursive() {
        let dir = fixture();
        let items = scan_media_dir(dir.path(), &ScanConfig::default()).unwrap();
        let names: Vec<String> = items
            .iter()
            .map(|i| file_stem(Path::new(&i.media_ref)))
            .collect();
        assert_eq!(names, vec!["a", "b", "clip", "c"]);
        assert_eq!(items[0].height_hint, Some(20.0));
        assert_eq!(items[1].height_hint, Some(45.0));
        assert!(items[2].is_video());
        assert_eq!(items[2].height_hint, None);
        assert_eq!(items[0].id, "1-a");
    }

    #[test]
    fn test_scan_flat() {
        let dir = fixture();
        let config = ScanConfig {
            recursive: false,
            ..ScanConfig::default()
        };
        let items = scan_media_dir(dir.path(), &config).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_scan_without_probe() {
        let dir = fixture();
        let config = ScanConfig {
            probe_dimensions: false,
            ..ScanConfig::default()
        };
        let items = scan_media_dir(dir.path(), &config).unwrap();
        assert!(items.iter().all(|i| i.height_hint.is_none()));
    }

    #[test]
    fn test_missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let err = scan_media_dir(&missing, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Scan { .. }));
    }
}
