//! Mounts the three sections of a manifest on a simulated host and drives
//! them frame by frame.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::components::{estimate_sequence_width, pump, Carousel, Component, Gallery, Marquee};
use crate::config::SiteManifest;
use crate::error::Result;
use crate::host::{ElementBox, ElementId, Host};
use crate::preload::AssetPreloader;
use crate::scanner::{scan_media_dir, ScanConfig};

/// Frame interval of the simulated display.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

const CARD_WIDTH: f32 = 284.0;
const CARD_GAP: f32 = 16.0;
const CARD_HEIGHT: f32 = 400.0;

struct Elements {
    gallery: ElementId,
    marquee_container: ElementId,
    carousel_viewport: ElementId,
}

pub struct Showcase {
    host: Host,
    elements: Elements,
    gallery: Gallery,
    marquee: Marquee,
    carousel: Carousel,
    frames: usize,
    dispatches: usize,
}

/// Snapshot of every section after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowcaseReport {
    pub frames: usize,
    pub elapsed_ms: f64,
    pub dispatches: usize,
    pub gallery_columns: usize,
    pub gallery_items: usize,
    pub gallery_height: f32,
    pub gallery_entered: bool,
    pub marquee_offset: f32,
    pub marquee_copies: usize,
    pub marquee_running: bool,
    pub carousel_index: usize,
    pub carousel_offset: f32,
    pub registrations: usize,
}

impl fmt::Display for ShowcaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "frames: {} ({:.0} ms, {} dispatches)",
            self.frames, self.elapsed_ms, self.dispatches
        )?;
        writeln!(
            f,
            "gallery: {} items in {} columns, {:.0}px tall, entered: {}",
            self.gallery_items, self.gallery_columns, self.gallery_height, self.gallery_entered
        )?;
        writeln!(
            f,
            "marquee: offset {:.1}px, {} copies, running: {}",
            self.marquee_offset, self.marquee_copies, self.marquee_running
        )?;
        writeln!(
            f,
            "carousel: index {}, offset {:.0}px",
            self.carousel_index, self.carousel_offset
        )?;
        write!(f, "live registrations: {}", self.registrations)
    }
}

impl Showcase {
    pub fn new(manifest: &SiteManifest) -> Result<Self> {
        let host = Host::new(manifest.viewport.to_viewport());
        let preloader = Arc::new(AssetPreloader::new(manifest.preload_workers));
        let width = manifest.viewport.width;

        let mut gallery_items = manifest.gallery.items.clone();
        if gallery_items.is_empty() {
            if let Some(dir) = &manifest.gallery.media_dir {
                gallery_items = scan_media_dir(dir, &ScanConfig::default())?;
            }
        }
        let gallery_el = host.mount_element(ElementBox::sized(width, 0.0));
        let gallery = Gallery::mount(
            &host,
            gallery_el,
            gallery_items,
            manifest.gallery.options.clone(),
            Arc::clone(&preloader),
        )?;

        let marquee_opts = &manifest.marquee.options;
        let sequence_width = estimate_sequence_width(
            &manifest.marquee.items,
            marquee_opts.item_height_px,
            marquee_opts.gap_px,
        );
        let marquee_container = host.mount_element(ElementBox::sized(width, marquee_opts.item_height_px));
        let sequence = host.mount_element(ElementBox::sized(sequence_width, marquee_opts.item_height_px));
        let marquee = Marquee::mount(
            &host,
            marquee_container,
            sequence,
            manifest.marquee.items.clone(),
            marquee_opts.clone(),
            preloader,
        );

        let cards = manifest.carousel.items.len();
        let rail_width = cards as f32 * (CARD_WIDTH + CARD_GAP);
        let carousel_viewport =
            host.mount_element(ElementBox::sized(width, CARD_HEIGHT).with_scroll_width(rail_width));
        let rail = host.mount_element(ElementBox::sized(rail_width, CARD_HEIGHT));
        let first_card = (cards > 0).then(|| {
            host.mount_element(ElementBox::sized(CARD_WIDTH, CARD_HEIGHT).with_margin_right(CARD_GAP))
        });
        let carousel = Carousel::mount(
            &host,
            carousel_viewport,
            rail,
            first_card,
            manifest.carousel.items.clone(),
            manifest.carousel.options.clone(),
        );

        info!(
            gallery = gallery.items().len(),
            logos = manifest.marquee.items.len(),
            cards,
            "Showcase mounted"
        );

        Ok(Self {
            host,
            elements: Elements {
                gallery: gallery_el,
                marquee_container,
                carousel_viewport,
            },
            gallery,
            marquee,
            carousel,
            frames: 0,
            dispatches: 0,
        })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn marquee(&self) -> &Marquee {
        &self.marquee
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    /// Resize the window; every section's container follows it.
    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        debug!(width, height, "Viewport resized");
        self.host.set_viewport_size(width, height);
        for el in [
            self.elements.gallery,
            self.elements.marquee_container,
            self.elements.carousel_viewport,
        ] {
            self.host.update_element(el, |b| b.width = width);
        }
    }

    pub fn run_frames(&mut self, frames: usize) {
        for _ in 0..frames {
            let mut components: [&mut dyn Component; 3] =
                [&mut self.gallery, &mut self.marquee, &mut self.carousel];
            self.dispatches += pump(&self.host, &mut components, FRAME_MS);
            self.frames += 1;
        }
    }

    pub fn report(&self) -> ShowcaseReport {
        let marquee = self.marquee.state();
        let carousel = self.carousel.state();
        ShowcaseReport {
            frames: self.frames,
            elapsed_ms: self.host.now_ms(),
            dispatches: self.dispatches,
            gallery_columns: self.gallery.columns(),
            gallery_items: self.gallery.layout().len(),
            gallery_height: self.gallery.content_height(),
            gallery_entered: self.gallery.has_entered(),
            marquee_offset: marquee.offset,
            marquee_copies: marquee.copy_count,
            marquee_running: self.marquee.is_running(),
            carousel_index: carousel.current_index,
            carousel_offset: carousel.scroll_offset,
            registrations: self.host.registration_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> SiteManifest {
        let yaml = r#"
viewport: { width: 1280, height: 800 }
gallery:
  items:
    - { id: "1", media-ref: "/missing/1.jpg", height: 400 }
    - { id: "2", media-ref: "/missing/2.jpg", height: 250 }
    - { id: "3", media-ref: "/missing/3.jpg", height: 500 }
marquee:
  items:
    - { media-ref: "https://cdn.example.com/a.svg", width: 120, height: 40 }
    - { media-ref: "https://cdn.example.com/b.svg" }
carousel:
  items:
    - { media-ref: "/cards/1.jpg" }
    - { media-ref: "/cards/2.jpg" }
    - { media-ref: "/cards/3.jpg" }
    - { media-ref: "/cards/4.jpg" }
    - { media-ref: "/cards/5.jpg" }
    - { media-ref: "/cards/6.jpg" }
"#;
        SiteManifest::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_run_drives_all_sections() {
        let mut showcase = Showcase::new(&manifest()).unwrap();
        showcase.run_frames(300);
        let report = showcase.report();
        assert_eq!(report.frames, 300);
        assert_eq!(report.gallery_columns, 4);
        assert_eq!(report.gallery_items, 3);
        assert!(report.marquee_running);
        assert!(report.marquee_offset > 0.0);
        assert_eq!(report.marquee_copies, 10);
        assert_eq!(report.carousel_offset, 300.0);
        assert!(report.to_string().contains("gallery: 3 items in 4 columns"));
    }

    #[test]
    fn test_resize_changes_columns() {
        let mut showcase = Showcase::new(&manifest()).unwrap();
        showcase.run_frames(5);
        showcase.resize_viewport(500.0, 800.0);
        showcase.run_frames(5);
        assert_eq!(showcase.report().gallery_columns, 2);
        assert_eq!(showcase.gallery().container_width(), 500.0);
    }

    #[test]
    fn test_reduced_motion_manifest() {
        let mut m = manifest();
        m.viewport.reduced_motion = true;
        let mut showcase = Showcase::new(&m).unwrap();
        showcase.run_frames(400);
        let report = showcase.report();
        assert!(!report.marquee_running);
        assert_eq!(report.marquee_offset, 0.0);
        assert_eq!(report.carousel_offset, 0.0);
    }
}
