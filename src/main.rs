use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use atelier::config::SiteManifest;
use atelier::showcase::Showcase;

/// Drive the gallery, marquee and carousel of a site manifest on a simulated
/// display and print where each section ends up.
#[derive(Parser, Debug)]
#[command(name = "atelier", version)]
struct Cli {
    /// YAML site manifest. Without one, an empty page is simulated.
    manifest: Option<PathBuf>,

    /// Populate the gallery from this directory instead of manifest items.
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: usize,

    #[arg(long)]
    width: Option<f32>,

    #[arg(long)]
    height: Option<f32>,

    /// Resize the viewport to this width halfway through the run.
    #[arg(long)]
    resize_to: Option<f32>,

    #[arg(long)]
    reduced_motion: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atelier=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut manifest = match &cli.manifest {
        Some(path) => SiteManifest::from_yaml_file(path)
            .with_context(|| format!("loading manifest {}", path.display()))?,
        None => SiteManifest::default().validated()?,
    };
    if let Some(dir) = cli.media_dir {
        manifest.gallery.items.clear();
        manifest.gallery.media_dir = Some(dir);
    }
    if let Some(width) = cli.width {
        manifest.viewport.width = width;
    }
    if let Some(height) = cli.height {
        manifest.viewport.height = height;
    }
    if cli.reduced_motion {
        manifest.viewport.reduced_motion = true;
    }

    let mut showcase = Showcase::new(&manifest).context("mounting sections")?;
    match cli.resize_to {
        Some(width) => {
            let first = cli.frames / 2;
            showcase.run_frames(first);
            showcase.resize_viewport(width, manifest.viewport.height);
            showcase.run_frames(cli.frames - first);
        }
        None => showcase.run_frames(cli.frames),
    }

    let report = showcase.report();
    info!(frames = report.frames, "Simulation finished");
    println!("{report}");
    Ok(())
}
