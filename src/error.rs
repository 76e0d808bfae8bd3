use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the configuration and scanning edges of the crate.
///
/// Runtime degradations inside components (failed assets, missing observer
/// support, unmeasured containers) never produce an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read manifest {path:?}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest")]
    ManifestParse(#[from] serde_yaml::Error),

    #[error("invalid media query: {0:?}")]
    InvalidQuery(String),

    #[error("unknown ease: {0:?}")]
    InvalidEase(String),

    #[error("failed to scan media directory {path:?}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
