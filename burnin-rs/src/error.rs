use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),

    #[error("no platform profile configured for `{0}`")]
    MissingProfile(String),

    #[error("unknown vector species `{0}`")]
    UnknownSpecies(String),

    #[error("invalid individual property `{property}`: {message}")]
    InvalidProperty { property: String, message: String },

    #[error("invalid event recorder: {0}")]
    InvalidReporter(String),

    #[error("invalid run parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid sweep: {0}")]
    InvalidSweep(String),

    #[error("asset directory not found: {0}")]
    MissingAssetDirectory(PathBuf),

    #[error("asset {destination} already present with checksum {existing}, refusing {incoming}")]
    AssetConflict {
        destination: String,
        existing: String,
        incoming: String,
    },

    #[error("engine binary not found at {0} and no download url configured")]
    MissingEngine(PathBuf),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("experiment directory already exists: {0}")]
    ExperimentExists(PathBuf),

    #[error("could not determine the current user")]
    UnknownUser,

    #[error("submission failed: {0}")]
    Submission(String),
}

/// Attaches `path` to an [`io::Error`].
pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}
