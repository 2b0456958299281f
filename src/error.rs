//! Error taxonomy for the archive core.
//!
//! - NormalizationError: one malformed offer, dropped and logged
//! - ArchiveWriteError: image or record persistence failed, archival skipped for this run
//! - StoreCorruptionError: history store unreadable or unwritable, fatal for the caller
//! - ManifestError: listing manifest could not be regenerated, logged only

use std::path::PathBuf;

use thiserror::Error;

use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("{platform}: offer #{index} has no title")]
    MissingTitle { platform: Platform, index: usize },

    #[error("{platform}: offer '{title}' ends before it starts")]
    InvertedWindow { platform: Platform, title: String },

    #[error("{platform}: raw result is not a recognized shape: {reason}")]
    Shape { platform: Platform, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreCorruptionError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("history record {id} holds an undecodable snapshot: {source}")]
    Decode {
        id: i64,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not prepare history directory {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ArchiveWriteError {
    #[error("failed to write image {}: {}", .path.display(), .source)]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer produced no image: {0}")]
    Render(#[source] std::io::Error),

    #[error("image {} already exists, refusing to overwrite", .0.display())]
    ImageExists(PathBuf),

    #[error(
        "image written to {} but the history record was not appended: {}",
        .image.display(),
        .source
    )]
    Record {
        image: PathBuf,
        #[source]
        source: StoreCorruptionError,
    },
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Store(#[from] StoreCorruptionError),

    #[error("could not encode manifest: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write manifest {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} fetcher panicked")]
    Panicked(Platform),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine {0} directory")]
    NoProjectDirs(&'static str),

    #[error("failed to read config {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
