//! Archive writer.
//!
//! Persists the rendered image for a changed snapshot, then appends the
//! history record that points at it. The image always lands first: a record
//! never references a missing image, though a failed append may leave an
//! orphaned image behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::detect::ComparisonKey;
use crate::error::ArchiveWriteError;
use crate::snapshot::Snapshot;
use crate::store::{HistoryRecord, HistoryStore, NewRecord, TIMESTAMP_FORMAT};

/// Image artifacts live in this subdirectory of the history directory.
pub const RECORDS_DIR: &str = "records";

/// Listing manifest, next to the records directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

pub struct ArchiveWriter {
    history_dir: PathBuf,
    extension: String,
}

impl ArchiveWriter {
    pub fn new(history_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        ArchiveWriter {
            history_dir: history_dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn records_dir(&self) -> PathBuf {
        self.history_dir.join(RECORDS_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.history_dir.join(MANIFEST_FILE_NAME)
    }

    /// Resolve a record's image reference to a path on disk.
    pub fn image_path(&self, record: &HistoryRecord) -> PathBuf {
        self.history_dir.join(&record.image_reference)
    }

    pub fn archive<S: HistoryStore + ?Sized>(
        &self,
        store: &mut S,
        snapshot: &Snapshot,
        key: ComparisonKey,
        image: &[u8],
    ) -> Result<HistoryRecord, ArchiveWriteError> {
        self.archive_at(Utc::now(), store, snapshot, key, image)
    }

    /// Same as `archive` with the record timestamp taken from `now`.
    pub fn archive_at<S: HistoryStore + ?Sized>(
        &self,
        now: DateTime<Utc>,
        store: &mut S,
        snapshot: &Snapshot,
        key: ComparisonKey,
        image: &[u8],
    ) -> Result<HistoryRecord, ArchiveWriteError> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let file_name = format!("{timestamp}.{}", self.extension);
        let path = self.records_dir().join(&file_name);

        write_image(&path, image)?;

        let record = NewRecord {
            timestamp,
            comparison_key: key,
            image_reference: format!("{RECORDS_DIR}/{file_name}"),
            raw_snapshot: snapshot.clone(),
        };

        match store.append(record.clone()) {
            Ok(id) => {
                info!(id, ts = %record.timestamp, image = %path.display(), "archived snapshot");
                Ok(record.with_id(id))
            }
            Err(source) => {
                warn!(
                    image = %path.display(),
                    error = %source,
                    "history append failed, image left orphaned"
                );
                Err(ArchiveWriteError::Record { image: path, source })
            }
        }
    }
}

/// Write via a temp file and rename so a crash never leaves a truncated image
/// under the final name. Existing artifacts are never overwritten.
fn write_image(path: &Path, bytes: &[u8]) -> Result<(), ArchiveWriteError> {
    let io_err = |source| ArchiveWriteError::Image {
        path: path.to_path_buf(),
        source,
    };

    if path.exists() {
        return Err(ArchiveWriteError::ImageExists(path.to_path_buf()));
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    write_then_rename(path, bytes).map_err(io_err)
}

/// The `.part` temp file is removed again if either step fails.
fn write_then_rename(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("part");
    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() && tmp.is_file() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
