//! One scheduled run: fetch, normalize, detect, archive.
//!
//! Archival problems never prevent the caller from publishing the fresh
//! snapshot; only a broken history store is reported as fatal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::archive::ArchiveWriter;
use crate::detect::{should_archive, ComparisonKey};
use crate::error::{
    ArchiveWriteError, FetchError, ManifestError, NormalizationError, StoreCorruptionError,
};
use crate::fetch::fetch_all;
use crate::fetch::fetcher::Fetcher;
use crate::normalize::normalize;
use crate::platform::Platform;
use crate::report::json::render_manifest;
use crate::snapshot::Snapshot;
use crate::store::{HistoryRecord, HistoryStore};

#[derive(Debug)]
pub enum Archival {
    Archived(HistoryRecord),
    Unchanged(ComparisonKey),
    Failed(ArchiveWriteError),
}

/// File name the page renderer reads the fresh snapshot from.
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

/// Fresh snapshot of one run, before any archival decision.
pub struct Collected {
    pub snapshot: Snapshot,
    pub dropped: Vec<NormalizationError>,
    pub fetch_failures: Vec<(Platform, FetchError)>,
    pub fetch_duration_ms: u64,
}

pub struct RunReport {
    pub collected: Collected,
    pub archival: Result<Archival, StoreCorruptionError>,
}

/// Fetch every platform (joined before continuing) and normalize the results.
pub fn collect(fetchers: &[Box<dyn Fetcher>]) -> Collected {
    let batch = fetch_all(fetchers);
    let normalized = normalize(&batch.results, Utc::now());

    Collected {
        snapshot: normalized.snapshot,
        dropped: normalized.dropped,
        fetch_failures: batch.failures,
        fetch_duration_ms: batch.duration_ms,
    }
}

pub fn run<S, F>(
    fetchers: &[Box<dyn Fetcher>],
    store: &mut S,
    writer: &ArchiveWriter,
    render: F,
) -> RunReport
where
    S: HistoryStore + ?Sized,
    F: FnOnce(&Snapshot) -> io::Result<Vec<u8>>,
{
    let collected = collect(fetchers);
    let archival = archive_if_changed(&collected.snapshot, store, writer, render);

    RunReport { collected, archival }
}

/// Write `snapshot.json` for the page renderer.
pub fn publish_snapshot(output_dir: &Path, snapshot: &Snapshot) -> io::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(SNAPSHOT_FILE_NAME);
    let json = serde_json::to_string_pretty(snapshot).map_err(io::Error::other)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Archive `snapshot` if it differs from the latest record. `render` is only
/// invoked when a change was detected. After a successful archive the listing
/// manifest is regenerated; failing that is logged and does not undo the record.
pub fn archive_if_changed<S, F>(
    snapshot: &Snapshot,
    store: &mut S,
    writer: &ArchiveWriter,
    render: F,
) -> Result<Archival, StoreCorruptionError>
where
    S: HistoryStore + ?Sized,
    F: FnOnce(&Snapshot) -> io::Result<Vec<u8>>,
{
    archive_if_changed_at(Utc::now(), snapshot, store, writer, render)
}

pub fn archive_if_changed_at<S, F>(
    now: DateTime<Utc>,
    snapshot: &Snapshot,
    store: &mut S,
    writer: &ArchiveWriter,
    render: F,
) -> Result<Archival, StoreCorruptionError>
where
    S: HistoryStore + ?Sized,
    F: FnOnce(&Snapshot) -> io::Result<Vec<u8>>,
{
    let (changed, key) = should_archive(snapshot, store)?;
    if !changed {
        info!(key = %key, "snapshot unchanged, nothing to archive");
        return Ok(Archival::Unchanged(key));
    }

    let image = match render(snapshot) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "no image for changed snapshot, skipping archival");
            return Ok(Archival::Failed(ArchiveWriteError::Render(e)));
        }
    };

    match writer.archive_at(now, store, snapshot, key, &image) {
        Ok(record) => {
            if let Err(e) = write_manifest(store, &writer.manifest_path()) {
                warn!(error = %e, "manifest not refreshed");
            }
            Ok(Archival::Archived(record))
        }
        Err(e) => {
            warn!(error = %e, "archival failed");
            Ok(Archival::Failed(e))
        }
    }
}

/// Regenerate the listing manifest from every stored record. Returns how many
/// records it lists.
pub fn write_manifest<S: HistoryStore + ?Sized>(
    store: &S,
    path: &Path,
) -> Result<usize, ManifestError> {
    let records = store.list(usize::MAX, None)?;
    let json = render_manifest(&records).map_err(ManifestError::Encode)?;
    let write_err = |source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_err)?;
    }
    fs::write(path, json).map_err(write_err)?;

    info!(path = %path.display(), records = records.len(), "manifest written");
    Ok(records.len())
}
