//! JSON output for history records.
//!
//! The manifest is what the history listing page consumes: oldest record
//! first, without the full snapshot payload.

use serde::Serialize;

use crate::snapshot::Counts;
use crate::store::HistoryRecord;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry<'a> {
    pub id: i64,
    pub timestamp: &'a str,
    pub fetched_at: Option<String>,
    pub hash: &'a str,
    pub image: &'a str,
    pub counts: Counts,
}

#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub version: u32,
    pub records: Vec<ManifestEntry<'a>>,
}

/// Build a manifest from records listed newest first.
pub fn manifest(newest_first: &[HistoryRecord]) -> Manifest<'_> {
    let records = newest_first
        .iter()
        .rev()
        .map(|record| ManifestEntry {
            id: record.id,
            timestamp: &record.timestamp,
            fetched_at: record.raw_snapshot.fetched_at.map(|t| t.to_rfc3339()),
            hash: record.comparison_key.as_str(),
            image: &record.image_reference,
            counts: record.raw_snapshot.counts(),
        })
        .collect();

    Manifest {
        version: MANIFEST_VERSION,
        records,
    }
}

pub fn render_manifest(newest_first: &[HistoryRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&manifest(newest_first))
}

pub fn render_records(records: &[HistoryRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

pub fn render_record(record: &HistoryRecord) -> serde_json::Result<String> {
    serde_json::to_string_pretty(record)
}
