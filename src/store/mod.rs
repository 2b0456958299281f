//! History archive storage.
//!
//! One row per detected change:
//! - records: id, ts, fetched_at, hash, snapshot, image
//!
//! Supports:
//! - Atomic, gap-free appends
//! - Latest record lookup for change detection
//! - Newest-first listing, optionally before a timestamp
//! - Timestamp range retrieval and lookup by id

pub mod diff;
pub mod memory;
pub mod sqlite;

use serde::Serialize;

use crate::detect::ComparisonKey;
use crate::error::StoreCorruptionError;
use crate::snapshot::Snapshot;

/// Fixed `YYYYMMDDHHmmss` layout of record timestamps (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// An archived snapshot change. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: String,
    pub comparison_key: ComparisonKey,
    pub image_reference: String,
    pub raw_snapshot: Snapshot,
}

/// A record that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub timestamp: String,
    pub comparison_key: ComparisonKey,
    pub image_reference: String,
    pub raw_snapshot: Snapshot,
}

impl NewRecord {
    pub fn with_id(self, id: i64) -> HistoryRecord {
        HistoryRecord {
            id,
            timestamp: self.timestamp,
            comparison_key: self.comparison_key,
            image_reference: self.image_reference,
            raw_snapshot: self.raw_snapshot,
        }
    }
}

pub trait HistoryStore {
    /// Append one record and return its id. Ids start at 1 and increase by
    /// exactly one per append. The write is all-or-nothing.
    fn append(&mut self, record: NewRecord) -> Result<i64, StoreCorruptionError>;

    fn latest(&self) -> Result<Option<HistoryRecord>, StoreCorruptionError>;

    /// Up to `limit` records, newest first. With `before`, only records whose
    /// timestamp sorts strictly before it.
    fn list(
        &self,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, StoreCorruptionError>;

    /// Records with `from <= timestamp <= to`, newest first.
    fn range(&self, from: &str, to: &str) -> Result<Vec<HistoryRecord>, StoreCorruptionError>;

    fn get(&self, id: i64) -> Result<Option<HistoryRecord>, StoreCorruptionError>;

    fn count(&self) -> Result<usize, StoreCorruptionError>;
}
