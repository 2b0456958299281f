//! In-process history store.
//!
//! Same contract as the SQLite store without durability. Handy for callers
//! that want change detection against a fixed history, and for tests.

use crate::error::StoreCorruptionError;
use super::{HistoryRecord, HistoryStore, NewRecord};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<HistoryRecord>,
}

impl HistoryStore for MemoryStore {
    fn append(&mut self, record: NewRecord) -> Result<i64, StoreCorruptionError> {
        let id = self.records.last().map_or(1, |r| r.id + 1);
        self.records.push(record.with_id(id));
        Ok(id)
    }

    fn latest(&self) -> Result<Option<HistoryRecord>, StoreCorruptionError> {
        Ok(self.records.last().cloned())
    }

    fn list(
        &self,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<HistoryRecord>, StoreCorruptionError> {
        Ok(self
            .records
            .iter()
            .rev()
            .filter(|r| before.map_or(true, |b| r.timestamp.as_str() < b))
            .take(limit)
            .cloned()
            .collect())
    }

    fn range(&self, from: &str, to: &str) -> Result<Vec<HistoryRecord>, StoreCorruptionError> {
        Ok(self
            .records
            .iter()
            .rev()
            .filter(|r| r.timestamp.as_str() >= from && r.timestamp.as_str() <= to)
            .cloned()
            .collect())
    }

    fn get(&self, id: i64) -> Result<Option<HistoryRecord>, StoreCorruptionError> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    fn count(&self) -> Result<usize, StoreCorruptionError> {
        Ok(self.records.len())
    }
}
