//! Record comparison.
//!
//! Compares the snapshots of two history records and reports changes:
//! - Matches offers by category and title
//! - Added, removed, or rescheduled (end of window moved)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::snapshot::{Category, Offer, Snapshot};
use super::HistoryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    Added,
    Removed,
    Rescheduled,
}

#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub title: String,
    pub category: Category,
    pub old_end: Option<DateTime<Utc>>,
    pub new_end: Option<DateTime<Utc>>,
    pub diff_type: DiffType,
}

pub struct DiffResult {
    pub entries: Vec<DiffEntry>,
    pub from_id: i64,
    pub to_id: i64,
    pub from_timestamp: String,
    pub to_timestamp: String,
}

fn index(snapshot: &Snapshot) -> BTreeMap<(Category, &str), &Offer> {
    snapshot
        .iter()
        .map(|(category, offer)| ((category, offer.title.as_str()), offer))
        .collect()
}

pub fn compare_records(from: &HistoryRecord, to: &HistoryRecord) -> DiffResult {
    DiffResult {
        entries: compare_snapshots(&from.raw_snapshot, &to.raw_snapshot),
        from_id: from.id,
        to_id: to.id,
        from_timestamp: from.timestamp.clone(),
        to_timestamp: to.timestamp.clone(),
    }
}

/// Offer-level changes from `from` to `to`, ordered by category then title.
pub fn compare_snapshots(from: &Snapshot, to: &Snapshot) -> Vec<DiffEntry> {
    let from_map = index(from);
    let to_map = index(to);

    let mut entries = Vec::new();

    for (&(category, title), to_offer) in &to_map {
        match from_map.get(&(category, title)) {
            Some(from_offer) if from_offer.end != to_offer.end => entries.push(DiffEntry {
                title: title.to_string(),
                category,
                old_end: from_offer.end,
                new_end: to_offer.end,
                diff_type: DiffType::Rescheduled,
            }),
            Some(_) => {}
            None => entries.push(DiffEntry {
                title: title.to_string(),
                category,
                old_end: None,
                new_end: to_offer.end,
                diff_type: DiffType::Added,
            }),
        }
    }

    for (&(category, title), from_offer) in &from_map {
        if !to_map.contains_key(&(category, title)) {
            entries.push(DiffEntry {
                title: title.to_string(),
                category,
                old_end: from_offer.end,
                new_end: None,
                diff_type: DiffType::Removed,
            });
        }
    }

    entries.sort_by(|a, b| (a.category, &a.title).cmp(&(b.category, &b.title)));
    entries
}
