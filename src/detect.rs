//! Change detection.
//!
//! A snapshot is reduced to the multiset of (category, title, end) triples.
//! The triples are sorted before hashing, so upstream reordering never
//! registers as a change while any added, removed or rescheduled offer does.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::StoreCorruptionError;
use crate::snapshot::Snapshot;
use crate::store::HistoryStore;

/// Order-insensitive SHA-256 digest of a snapshot, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonKey(String);

impl ComparisonKey {
    pub fn of(snapshot: &Snapshot) -> Self {
        let mut triples: Vec<(&str, &str, Option<(i64, u32)>)> = snapshot
            .iter()
            .map(|(category, offer)| {
                let end = offer
                    .end
                    .map(|end| (end.timestamp(), end.timestamp_subsec_nanos()));
                (category.as_str(), offer.title.as_str(), end)
            })
            .collect();
        triples.sort();

        let mut hasher = Sha256::new();
        for (category, title, end) in &triples {
            write_field(&mut hasher, category.as_bytes());
            write_field(&mut hasher, title.as_bytes());
            match end {
                Some((secs, nanos)) => {
                    hasher.update([1u8]);
                    hasher.update(secs.to_le_bytes());
                    hasher.update(nanos.to_le_bytes());
                }
                None => hasher.update([0u8]),
            }
        }

        ComparisonKey(hex::encode(hasher.finalize()))
    }

    /// Wrap a key read back from storage.
    pub fn from_stored(key: impl Into<String>) -> Self {
        ComparisonKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// length prefix keeps field boundaries unambiguous whatever bytes a title holds
fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

impl fmt::Display for ComparisonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decide whether `snapshot` differs from the most recently archived one.
///
/// Stateless: only persisted history is consulted, so calling this twice
/// without archiving in between gives the same answer both times.
pub fn should_archive<S: HistoryStore + ?Sized>(
    snapshot: &Snapshot,
    store: &S,
) -> Result<(bool, ComparisonKey), StoreCorruptionError> {
    let key = ComparisonKey::of(snapshot);

    let changed = match store.latest()? {
        Some(latest) => latest.comparison_key != key,
        None => true,
    };

    debug!(key = %key, changed, "change detection");
    Ok((changed, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Category, Offer};
    use crate::store::memory::MemoryStore;
    use crate::store::NewRecord;
    use chrono::{DateTime, Utc};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn snapshot(offers: &[(Category, &str, Option<&str>)]) -> Snapshot {
        let mut snapshot = Snapshot::empty();
        for (category, title, end) in offers {
            let mut offer = Offer::new(*title);
            offer.end = end.map(utc);
            snapshot.push(*category, offer);
        }
        snapshot
    }

    fn record(snapshot: &Snapshot) -> NewRecord {
        NewRecord {
            timestamp: "20250105120000".to_string(),
            comparison_key: ComparisonKey::of(snapshot),
            image_reference: "20250105120000.webp".to_string(),
            raw_snapshot: snapshot.clone(),
        }
    }

    #[test]
    fn reordering_within_category_keeps_key() {
        let a = snapshot(&[
            (Category::Steam, "Portal", None),
            (Category::Steam, "Dota", None),
        ]);
        let b = snapshot(&[
            (Category::Steam, "Dota", None),
            (Category::Steam, "Portal", None),
        ]);
        assert_eq!(ComparisonKey::of(&a), ComparisonKey::of(&b));
    }

    #[test]
    fn url_and_metadata_do_not_affect_key() {
        let a = snapshot(&[(Category::Psn, "Astro Bot", None)]);
        let mut b = a.clone();
        b.psn[0] = Offer::new("Astro Bot")
            .with_url("https://www.playstation.com/astro-bot")
            .with_extra("description", "platformer");
        b.fetched_at = Some(Utc::now());
        assert_eq!(ComparisonKey::of(&a), ComparisonKey::of(&b));
    }

    #[test]
    fn category_title_and_end_each_matter() {
        let base = snapshot(&[(Category::EpicNow, "Game X", Some("2025-01-10T00:00:00Z"))]);
        let moved = snapshot(&[(
            Category::EpicUpcoming,
            "Game X",
            Some("2025-01-10T00:00:00Z"),
        )]);
        let renamed = snapshot(&[(Category::EpicNow, "Game Y", Some("2025-01-10T00:00:00Z"))]);
        let extended = snapshot(&[(Category::EpicNow, "Game X", Some("2025-01-17T00:00:00Z"))]);
        let open_ended = snapshot(&[(Category::EpicNow, "Game X", None)]);

        let key = ComparisonKey::of(&base);
        for other in [&moved, &renamed, &extended, &open_ended] {
            assert_ne!(key, ComparisonKey::of(other));
        }
    }

    #[test]
    fn duplicates_count_as_a_multiset() {
        let once = snapshot(&[(Category::Steam, "Portal", None)]);
        let twice = snapshot(&[
            (Category::Steam, "Portal", None),
            (Category::Steam, "Portal", None),
        ]);
        assert_ne!(ComparisonKey::of(&once), ComparisonKey::of(&twice));
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = snapshot(&[(Category::Steam, "ab", None), (Category::Steam, "c", None)]);
        let b = snapshot(&[(Category::Steam, "a", None), (Category::Steam, "bc", None)]);
        assert_ne!(ComparisonKey::of(&a), ComparisonKey::of(&b));
    }

    #[test]
    fn sub_second_end_changes_key() {
        let at = |millis| {
            let mut snapshot = Snapshot::empty();
            let end = DateTime::from_timestamp_millis(millis).unwrap();
            snapshot.push(Category::EpicNow, Offer::new("Game X").with_end(end));
            snapshot
        };
        assert_ne!(
            ComparisonKey::of(&at(1_736_467_200_000)),
            ComparisonKey::of(&at(1_736_467_200_500))
        );
    }

    #[test]
    fn separator_bytes_in_titles_cannot_merge_offers() {
        let forged = snapshot(&[(Category::Steam, "A\x1f\x1esteam\x1fB", None)]);
        let pair = snapshot(&[(Category::Steam, "A", None), (Category::Steam, "B", None)]);
        assert_ne!(ComparisonKey::of(&forged), ComparisonKey::of(&pair));
    }

    #[test]
    fn key_is_hex_sha256() {
        let key = ComparisonKey::of(&Snapshot::empty());
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_store_always_archives() {
        let store = MemoryStore::default();
        let (changed, _) = should_archive(&Snapshot::empty(), &store).unwrap();
        assert!(changed);
    }

    #[test]
    fn detector_is_stateless() {
        let store = MemoryStore::default();
        let s = snapshot(&[(Category::Steam, "Portal", None)]);

        let first = should_archive(&s, &store).unwrap();
        let second = should_archive(&s, &store).unwrap();
        assert_eq!(first, second);
        assert!(first.0);
    }

    #[test]
    fn emptied_snapshot_is_a_change() {
        let mut store = MemoryStore::default();
        let s = snapshot(&[(Category::EpicNow, "Game X", Some("2025-01-10T00:00:00Z"))]);
        store.append(record(&s)).unwrap();

        assert!(!should_archive(&s, &store).unwrap().0);
        assert!(should_archive(&Snapshot::empty(), &store).unwrap().0);
    }
}
