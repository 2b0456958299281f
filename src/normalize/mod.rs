//! Snapshot normalization.
//!
//! Maps each platform's raw fetch result into the shared Offer schema:
//! - Epic: promotions split into "free now" and "upcoming"
//! - Steam and PSN: flat listings
//!
//! Malformed offers are dropped one at a time and reported back; they never
//! fail the whole run.

mod epic;
mod listing;
pub mod time;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::NormalizationError;
use crate::fetch::fetcher::RawFetch;
use crate::platform::Platform;
use crate::snapshot::{Category, Offer, Snapshot};

pub struct Normalized {
    pub snapshot: Snapshot,
    pub dropped: Vec<NormalizationError>,
}

impl Normalized {
    fn new(fetched_at: DateTime<Utc>) -> Self {
        Normalized {
            snapshot: Snapshot {
                fetched_at: Some(fetched_at),
                ..Snapshot::empty()
            },
            dropped: Vec::new(),
        }
    }

    fn accept(&mut self, category: Category, result: Result<Offer, NormalizationError>) {
        match result {
            Ok(offer) => self.snapshot.push(category, offer),
            Err(e) => self.reject(e),
        }
    }

    fn reject(&mut self, error: NormalizationError) {
        warn!(error = %error, "dropping offer");
        self.dropped.push(error);
    }
}

pub fn normalize(results: &[RawFetch], fetched_at: DateTime<Utc>) -> Normalized {
    let mut out = Normalized::new(fetched_at);

    for raw in results {
        match raw.platform {
            Platform::Epic => epic::normalize(&raw.payload, &mut out),
            Platform::Steam => listing::normalize(Category::Steam, &raw.payload, &mut out),
            Platform::Psn => listing::normalize(Category::Psn, &raw.payload, &mut out),
        }
    }

    info!(
        offers = out.snapshot.len(),
        dropped = out.dropped.len(),
        "normalized snapshot"
    );
    out
}

fn text(item: &Map<String, Value>, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Title, url and metadata shared by every platform. `reserved` lists the
/// fields the platform normalizer interprets itself; every other scalar on
/// the raw item is kept as offer metadata.
fn base_offer(
    platform: Platform,
    index: usize,
    item: &Value,
    reserved: &[&str],
) -> Result<Offer, NormalizationError> {
    let missing = || NormalizationError::MissingTitle { platform, index };

    let obj = item.as_object().ok_or_else(missing)?;
    let title = text(obj, "title").ok_or_else(missing)?;

    let mut offer = Offer::new(title);
    offer.url = text(obj, "link").or_else(|| text(obj, "url"));

    for (key, value) in obj {
        if reserved.contains(&key.as_str()) {
            continue;
        }
        if let Some(s) = scalar_to_string(value) {
            offer.extra.insert(key.clone(), s);
        }
    }

    Ok(offer)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // platform lists such as ["Windows", "macOS"]
        Value::Array(items) if !items.is_empty() => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn check_window(platform: Platform, offer: Offer) -> Result<Offer, NormalizationError> {
    match (offer.start, offer.end) {
        (Some(start), Some(end)) if end < start => Err(NormalizationError::InvertedWindow {
            platform,
            title: offer.title,
        }),
        _ => Ok(offer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-05T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn combines_all_platforms() {
        let results = vec![
            RawFetch::new(Platform::Epic, json!({
                "now": [{"title": "Game X", "freeEndAt": 1736467200000_i64}],
                "upcoming": [{"title": "Game Y"}]
            })),
            RawFetch::new(
                Platform::Steam,
                json!([{"title": "Portal", "link": "https://store.steampowered.com/app/400"}]),
            ),
            RawFetch::new(Platform::Psn, json!([{"title": "Astro Bot", "date": "本月有效"}])),
        ];

        let out = normalize(&results, at());
        let counts = out.snapshot.counts();
        assert_eq!((counts.epic_now, counts.epic_upcoming, counts.steam, counts.psn), (1, 1, 1, 1));
        assert_eq!(out.snapshot.fetched_at, Some(at()));
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn missing_title_drops_only_that_offer() {
        let results = vec![RawFetch::new(
            Platform::Steam,
            json!([{"title": "  "}, {"link": "https://x"}, {"title": "Portal"}, 42]),
        )];

        let out = normalize(&results, at());
        assert_eq!(out.snapshot.steam.len(), 1);
        assert_eq!(out.dropped.len(), 3);
        assert!(matches!(
            out.dropped[0],
            NormalizationError::MissingTitle { platform: Platform::Steam, index: 0 }
        ));
    }

    #[test]
    fn extra_metadata_is_stringified() {
        let results = vec![RawFetch::new(
            Platform::Steam,
            json!([{
                "title": "Portal",
                "link": "https://store.steampowered.com/app/400",
                "platforms": ["Windows", "macOS"],
                "discountText": "-100%",
                "image": null,
                "rating": 97
            }]),
        )];

        let out = normalize(&results, at());
        let offer = &out.snapshot.steam[0];
        assert_eq!(offer.url.as_deref(), Some("https://store.steampowered.com/app/400"));
        assert_eq!(offer.extra["platforms"], "Windows, macOS");
        assert_eq!(offer.extra["discountText"], "-100%");
        assert_eq!(offer.extra["rating"], "97");
        assert!(!offer.extra.contains_key("image"));
        assert!(!offer.extra.contains_key("link"));
    }
}
