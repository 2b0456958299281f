//! Epic promotions.
//!
//! Two raw shapes are accepted:
//! - `{"now": [...], "upcoming": [...]}` with epoch-millisecond windows
//! - a flat list where each item carries `status` (ACTIVE / UPCOMING) and a
//!   single `date`: the end of the window for ACTIVE, the start for UPCOMING

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::error::NormalizationError;
use crate::platform::Platform;
use crate::snapshot::{Category, Offer};
use super::time::parse_timestamp;
use super::{base_offer, check_window, Normalized};

const INTERPRETED: [&str; 10] = [
    "title",
    "link",
    "url",
    "status",
    "date",
    "isFreeNow",
    "freeStartAt",
    "freeEndAt",
    "startDate",
    "endDate",
];

pub(super) fn normalize(payload: &Value, out: &mut Normalized) {
    let mut seen = HashSet::new();

    match payload {
        Value::Object(obj) if obj.contains_key("now") || obj.contains_key("upcoming") => {
            let sections = [("now", Category::EpicNow), ("upcoming", Category::EpicUpcoming)];
            for (key, category) in sections {
                let items = obj
                    .get(key)
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for (index, item) in items.iter().enumerate() {
                    let result = split_offer(index, item);
                    accept_unique(out, &mut seen, category, result);
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                match flat_offer(index, item) {
                    Ok((category, offer)) => accept_unique(out, &mut seen, category, Ok(offer)),
                    Err(e) => out.reject(e),
                }
            }
        }
        _ => out.reject(NormalizationError::Shape {
            platform: Platform::Epic,
            reason: "expected {now, upcoming} or a list of offers".to_string(),
        }),
    }
}

/// The promotions feed lists some games more than once; keep the first.
fn accept_unique(
    out: &mut Normalized,
    seen: &mut HashSet<(Category, String)>,
    category: Category,
    result: Result<Offer, NormalizationError>,
) {
    if let Ok(offer) = &result {
        if !seen.insert((category, offer.title.clone())) {
            debug!(title = %offer.title, %category, "skipping duplicate epic offer");
            return;
        }
    }
    out.accept(category, result);
}

fn window_field(item: &Value, keys: [&str; 2]) -> Option<chrono::DateTime<chrono::Utc>> {
    keys.iter().find_map(|key| item.get(*key).and_then(parse_timestamp))
}

fn split_offer(index: usize, item: &Value) -> Result<Offer, NormalizationError> {
    let mut offer = base_offer(Platform::Epic, index, item, &INTERPRETED)?;
    offer.start = window_field(item, ["freeStartAt", "startDate"]);
    offer.end = window_field(item, ["freeEndAt", "endDate"]);
    check_window(Platform::Epic, offer)
}

fn flat_offer(index: usize, item: &Value) -> Result<(Category, Offer), NormalizationError> {
    let mut offer = base_offer(Platform::Epic, index, item, &INTERPRETED)?;
    offer.start = window_field(item, ["freeStartAt", "startDate"]);
    offer.end = window_field(item, ["freeEndAt", "endDate"]);

    let status = item.get("status").and_then(Value::as_str).unwrap_or_default();
    let free_now = item.get("isFreeNow").and_then(Value::as_bool);
    let date = item.get("date").and_then(parse_timestamp);

    let category = match (status, free_now) {
        ("ACTIVE", _) | (_, Some(true)) => {
            offer.end = offer.end.or(date);
            Category::EpicNow
        }
        ("UPCOMING", _) | (_, Some(false)) => {
            offer.start = offer.start.or(date);
            Category::EpicUpcoming
        }
        _ => {
            return Err(NormalizationError::Shape {
                platform: Platform::Epic,
                reason: format!("offer '{}' has unknown status '{status}'", offer.title),
            })
        }
    };

    Ok((category, check_window(Platform::Epic, offer)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn run(payload: Value) -> Normalized {
        let mut out = Normalized::new(Utc::now());
        normalize(&payload, &mut out);
        out
    }

    #[test]
    fn split_shape_uses_epoch_windows() {
        let out = run(json!({
            "now": [{
                "title": "Game X",
                "link": "https://store.epicgames.com/p/game-x",
                "freeStartAt": 1735862400000_i64,
                "freeEndAt": 1736467200000_i64,
                "isFreeNow": true,
                "originalPrice": "¥90.00"
            }],
            "upcoming": [{"title": "Game Y", "freeStartAt": 1736467200000_i64}]
        }));

        let now = &out.snapshot.epic_now[0];
        assert_eq!(now.start, Some(utc("2025-01-03T00:00:00Z")));
        assert_eq!(now.end, Some(utc("2025-01-10T00:00:00Z")));
        assert_eq!(now.extra["originalPrice"], "¥90.00");
        assert!(!now.extra.contains_key("isFreeNow"));

        let upcoming = &out.snapshot.epic_upcoming[0];
        assert_eq!(upcoming.start, Some(utc("2025-01-10T00:00:00Z")));
        assert_eq!(upcoming.end, None);
    }

    #[test]
    fn flat_shape_routes_by_status() {
        let out = run(json!([
            {"title": "Game X", "status": "ACTIVE", "date": "2025/01/10 08:00:00"},
            {"title": "Game Y", "status": "UPCOMING", "date": "2025/01/10 08:00:00"}
        ]));

        assert_eq!(out.snapshot.epic_now[0].end, Some(utc("2025-01-10T00:00:00Z")));
        assert_eq!(out.snapshot.epic_now[0].start, None);
        assert_eq!(out.snapshot.epic_upcoming[0].start, Some(utc("2025-01-10T00:00:00Z")));
    }

    #[test]
    fn duplicates_within_category_are_skipped() {
        let out = run(json!([
            {"title": "Game X", "status": "ACTIVE"},
            {"title": "Game X", "status": "ACTIVE"},
            {"title": "Game X", "status": "UPCOMING"}
        ]));

        assert_eq!(out.snapshot.epic_now.len(), 1);
        assert_eq!(out.snapshot.epic_upcoming.len(), 1);
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn unknown_status_is_dropped() {
        let out = run(json!([{"title": "Game Z", "status": "EXPIRED"}]));
        assert!(out.snapshot.is_empty());
        assert!(matches!(out.dropped[0], NormalizationError::Shape { .. }));
    }

    #[test]
    fn scalar_payload_is_shape_error() {
        let out = run(json!("maintenance"));
        assert_eq!(out.dropped.len(), 1);
    }
}
