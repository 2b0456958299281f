use serde_json::Value;

use crate::error::NormalizationError;
use crate::snapshot::Category;
use super::time::parse_timestamp;
use super::{base_offer, check_window, Normalized};

const INTERPRETED: [&str; 5] = ["title", "link", "url", "startDate", "endDate"];

/// Steam search results and PSN monthly games: a flat list of items.
pub(super) fn normalize(category: Category, payload: &Value, out: &mut Normalized) {
    let platform = category.platform();
    let Some(items) = payload.as_array() else {
        out.reject(NormalizationError::Shape {
            platform,
            reason: "expected a list of offers".to_string(),
        });
        return;
    };

    for (index, item) in items.iter().enumerate() {
        let result = base_offer(platform, index, item, &INTERPRETED).and_then(|mut offer| {
            offer.start = item.get("startDate").and_then(parse_timestamp);
            offer.end = item.get("endDate").and_then(parse_timestamp);
            check_window(platform, offer)
        });
        out.accept(category, result);
    }
}
