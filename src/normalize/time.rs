//! Timestamp normalization.
//!
//! Upstream dates arrive as epoch milliseconds (Epic promotions API),
//! RFC 3339 strings, or Beijing-local wall clock strings such as
//! `2026/02/13 00:00:00` produced by the Epic scraper.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

const LOCAL_FORMATS: [&str; 3] = ["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M"];

/// Parse any supported upstream representation. Unparseable or blank values
/// yield `None`, which the normalizer stores as a missing timestamp.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_str(s),
        _ => None,
    }
}

pub fn parse_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let beijing = FixedOffset::east_opt(BEIJING_OFFSET_SECS)?;
    LOCAL_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(raw, fmt).ok()?;
        beijing
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    })
}
