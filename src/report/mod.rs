pub mod table;
pub mod json;

use chrono::{NaiveDateTime, SecondsFormat};

use crate::store::TIMESTAMP_FORMAT;

/// `20250105123456` -> `2025-01-05 12:34:56 UTC`. Unparseable input is shown as-is.
pub fn display_timestamp(ts: &str) -> String {
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
        .map(|dt| format!("{} UTC", dt.format("%Y-%m-%d %H:%M:%S")))
        .unwrap_or_else(|_| ts.to_string())
}

fn display_end(end: Option<chrono::DateTime<chrono::Utc>>) -> String {
    end.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_display() {
        assert_eq!(display_timestamp("20250105123456"), "2025-01-05 12:34:56 UTC");
        assert_eq!(display_timestamp("garbage"), "garbage");
    }
}
