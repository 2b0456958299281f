//! Terminal rendering for history records.
//!
//! - Listing: one row per record with per-category counts
//! - Single record: offers grouped by category
//! - Diff: added, removed and rescheduled offers between two records

use crate::snapshot::Category;
use crate::store::diff::{DiffResult, DiffType};
use crate::store::HistoryRecord;
use super::{display_end, display_timestamp};

pub fn render_history(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return String::from("No history records yet. Run 'freebies record' to create one.\n");
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<6} {:<24} {:>5} {:>5} {:>5} {:>5}  {}\n",
        "ID", "Archived", "Now", "Soon", "Steam", "PSN", "Image"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for record in records {
        let counts = record.raw_snapshot.counts();
        output.push_str(&format!(
            "{:<6} {:<24} {:>5} {:>5} {:>5} {:>5}  {}\n",
            record.id,
            display_timestamp(&record.timestamp),
            counts.epic_now,
            counts.epic_upcoming,
            counts.steam,
            counts.psn,
            record.image_reference
        ));
    }

    output
}

pub fn render_record(record: &HistoryRecord) -> String {
    let mut output = format!(
        "record #{} ({})\nkey:   {}\nimage: {}\n",
        record.id,
        display_timestamp(&record.timestamp),
        record.comparison_key,
        record.image_reference
    );

    for category in Category::ALL {
        let offers = record.raw_snapshot.offers(category);
        if offers.is_empty() {
            continue;
        }

        output.push_str(&format!("\n{}\n", category.label()));
        output.push_str(&"-".repeat(40));
        output.push('\n');

        for offer in offers {
            output.push_str(&format!(
                "  {:40} {}\n",
                truncate(&offer.title, 40),
                display_end(offer.end)
            ));
        }
    }

    if record.raw_snapshot.is_empty() {
        output.push_str("\nNo free games in this snapshot.\n");
    }

    output
}

pub fn render_diff(result: &DiffResult) -> String {
    let mut output = format!(
        "\nComparing records:\n  From: #{} ({})\n  To:   #{} ({})\n\n",
        result.from_id,
        display_timestamp(&result.from_timestamp),
        result.to_id,
        display_timestamp(&result.to_timestamp)
    );

    if result.entries.is_empty() {
        output.push_str("No changes detected.\n");
        return output;
    }

    for category in Category::ALL {
        let entries: Vec<_> = result.entries.iter().filter(|e| e.category == category).collect();
        if entries.is_empty() {
            continue;
        }

        output.push_str(&format!("{}:\n", category.label()));
        for entry in entries {
            let line = match entry.diff_type {
                DiffType::Added => {
                    format!("  [new] {} (until {})", entry.title, display_end(entry.new_end))
                }
                DiffType::Removed => format!("  [gone] {}", entry.title),
                DiffType::Rescheduled => format!(
                    "  [moved] {} {} -> {}",
                    entry.title,
                    display_end(entry.old_end),
                    display_end(entry.new_end)
                ),
            };
            output.push_str(&line);
            output.push('\n');
        }
        output.push('\n');
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
