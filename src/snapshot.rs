//! Canonical snapshot of what is currently free.
//!
//! One run's normalized view of all platforms, split into four categories.
//! Offer order inside a category is whatever upstream returned; nothing
//! downstream may depend on it (see `detect::ComparisonKey`).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EpicNow,
    EpicUpcoming,
    Steam,
    Psn,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::EpicNow,
        Category::EpicUpcoming,
        Category::Steam,
        Category::Psn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EpicNow => "epic_now",
            Category::EpicUpcoming => "epic_upcoming",
            Category::Steam => "steam",
            Category::Psn => "psn",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::EpicNow => "Epic (free now)",
            Category::EpicUpcoming => "Epic (upcoming)",
            Category::Steam => "Steam",
            Category::Psn => "PlayStation Plus",
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Category::EpicNow | Category::EpicUpcoming => Platform::Epic,
            Category::Steam => Platform::Steam,
            Category::Psn => Platform::Psn,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single free-game entry.
///
/// `title` is never empty and `end >= start` whenever both are present; the
/// normalizer drops anything that violates either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Offer {
    pub fn new(title: impl Into<String>) -> Self {
        Offer {
            title: title.into(),
            url: None,
            start: None,
            end: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Per-category offer counts, as shown on the history listing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub epic_now: usize,
    pub epic_upcoming: usize,
    pub steam: usize,
    pub psn: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub epic_now: Vec<Offer>,
    #[serde(default)]
    pub epic_upcoming: Vec<Offer>,
    #[serde(default)]
    pub steam: Vec<Offer>,
    #[serde(default)]
    pub psn: Vec<Offer>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot::default()
    }

    pub fn offers(&self, category: Category) -> &[Offer] {
        match category {
            Category::EpicNow => &self.epic_now,
            Category::EpicUpcoming => &self.epic_upcoming,
            Category::Steam => &self.steam,
            Category::Psn => &self.psn,
        }
    }

    pub fn offers_mut(&mut self, category: Category) -> &mut Vec<Offer> {
        match category {
            Category::EpicNow => &mut self.epic_now,
            Category::EpicUpcoming => &mut self.epic_upcoming,
            Category::Steam => &mut self.steam,
            Category::Psn => &mut self.psn,
        }
    }

    pub fn push(&mut self, category: Category, offer: Offer) {
        self.offers_mut(category).push(offer);
    }

    /// Every offer paired with its category, categories in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &Offer)> + '_ {
        Category::ALL
            .into_iter()
            .flat_map(move |cat| self.offers(cat).iter().map(move |offer| (cat, offer)))
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|cat| self.offers(*cat).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> Counts {
        Counts {
            epic_now: self.epic_now.len(),
            epic_upcoming: self.epic_upcoming.len(),
            steam: self.steam.len(),
            psn: self.psn.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_walks_categories_in_fixed_order() {
        let mut snapshot = Snapshot::empty();
        snapshot.push(Category::Psn, Offer::new("Astro Bot"));
        snapshot.push(Category::EpicNow, Offer::new("Game X"));
        snapshot.push(Category::Steam, Offer::new("Portal"));

        let cats: Vec<Category> = snapshot.iter().map(|(cat, _)| cat).collect();
        assert_eq!(cats, vec![Category::EpicNow, Category::Steam, Category::Psn]);
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn counts_follow_categories() {
        let mut snapshot = Snapshot::empty();
        snapshot.push(Category::EpicUpcoming, Offer::new("a"));
        snapshot.push(Category::EpicUpcoming, Offer::new("b"));
        snapshot.push(Category::Steam, Offer::new("c"));

        let counts = snapshot.counts();
        assert_eq!(counts.epic_now, 0);
        assert_eq!(counts.epic_upcoming, 2);
        assert_eq!(counts.steam, 1);
        assert_eq!(counts.psn, 0);
    }

    #[test]
    fn serializes_without_empty_extra() {
        let offer = Offer::new("Game X").with_url("https://store.epicgames.com/p/x");
        let json = serde_json::to_string(&offer).unwrap();
        assert!(!json.contains("extra"));

        let back: Offer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, offer);
    }

    #[test]
    fn category_maps_to_platform() {
        assert_eq!(Category::EpicNow.platform(), Platform::Epic);
        assert_eq!(Category::EpicUpcoming.platform(), Platform::Epic);
        assert_eq!(Category::Steam.platform(), Platform::Steam);
        assert_eq!(Category::Psn.platform(), Platform::Psn);
        assert_eq!(Category::EpicNow.to_string(), "epic_now");
    }
}
