use serde_json::Value;

use crate::error::FetchError;
use crate::platform::Platform;

/// Raw, already-parsed result of one platform fetch.
///
/// The payload keeps whatever shape the platform scraper produced; the
/// normalizer is the only place that interprets it.
#[derive(Debug, Clone)]
pub struct RawFetch {
    pub platform: Platform,
    pub payload: Value,
}

impl RawFetch {
    pub fn new(platform: Platform, payload: Value) -> Self {
        RawFetch { platform, payload }
    }

    /// Stand-in for a platform whose fetch failed. Contributes no offers.
    pub fn empty(platform: Platform) -> Self {
        let payload = match platform {
            Platform::Epic => serde_json::json!({ "now": [], "upcoming": [] }),
            Platform::Steam | Platform::Psn => Value::Array(Vec::new()),
        };
        RawFetch { platform, payload }
    }
}

pub trait Fetcher: Send + Sync {
    fn platform(&self) -> Platform;
    fn fetch(&self) -> Result<RawFetch, FetchError>;
}
