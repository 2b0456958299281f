//! Reads raw platform dumps written by the external scrapers.
//!
//! Each scraper writes its result to `<output_dir>/<PLATFORM>.json`; this
//! fetcher picks that file up so the archive run never touches the network.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::FetchError;
use crate::platform::Platform;
use super::fetcher::{Fetcher, RawFetch};

pub struct JsonFileFetcher {
    platform: Platform,
    path: PathBuf,
}

impl JsonFileFetcher {
    pub fn new(platform: Platform, path: impl Into<PathBuf>) -> Self {
        JsonFileFetcher {
            platform,
            path: path.into(),
        }
    }
}

impl Fetcher for JsonFileFetcher {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn fetch(&self) -> Result<RawFetch, FetchError> {
        let text = fs::read_to_string(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })?;

        let payload = serde_json::from_str(&text).map_err(|source| FetchError::Parse {
            path: self.path.clone(),
            source,
        })?;

        debug!(platform = %self.platform, path = %self.path.display(), "loaded raw dump");
        Ok(RawFetch::new(self.platform, payload))
    }
}
