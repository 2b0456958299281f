//! Platform fetch fan-out.
//!
//! Runs every fetcher on its own scoped thread and waits for all of them
//! before returning. A failed fetch is recorded and replaced by an empty
//! result so the rest of the run can proceed.

pub mod fetcher;
pub mod file;

use std::time::Instant;

use tracing::{info, warn};

use crate::error::FetchError;
use crate::platform::Platform;
use fetcher::{Fetcher, RawFetch};

pub struct FetchBatch {
    pub results: Vec<RawFetch>,
    pub failures: Vec<(Platform, FetchError)>,
    /// Wall time until the last fetcher joined.
    pub duration_ms: u64,
}

impl FetchBatch {
    pub fn empty() -> Self {
        FetchBatch {
            results: Vec::new(),
            failures: Vec::new(),
            duration_ms: 0,
        }
    }

    fn merge(&mut self, platform: Platform, outcome: Result<RawFetch, FetchError>) {
        match outcome {
            Ok(raw) => {
                info!(%platform, "fetch complete");
                self.results.push(raw);
            }
            Err(e) => {
                warn!(%platform, error = %e, "fetch failed, treating platform as empty");
                self.results.push(RawFetch::empty(platform));
                self.failures.push((platform, e));
            }
        }
    }
}

/// Fetch every platform concurrently. Returns once all fetchers have finished.
pub fn fetch_all(fetchers: &[Box<dyn Fetcher>]) -> FetchBatch {
    let start = Instant::now();
    let mut batch = FetchBatch::empty();

    let outcomes: Vec<(Platform, Result<RawFetch, FetchError>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = fetchers
            .iter()
            .map(|fetcher| (fetcher.platform(), scope.spawn(move || fetcher.fetch())))
            .collect();

        handles
            .into_iter()
            .map(|(platform, handle)| {
                let outcome = handle
                    .join()
                    .unwrap_or_else(|_| Err(FetchError::Panicked(platform)));
                (platform, outcome)
            })
            .collect()
    });

    for (platform, outcome) in outcomes {
        batch.merge(platform, outcome);
    }

    batch.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        duration_ms = batch.duration_ms,
        fetched = batch.results.len(),
        failed = batch.failures.len(),
        "all fetchers joined"
    );
    batch
}
