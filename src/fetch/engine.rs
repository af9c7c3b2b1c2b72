//! Bounded parallel fetcher.
//!
//! Every request runs in its own Tokio task, but a task only calls the
//! fetch primitive while holding a semaphore permit, so at most
//! `min(limit, requests)` fetches are in flight. The run waits for every
//! task before reporting; a failed request never stops its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::Fetcher;
use super::error::{AggregatedFetchError, FetchConfigError, FetchFailure, FetchOutcome};
use crate::download::DownloadError;

/// Minimum allowed concurrency value.
pub(crate) const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub(crate) const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Runs a set of source-to-destination fetches with bounded concurrency.
///
/// # Concurrency Model
///
/// - One Tokio task per request, spawned up front
/// - Each task acquires a permit before calling the fetcher (blocks while the pool is full)
/// - Permits are released automatically when the fetch returns (RAII)
/// - The semaphore is created per run and sized to `min(limit, requests)`
///
/// # Cancellation
///
/// The same `CancellationToken` is handed to every fetch. The fetcher is
/// responsible for noticing it; the run itself never aborts a task and
/// simply waits for each one to return.
#[derive(Debug, Clone, Copy)]
pub struct ParallelFetcher {
    limit: usize,
}

impl Default for ParallelFetcher {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CONCURRENCY,
        }
    }
}

impl ParallelFetcher {
    /// Creates a fetcher allowing at most `limit` concurrent fetches.
    ///
    /// # Errors
    ///
    /// Returns [`FetchConfigError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use utilkit::fetch::ParallelFetcher;
    ///
    /// let fetcher = ParallelFetcher::new(8).unwrap();
    /// assert_eq!(fetcher.limit(), 8);
    /// ```
    pub fn new(limit: usize) -> Result<Self, FetchConfigError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&limit) {
            return Err(FetchConfigError::InvalidConcurrency { value: limit });
        }
        Ok(Self { limit })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of permits a run over `request_count` requests uses.
    #[must_use]
    pub fn pool_size(&self, request_count: usize) -> usize {
        self.limit.min(request_count)
    }

    /// Fetches every `(source, destination)` pair in `requests`.
    ///
    /// Returns `Ok(())` immediately for an empty map without spawning
    /// anything. Otherwise waits until every request has been attempted
    /// exactly once and returns a single [`AggregatedFetchError`] if any of
    /// them failed.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatedFetchError`] listing every failed request with its
    /// source, destination and cause. A task that panics is reported as a
    /// failure of its own request.
    #[instrument(skip_all, fields(requests = requests.len(), limit = self.limit))]
    pub async fn run_all<F>(
        &self,
        cancel: &CancellationToken,
        requests: HashMap<String, String>,
        fetch_one: Arc<F>,
    ) -> Result<(), AggregatedFetchError>
    where
        F: Fetcher + ?Sized + 'static,
    {
        if requests.is_empty() {
            debug!("no files to download");
            return Ok(());
        }

        let pool_size = self.pool_size(requests.len());
        debug!(count = requests.len(), pool_size, "downloading files in parallel");

        let semaphore = Arc::new(Semaphore::new(pool_size));
        let mut tasks = JoinSet::new();
        let mut pairs_by_task = HashMap::with_capacity(requests.len());

        for (source, destination) in requests {
            let semaphore = Arc::clone(&semaphore);
            let fetch_one = Arc::clone(&fetch_one);
            let cancel = cancel.clone();
            let task_source = source.clone();
            let task_destination = destination.clone();

            let handle = tasks.spawn(async move {
                run_unit(&*fetch_one, &semaphore, &cancel, task_source, task_destination).await
            });
            pairs_by_task.insert(handle.id(), (source, destination));
        }

        let mut failures = Vec::new();
        let mut succeeded = 0usize;

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, FetchOutcome::Succeeded)) => {
                    pairs_by_task.remove(&id);
                    succeeded += 1;
                }
                Ok((id, FetchOutcome::Failed(failure))) => {
                    pairs_by_task.remove(&id);
                    warn!(
                        source = %failure.origin(),
                        destination = %failure.destination(),
                        error = %failure.cause(),
                        "download failed"
                    );
                    failures.push(failure);
                }
                Err(join_error) => {
                    let (source, destination) =
                        pairs_by_task.remove(&join_error.id()).unwrap_or_default();
                    warn!(
                        source = %source,
                        destination = %destination,
                        error = %join_error,
                        "download task panicked"
                    );
                    failures.push(FetchFailure::new(
                        source,
                        destination,
                        DownloadError::task_panicked(join_error.to_string()),
                    ));
                }
            }
        }

        info!(
            succeeded,
            failed = failures.len(),
            total = succeeded + failures.len(),
            "parallel download complete"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregatedFetchError::new(failures))
        }
    }
}

/// One work unit: wait for a slot, fetch, report.
async fn run_unit<F>(
    fetch_one: &F,
    semaphore: &Semaphore,
    cancel: &CancellationToken,
    source: String,
    destination: String,
) -> FetchOutcome
where
    F: Fetcher + ?Sized,
{
    // The semaphore is never closed while tasks hold a reference to it.
    let Ok(_permit) = semaphore.acquire().await else {
        return FetchOutcome::Failed(FetchFailure::new(
            source,
            destination,
            DownloadError::other("worker pool closed"),
        ));
    };

    debug!(source = %source, destination = %destination, "fetching");

    match fetch_one.fetch(cancel, &source, &destination).await {
        Ok(()) => FetchOutcome::Succeeded,
        Err(cause) => FetchOutcome::Failed(FetchFailure::new(source, destination, cause)),
    }
}
