//! Bounded parallel fetching of many sources to many destinations.
//!
//! [`ParallelFetcher::run_all`] takes a map of source identifier to
//! destination identifier and a [`Fetcher`] that transfers one pair. It runs
//! up to `limit` fetches at once, attempts every request exactly once, and
//! folds every failure into a single [`AggregatedFetchError`].
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use utilkit::download::HttpClient;
//! use utilkit::fetch::ParallelFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let requests = HashMap::from([
//!     ("https://example.com/a.pdf".to_string(), "/tmp/a.pdf".to_string()),
//!     ("https://example.com/b.pdf".to_string(), "/tmp/b.pdf".to_string()),
//! ]);
//! let fetcher = ParallelFetcher::new(4)?;
//! fetcher
//!     .run_all(&CancellationToken::new(), requests, Arc::new(HttpClient::new()))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::download::{DownloadError, HttpClient};

pub use engine::{DEFAULT_CONCURRENCY, ParallelFetcher};
pub use error::{AggregatedFetchError, FetchConfigError, FetchFailure, FetchOutcome};

/// Transfers one source to one destination.
///
/// Implementations must return promptly once `cancel` is cancelled; the
/// parallel fetcher relies on that to finish a cancelled run.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs the transfer.
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        source: &str,
        destination: &str,
    ) -> Result<(), DownloadError>;
}

/// Downloads every URL in `urls_to_paths` to its target path over HTTP,
/// using [`DEFAULT_CONCURRENCY`] and a default [`HttpClient`].
///
/// # Errors
///
/// Returns [`AggregatedFetchError`] if any download failed.
pub async fn download_files(
    cancel: &CancellationToken,
    urls_to_paths: HashMap<String, String>,
) -> Result<(), AggregatedFetchError> {
    ParallelFetcher::default()
        .run_all(cancel, urls_to_paths, Arc::new(HttpClient::new()))
        .await
}
