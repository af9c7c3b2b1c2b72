//! Outcome and error types for parallel fetch runs.

use thiserror::Error;

use crate::download::DownloadError;

use super::engine::{MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Error returned when a [`ParallelFetcher`](super::ParallelFetcher) is misconfigured.
#[derive(Debug, Error)]
pub enum FetchConfigError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// One failed transfer with the pair it was fetching.
#[derive(Debug, Error)]
#[error("failed to download file from {origin} to {destination}: {cause}")]
pub struct FetchFailure {
    origin: String,
    destination: String,
    #[source]
    cause: DownloadError,
}

impl FetchFailure {
    /// Creates a failure record for the given pair.
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        cause: DownloadError,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            cause,
        }
    }

    /// Source identifier of the failed request.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Destination identifier of the failed request.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Underlying transfer error.
    #[must_use]
    pub fn cause(&self) -> &DownloadError {
        &self.cause
    }
}

/// Result of one work unit. Every request produces exactly one.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The fetch completed without error.
    Succeeded,
    /// The fetch returned an error or its task panicked.
    Failed(FetchFailure),
}

impl FetchOutcome {
    /// Returns true for [`FetchOutcome::Succeeded`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Every failure from one `run_all` call, reported as a single error.
///
/// The rendered message lists each failure separated by `"; "`, in the
/// order failures were observed. Use [`failures`](Self::failures) for
/// structured inspection.
#[derive(Debug, Error)]
#[error("could not download files: errors downloading files: {}", join_failures(.failures))]
pub struct AggregatedFetchError {
    failures: Vec<FetchFailure>,
}

impl AggregatedFetchError {
    pub(crate) fn new(failures: Vec<FetchFailure>) -> Self {
        Self { failures }
    }

    /// The individual failures, in observation order.
    #[must_use]
    pub fn failures(&self) -> &[FetchFailure] {
        &self.failures
    }

    /// Consumes the error and returns the failure records.
    #[must_use]
    pub fn into_failures(self) -> Vec<FetchFailure> {
        self.failures
    }

    /// Number of failed requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always false for errors produced by a run; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

fn join_failures(failures: &[FetchFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_display_includes_pair_and_cause() {
        let failure = FetchFailure::new("bad://z", "/tmp/z", DownloadError::other("unsupported scheme"));
        let msg = failure.to_string();
        assert!(msg.contains("bad://z"), "got: {msg}");
        assert!(msg.contains("/tmp/z"), "got: {msg}");
        assert!(msg.contains("unsupported scheme"), "got: {msg}");
    }

    #[test]
    fn test_fetch_failure_exposes_source_chain() {
        use std::error::Error as _;

        let failure = FetchFailure::new("http://a/x", "/tmp/x", DownloadError::timeout("http://a/x"));
        let source = failure.source().unwrap();
        assert!(source.to_string().contains("timeout"));
    }

    #[test]
    fn test_aggregated_error_joins_with_delimiter() {
        let error = AggregatedFetchError::new(vec![
            FetchFailure::new("http://a", "/tmp/a", DownloadError::other("timeout")),
            FetchFailure::new("http://b", "/tmp/b", DownloadError::other("refused")),
        ]);
        let msg = error.to_string();

        assert!(msg.starts_with("could not download files"), "got: {msg}");
        assert_eq!(msg.matches("; ").count(), 1, "got: {msg}");
        assert!(msg.contains("timeout") && msg.contains("refused"), "got: {msg}");
        assert_eq!(error.len(), 2);
        assert!(!error.is_empty());
    }

    #[test]
    fn test_fetch_config_error_display() {
        let error = FetchConfigError::InvalidConcurrency { value: 0 };
        let msg = error.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_fetch_outcome_is_success() {
        assert!(FetchOutcome::Succeeded.is_success());
        let failed = FetchOutcome::Failed(FetchFailure::new("a", "b", DownloadError::other("x")));
        assert!(!failed.is_success());
    }
}
