//! HTTP single-file transfer primitive.
//!
//! This module provides the fetch primitive used by the
//! [`ParallelFetcher`](crate::fetch::ParallelFetcher): one URL streamed to one
//! local path.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Cooperative cancellation through a shared `CancellationToken`
//! - Optional mutual TLS using credentials from [`crate::tls`]
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//! use utilkit::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! client
//!     .download_file(&CancellationToken::new(), "https://example.com/paper.pdf", Path::new("paper.pdf"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::DownloadError;
