//! Utilkit Core Library
//!
//! Bounded parallel fetching plus the small helpers that usually travel with
//! it: mutual-TLS credential loading, random strings, URI assembly, file and
//! JSON conveniences.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Bounded-concurrency fan-out with aggregated failure reporting
//! - [`download`] - Streaming HTTP transfer of one URL to one file
//! - [`tls`] - Client certificate and CA pool loading
//! - [`random`] - Non-cryptographic random strings
//! - [`uri`] - URI building, path joining and query merging
//! - [`files`] - Base64 file encoding, existence checks, temp dirs
//! - [`json`] - Pretty JSON and value-to-reader conversion

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod fetch;
pub mod files;
pub mod json;
pub mod random;
pub mod tls;
pub mod uri;

// Re-export commonly used types
pub use download::{DownloadError, HttpClient};
pub use fetch::{
    AggregatedFetchError, DEFAULT_CONCURRENCY, FetchConfigError, FetchFailure, FetchOutcome,
    Fetcher, ParallelFetcher, download_files,
};
pub use tls::{ClientIdentity, ClientTls, TlsError, load_client_tls_from_base64, load_client_tls_from_files};
