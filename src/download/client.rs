//! HTTP client wrapper for single-file transfers.
//!
//! This module provides the `HttpClient` struct which streams one URL to one
//! target path with timeout configuration, cooperative cancellation and
//! partial-file cleanup.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, ClientBuilder, StatusCode};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::fetch::Fetcher;
use crate::tls::{ClientTls, TlsError};

const USER_AGENT: &str = concat!("utilkit/", env!("CARGO_PKG_VERSION"));

/// HTTP client for downloading files with streaming support.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling. Cloning is cheap.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
/// use utilkit::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let cancel = CancellationToken::new();
/// client
///     .download_file(&cancel, "https://example.com/file.pdf", Path::new("./file.pdf"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Creates a client that presents the given client certificate and trusts
    /// only the loaded CA pool.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError`] if the rustls configuration cannot be built from
    /// the credential or the HTTP client fails to build.
    #[instrument(level = "debug", skip(tls))]
    pub fn with_tls(
        tls: &ClientTls,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, TlsError> {
        let config = tls.client_config()?;
        let client = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .use_preconfigured_tls(config)
            .build()
            .map_err(TlsError::client_build)?;
        debug!(roots = tls.root_count(), "built mutual TLS HTTP client");
        Ok(Self { client })
    }

    /// Downloads `url` into `target_path`, creating or truncating the file.
    ///
    /// Only a `200 OK` response is accepted. The transfer observes `cancel`
    /// while waiting for the response and between body chunks. If streaming
    /// fails part way, the partially written file is removed.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid or not http/https
    /// - The request fails (network error, timeout)
    /// - The server answers with anything but 200
    /// - Creating or writing the target file fails
    /// - `cancel` fires before the transfer completes
    #[instrument(skip(self, cancel), fields(url = %url, target = %target_path.display()))]
    pub async fn download_file(
        &self,
        cancel: &CancellationToken,
        url: &str,
        target_path: &Path,
    ) -> Result<(), DownloadError> {
        debug!("downloading file");

        let parsed_url =
            Url::parse(url).map_err(|_| DownloadError::invalid_url(url.to_string()))?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(DownloadError::unsupported_scheme(url, parsed_url.scheme()));
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            result = self.client.get(parsed_url).send() => result.map_err(|e| {
                if e.is_timeout() {
                    DownloadError::timeout(url)
                } else {
                    DownloadError::network(url, e)
                }
            })?,
        };

        if response.status() != StatusCode::OK {
            return Err(DownloadError::http_status(url, response.status().as_u16()));
        }

        let mut file = open_target(target_path).await?;

        debug!("writing file");
        let stream_result = stream_to_file(&mut file, response, cancel, url, target_path).await;

        match stream_result {
            Ok(bytes) => {
                info!(bytes, "download complete");
                Ok(())
            }
            Err(e) => {
                drop(file);
                debug!("cleaning up partial file after error");
                let _ = tokio::fs::remove_file(target_path).await;
                Err(e)
            }
        }
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        source: &str,
        destination: &str,
    ) -> Result<(), DownloadError> {
        self.download_file(cancel, source, Path::new(destination))
            .await
    }
}

fn base_client_builder(connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(USER_AGENT)
}

async fn open_target(target_path: &Path) -> Result<File, DownloadError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(super::constants::DEFAULT_FILE_MODE);

    options
        .open(target_path)
        .await
        .map_err(|e| DownloadError::io(target_path, e))
}

/// Streams the response body to `file`, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    cancel: &CancellationToken,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };

        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_file_success_writes_body() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/test.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PDF content here"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/test.pdf", mock_server.uri());
        let target = temp_dir.path().join("out.pdf");

        let result = client
            .download_file(&CancellationToken::new(), &url, &target)
            .await;

        assert!(result.is_ok(), "Expected Ok, got: {result:?}");
        assert_eq!(std::fs::read(&target).unwrap(), b"PDF content here");
    }

    #[tokio::test]
    async fn test_download_file_truncates_existing_target() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/short"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new"))
            .mount(&mock_server)
            .await;

        let target = temp_dir.path().join("existing.txt");
        std::fs::write(&target, b"much longer previous content").unwrap();

        let client = HttpClient::new();
        let url = format!("{}/short", mock_server.uri());
        client
            .download_file(&CancellationToken::new(), &url, &target)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_download_file_404_error() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/missing.pdf", mock_server.uri());
        let target = temp_dir.path().join("missing.pdf");

        let result = client
            .download_file(&CancellationToken::new(), &url, &target)
            .await;

        match result {
            Err(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!target.exists(), "no file should be created for error status");
    }

    #[tokio::test]
    async fn test_download_file_non_ok_success_status_is_rejected() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/accepted"))
            .respond_with(ResponseTemplate::new(202).set_body_bytes(b"queued"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/accepted", mock_server.uri());
        let result = client
            .download_file(&CancellationToken::new(), &url, &temp_dir.path().join("a"))
            .await;

        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 202, .. })
        ));
    }

    #[tokio::test]
    async fn test_download_file_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let client = HttpClient::new();

        let result = client
            .download_file(
                &CancellationToken::new(),
                "not-a-valid-url",
                &temp_dir.path().join("x"),
            )
            .await;

        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_download_file_unsupported_scheme() {
        let temp_dir = TempDir::new().unwrap();
        let client = HttpClient::new();

        let result = client
            .download_file(
                &CancellationToken::new(),
                "bad://z",
                &temp_dir.path().join("z"),
            )
            .await;

        match result {
            Err(DownloadError::UnsupportedScheme { scheme, .. }) => assert_eq!(scheme, "bad"),
            other => panic!("Expected UnsupportedScheme, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_file_missing_parent_dir_is_io_error() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = format!("{}/file", mock_server.uri());
        let target = temp_dir.path().join("no-such-dir").join("file");

        let result = client
            .download_file(&CancellationToken::new(), &url, &target)
            .await;

        assert!(matches!(result, Err(DownloadError::Io { .. })));
    }

    #[tokio::test]
    async fn test_download_file_already_cancelled_skips_request() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data"))
            .expect(0)
            .mount(&mock_server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let client = HttpClient::new();
        let url = format!("{}/file", mock_server.uri());
        let target = temp_dir.path().join("file");
        let result = client.download_file(&cancel, &url, &target).await;

        assert!(matches!(result, Err(DownloadError::Cancelled { .. })));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_download_file_cancel_while_waiting_for_response() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late")
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&mock_server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let client = HttpClient::new();
        let url = format!("{}/slow", mock_server.uri());
        let started = std::time::Instant::now();
        let result = client
            .download_file(&cancel, &url, &temp_dir.path().join("slow"))
            .await;

        assert!(matches!(result, Err(DownloadError::Cancelled { .. })));
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "cancellation should not wait for the delayed response"
        );
    }

    #[tokio::test]
    async fn test_http_client_implements_fetcher() {
        let mock_server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/via-trait"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"trait"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::default();
        let fetcher: &dyn Fetcher = &client;
        let url = format!("{}/via-trait", mock_server.uri());
        let target = temp_dir.path().join("via-trait");

        fetcher
            .fetch(&CancellationToken::new(), &url, target.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"trait");
    }
}
