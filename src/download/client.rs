//! HTTP client for fetching images into a staging directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::{choose_extension, resolve_unique_path, sanitize_filename};
use crate::http::{ClientTimeouts, build_client};

/// A fetched image sitting in the staging directory.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub path: PathBuf,
    pub bytes: u64,
    pub content_type: Option<String>,
}

/// HTTP client for streaming image downloads.
///
/// Create once and reuse for a whole batch to share the connection pool.
///
/// # Example
///
/// ```no_run
/// use linkgrab_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let fetched = client
///     .fetch_to_file("https://sns-webpic-qc.xhscdn.com/img2.jpg", Path::new("./staging"), "note_01")
///     .await?;
/// println!("{} bytes", fetched.bytes);
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
    /// Creates a client with the default timeouts (30 s connect, 5 min read).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied timeouts.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = build_client(ClientTimeouts {
            connect: Some(Duration::from_secs(connect_timeout_secs)),
            total: Some(Duration::from_secs(read_timeout_secs)),
        })
        .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Streams `url` into `staging_dir` as `{file_stem}.{ext}`.
    ///
    /// The extension comes from the Content-Type header, then the URL, then
    /// defaults to `jpg`. A partial file is removed when streaming fails.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] for a malformed or non-http(s) URL
    /// - [`DownloadError::Network`] / [`DownloadError::Timeout`] on transport failure
    /// - [`DownloadError::HttpStatus`] for any non-2xx response
    /// - [`DownloadError::Io`] when the staging file cannot be written
    #[instrument(skip(self, staging_dir), fields(url = %url))]
    pub async fn fetch_to_file(
        &self,
        url: &str,
        staging_dir: &Path,
        file_stem: &str,
    ) -> Result<FetchedFile, DownloadError> {
        let parsed_url = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed_url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let extension = choose_extension(content_type.as_deref(), &parsed_url);

        tokio::fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| DownloadError::io(staging_dir, e))?;
        let file_name = format!("{}.{extension}", sanitize_filename(file_stem));
        let file_path = resolve_unique_path(staging_dir, &file_name);
        debug!(path = %file_path.display(), "resolved staging path");

        let mut file = File::create(&file_path)
            .await
            .map_err(|e| DownloadError::io(file_path.clone(), e))?;

        let stream_result = stream_to_file(&mut file, response, url, &file_path).await;
        if stream_result.is_err() {
            debug!(path = %file_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&file_path).await;
        }
        let bytes = stream_result?;

        info!(path = %file_path.display(), bytes, "image fetched");
        Ok(FetchedFile {
            path: file_path,
            bytes,
            content_type,
        })
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::transport(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
