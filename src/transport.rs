use crate::error::{Result, VastError};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::path::Path;
use std::time::{Duration, Instant};
use url::Url;

/// Default per-request timeout for remote tags
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the raw body of a VAST tag.
///
/// Every failure to retrieve the tag, including timeouts, must be reported
/// as [`VastError::Http`] so the loader surfaces it like any other fetch
/// error. A body that was retrieved but is not UTF-8 is `Malformed`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<String>;
}

/// Fetches tags over HTTP(S), from `file://` URIs, or from local paths
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VastError::InvalidOptions(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    async fn fetch_remote(&self, uri: &str, url: Url) -> Result<String> {
        // Random request ID for tracking in logs
        let req_id: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        log::debug!("[{}] Fetching from URL: {}", req_id, url);
        let start_time = Instant::now();

        // Fetch content from URL with timeout
        let response = self.client.get(url).send().await.map_err(|e| {
            log::debug!("[{}] Request failed after {:?}", req_id, start_time.elapsed());
            if e.is_timeout() {
                VastError::http(uri, None, format!("request timed out after {:?}", self.timeout))
            } else {
                VastError::http(uri, e.status().map(|s| s.as_u16()), e.to_string())
            }
        })?;

        let status = response.status();
        log::debug!("[{}] Received {} in {:?}", req_id, status, start_time.elapsed());

        // Anything but 2xx fails the fetch, keeping the status for observers
        if !status.is_success() {
            return Err(VastError::http(
                uri,
                Some(status.as_u16()),
                format!("HTTP status {}", status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VastError::http(uri, None, format!("Failed to read response body: {}", e)))?;

        log::debug!("[{}] Total request completed in {:?}", req_id, start_time.elapsed());

        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, uri: &str) -> Result<String> {
        match Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.fetch_remote(uri, url).await,
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| VastError::http(uri, None, "invalid file URI"))?;
                read_file(uri, &path).await
            }
            Ok(url) => Err(VastError::http(
                uri,
                None,
                format!("unsupported URI scheme `{}`", url.scheme()),
            )),
            // No scheme at all: a plain local path
            Err(url::ParseError::RelativeUrlWithoutBase) => read_file(uri, Path::new(uri)).await,
            Err(e) => Err(VastError::http(uri, None, format!("invalid URI: {}", e))),
        }
    }
}

/// Whether `uri` is fetched over the network rather than from disk
pub fn is_remote(uri: &str) -> bool {
    Url::parse(uri).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Refuse to follow a tag served over the network into the local
/// filesystem. Local tags may link anywhere.
pub fn check_origin(from: &str, to: &str) -> Result<()> {
    if is_remote(from) && !is_remote(to) {
        return Err(VastError::http(
            to,
            None,
            format!("refusing to follow local URI from remote tag {}", from),
        ));
    }
    Ok(())
}

async fn read_file(uri: &str, path: &Path) -> Result<String> {
    log::debug!("Reading from local file: {}", path.display());
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| VastError::http(uri, None, format!("Failed to read file: {}", e)))?;

    // Same error kind as an undecodable remote body would end up with
    String::from_utf8(bytes)
        .map_err(|e| VastError::Malformed(format!("{} is not valid UTF-8: {}", uri, e)))
}
