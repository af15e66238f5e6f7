// ABOUTME: Fetcher boundary: retrieves a catalog page body over HTTP with a blocking client.
// ABOUTME: Also owns charset handling so raw bytes can be decoded before parsing.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::ScrapeError;

/// Default maximum allowed body length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching a resource.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: HashMap<String, String>,
    pub max_content_length: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: crate::options::DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            headers: HashMap::new(),
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }
}

/// Result of a successful fetch: the complete response body plus metadata.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as text, using charset hints from the content-type header.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Anything that can turn a URL into a complete response body.
///
/// Implementations must either return the whole body or fail; partial
/// delivery is not modelled.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchResult, ScrapeError>;
}

/// Blocking HTTP fetcher backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    opts: FetchOptions,
}

impl HttpFetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new(opts: FetchOptions) -> Result<Self, ScrapeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&opts.user_agent)
            .timeout(opts.timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| {
                ScrapeError::config(
                    "http client",
                    "BuildClient",
                    Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                )
            })?;
        Ok(Self { client, opts })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        validate_url(url, "Fetch")?;

        let mut request = self.client.get(url);
        for (key, value) in &self.opts.headers {
            request = request.header(key, value);
        }

        debug!(url, "sending request");
        let response = request.send().map_err(|e| {
            ScrapeError::transport(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
        })?;

        let limit = self.opts.max_content_length;
        if let Some(len) = response.content_length() {
            if len as usize > limit {
                return Err(ScrapeError::transport(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large: {} bytes", len)),
                ));
            }
        }

        // Capture response metadata before consuming the response
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        if status != 200 {
            return Err(ScrapeError::transport(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status {}", status)),
            ));
        }

        let body = response.bytes().map_err(|e| {
            ScrapeError::transport(
                url,
                "Fetch",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        })?;

        if body.len() > limit {
            return Err(ScrapeError::transport(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large: {} bytes", body.len())),
            ));
        }

        info!(url, status, bytes = body.len(), "fetched page");

        Ok(FetchResult {
            status,
            url: url.to_string(),
            final_url,
            content_type,
            fetched_at: Utc::now(),
            body,
        })
    }
}

/// Check that a URL parses and uses an HTTP scheme.
pub fn validate_url(url: &str, op: &str) -> Result<url::Url, ScrapeError> {
    if url.is_empty() {
        return Err(ScrapeError::invalid_url(url, op, None));
    }

    let parsed = url::Url::parse(url).map_err(|e| {
        ScrapeError::invalid_url(url, op, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ScrapeError::invalid_url(
            url,
            op,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }
    Ok(parsed)
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}
