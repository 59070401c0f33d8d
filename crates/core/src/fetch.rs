//! Page fetching over HTTP/HTTPS.
//!
//! One [`Fetcher`] is built per batch and issues a single GET per URL. There
//! is no retry and no response caching; redirects follow reqwest's default
//! policy.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::FetchFailure;
use crate::{PagesiftError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Browser-like identification, sent to avoid trivial bot blocking.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT_SECS, user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Response body decoded as text.
    pub body: String,
    /// URL after redirects; relative links resolve against it.
    pub final_url: Url,
    /// HTTP status code.
    pub status: u16,
}

/// Reusable HTTP client for one batch.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: u64,
}

impl Fetcher {
    /// Builds the underlying client with the configured timeout and User-Agent.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| PagesiftError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout: config.timeout })
    }

    /// Fetches a page and returns its body.
    ///
    /// Non-success statuses (anything outside 2xx) are reported as
    /// [`FetchFailure::Status`].
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed_url = parse_http_url(url)?;

        let response = self
            .client
            .get(parsed_url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| PagesiftError::fetch(url, self.classify(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PagesiftError::fetch(url, FetchFailure::Status { status: status.as_u16() }));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| PagesiftError::fetch(url, self.classify(e)))?;

        tracing::debug!(%final_url, status = status.as_u16(), bytes = body.len(), "fetched page");

        Ok(FetchedPage { body, final_url, status: status.as_u16() })
    }

    fn classify(&self, err: reqwest::Error) -> FetchFailure {
        if err.is_timeout() { FetchFailure::Timeout { timeout: self.timeout } } else { FetchFailure::Http(err) }
    }
}

/// Parses a URL and checks that it can be fetched over HTTP.
fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| PagesiftError::fetch(url, FetchFailure::InvalidUrl(e.to_string())))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(PagesiftError::fetch(
            url,
            FetchFailure::InvalidUrl(format!("unsupported scheme '{}'", other)),
        )),
    }
}
