//! Reel list from the widget REST API.
//!
//! `GET {base}/api/v1/widgets[?site=..]` once per session. Failed requests
//! are retried with a linear backoff (`attempt * delay`), except auth
//! failures (401/403) which will not fix themselves.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client;

use super::{ReelItem, ReelSource, parse_reels};

const API_VERSION: &str = "v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Whether failed attempt number `attempt` (1-based) should be retried.
    /// `status` is `None` for transport errors.
    pub fn should_retry(&self, attempt: u32, status: Option<StatusCode>) -> bool {
        if matches!(status, Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)) {
            return false;
        }
        attempt <= self.max_retries
    }

    /// Delay before retrying failed attempt `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

#[derive(Debug, Clone)]
pub struct HttpReelSource {
    client: Client,
    base_url: String,
    site: Option<String>,
    retry: RetryPolicy,
}

impl HttpReelSource {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            site: None,
            retry,
        })
    }

    /// Storefront the widget is embedded in
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn url(&self) -> String {
        format!("{}/api/{}/widgets", self.base_url, API_VERSION)
    }

    fn fetch_once(&self) -> std::result::Result<String, (Option<StatusCode>, anyhow::Error)> {
        let mut req = self.client.get(self.url());
        if let Some(site) = &self.site {
            req = req.query(&[("site", site.as_str())]);
        }
        let resp = req.send().map_err(|e| (e.status(), anyhow!(e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err((Some(status), anyhow!("HTTP {} from {}", status, self.url())));
        }
        resp.text().map_err(|e| (Some(status), anyhow!(e)))
    }
}

impl ReelSource for HttpReelSource {
    fn fetch(&self) -> Result<Vec<ReelItem>> {
        let mut attempt = 1;
        loop {
            match self.fetch_once() {
                Ok(body) => {
                    let items = parse_reels(&body)?;
                    info!("Fetched {} reels from {}", items.len(), self.url());
                    return Ok(items);
                }
                Err((status, err)) => {
                    if !self.retry.should_retry(attempt, status) {
                        return Err(err.context(format!(
                            "Reel fetch failed after {} attempt(s)",
                            attempt
                        )));
                    }
                    let delay = self.retry.delay(attempt);
                    warn!("Reel fetch attempt {} failed: {} (retry in {:?})", attempt, err, delay);
                    thread::sleep(delay);
                    attempt += 1;
                    debug!("Reel fetch attempt {}", attempt);
                }
            }
        }
    }

    fn describe(&self) -> String {
        format!("api {}", self.url())
    }
}
