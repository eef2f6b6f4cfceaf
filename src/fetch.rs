//! Upstream playlist fetching.
//!
//! The engine talks to origins through the [`ManifestFetcher`] trait so
//! tests can stub upstreams without a network. The HTTP implementation
//! retries once with a short backoff; the transformation engine above it
//! never retries.

use crate::error::{ReliveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Total number of fetch attempts (1 initial + 1 retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Backoff between attempts in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 500;

/// Fetches an absolute URL and returns the playlist body text.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Per-attempt retry settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts (minimum 1; 0 is treated as 1).
    pub max_attempts: u32,
    /// Sleep between consecutive attempts.
    pub backoff: Duration,
    /// Applied to each individual attempt.
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            retry: RetryConfig {
                timeout,
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl ManifestFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_err: Option<ReliveError> = None;

        for attempt in 1..=max_attempts {
            match self
                .client
                .get(url)
                .timeout(self.retry.timeout)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    let body = response.text().await.map_err(ReliveError::from)?;
                    return validate_body(url, body);
                }
                Ok(response) => {
                    let status = response.status();
                    warn!(
                        "upstream returned {} for {} (attempt {}/{})",
                        status, url, attempt, max_attempts
                    );
                    last_err = Some(ReliveError::upstream(
                        status.as_u16().to_string(),
                        format!("upstream returned {status} for {url}"),
                    ));
                }
                Err(e) => {
                    warn!(
                        "upstream fetch failed for {} (attempt {}/{}): {}",
                        url, attempt, max_attempts, e
                    );
                    last_err = Some(e.into());
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.retry.backoff).await;
            }
        }

        Err(last_err
            .unwrap_or_else(|| ReliveError::upstream("error", format!("fetch failed for {url}"))))
    }
}

/// A body is only a playlist if it carries the `#EXTM3U` sentinel.
fn validate_body(url: &str, body: String) -> Result<String> {
    if body.contains("#EXTM3U") {
        Ok(body)
    } else {
        Err(ReliveError::upstream(
            "error",
            format!("body from {url} is not an HLS playlist"),
        ))
    }
}
