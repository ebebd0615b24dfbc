//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the harvester, including:
//! - Building the shared HTTP client (cookies, compression, redirects)
//! - Browser-like header profiles for listing pages and torrent files
//! - GET requests with bounded exponential-backoff retry
//! - HEAD probes that never fail, reporting status 0 instead

use crate::config::HttpConfig;
use crate::{FetchError, FetchResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;

/// Status codes retried at the transport level
const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// Whether an HTTP status is worth retrying
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for every later one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the zero-based `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }
}

/// Which set of request headers to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestProfile {
    /// Forum listing pages, sent as a same-origin navigation
    Page,

    /// Torrent file downloads from the file host
    Torrent,

    /// Reachability probes, user agent only
    Probe,
}

/// Builds the shared HTTP client
///
/// The client keeps cookies between requests, negotiates gzip/brotli on its
/// own and follows up to 10 redirects.
///
/// # Example
///
/// ```no_run
/// use forum_harvester::config::HttpConfig;
/// use forum_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP fetcher shared by every crawl worker
///
/// Cloning is cheap; all clones share one connection pool and cookie jar.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    timeout: Duration,
    referer: Option<HeaderValue>,
}

impl Fetcher {
    /// Creates a fetcher from the transport settings
    ///
    /// # Arguments
    ///
    /// * `config` - Transport settings (user agent, timeout, retry)
    /// * `referer` - Sent with listing page requests, usually the forum origin
    pub fn new(config: &HttpConfig, referer: Option<&str>) -> Result<Self, reqwest::Error> {
        let referer = referer.and_then(|value| match HeaderValue::from_str(value) {
            Ok(header) => Some(header),
            Err(_) => {
                tracing::warn!("Ignoring referer that is not a valid header: {}", value);
                None
            }
        });

        Ok(Self {
            client: build_http_client(config)?,
            retry: RetryPolicy::from(config),
            timeout: Duration::from_secs(config.timeout_secs),
            referer,
        })
    }

    /// Fetches a URL as text
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 500/502/503/504 | Retry with backoff |
    /// | Connect error / timeout | Retry with backoff |
    /// | Any other status | Fail immediately |
    pub async fn get_text(&self, url: &str, profile: RequestProfile) -> FetchResult<String> {
        let response = self.get_with_retry(url, profile).await?;
        response.text().await.map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })
    }

    /// Fetches a URL as raw bytes, with the same retry logic as [`Fetcher::get_text`]
    pub async fn get_bytes(&self, url: &str, profile: RequestProfile) -> FetchResult<Vec<u8>> {
        let response = self.get_with_retry(url, profile).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })
    }

    /// Sends a HEAD request and reports the final status code
    ///
    /// Redirects are followed. Any failure, including a timeout, is reported
    /// as status 0; there is no retry.
    pub async fn head_status(&self, url: &str, timeout: Duration) -> u16 {
        let url = url.trim();
        let request = self
            .client
            .head(url)
            .headers(self.headers_for(RequestProfile::Probe))
            .timeout(timeout);

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::debug!("URL {} returned status {}", url, status);
                status
            }
            Err(e) => {
                tracing::warn!("URL {} check failed: {}", url, e);
                0
            }
        }
    }

    /// Visits a URL once to pick up session cookies; failures are only logged
    pub async fn warm_up(&self, url: &str) {
        match self.get_once(url, RequestProfile::Page).await {
            Ok(_) => tracing::info!("Session initialized via {}", url),
            Err(e) => tracing::warn!("Session warm-up failed: {}", e),
        }
    }

    async fn get_with_retry(&self, url: &str, profile: RequestProfile) -> FetchResult<Response> {
        let mut attempt = 0;

        loop {
            match self.get_once(url, profile).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        "Transient failure ({}), attempt {}/{}, retrying in {:?}",
                        e,
                        attempt + 1,
                        self.retry.max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str, profile: RequestProfile) -> FetchResult<Response> {
        let response = self
            .client
            .get(url)
            .headers(self.headers_for(profile))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    fn headers_for(&self, profile: RequestProfile) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let fetch_site = match profile {
            RequestProfile::Probe => return headers,
            RequestProfile::Page => "same-origin",
            RequestProfile::Torrent => "none",
        };

        let navigation = [
            ("accept", ACCEPT_HTML),
            ("accept-language", "en,zh-CN;q=0.9,zh;q=0.8"),
            ("cache-control", "no-cache"),
            ("pragma", "no-cache"),
            ("sec-ch-ua", "\"Chromium\";v=\"135\", \"Not-A.Brand\";v=\"8\""),
            ("sec-ch-ua-mobile", "?0"),
            ("sec-ch-ua-platform", "\"macOS\""),
            ("sec-fetch-dest", "document"),
            ("sec-fetch-mode", "navigate"),
            ("sec-fetch-site", fetch_site),
            ("sec-fetch-user", "?1"),
            ("upgrade-insecure-requests", "1"),
            ("dnt", "1"),
        ];
        for (name, value) in navigation {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        match profile {
            RequestProfile::Page => {
                if let Some(referer) = &self.referer {
                    headers.insert(REFERER, referer.clone());
                }
            }
            RequestProfile::Torrent => {
                headers.insert(
                    HeaderName::from_static("priority"),
                    HeaderValue::from_static("u=0, i"),
                );
            }
            RequestProfile::Probe => {}
        }

        headers
    }
}
