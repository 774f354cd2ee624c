//! HTTP collaborator with retry and exponential backoff.
//!
//! One [`Fetcher`] is built per run from the configuration: it carries the
//! identifying user-agent, the `Accept-Language` preference, and the
//! per-request timeout. Non-success statuses are errors.
//!
//! # Retry Strategy
//!
//! Transient failures (timeouts, connection errors, 5xx statuses) are
//! retried with exponential backoff and jitter:
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```
//!
//! Client errors such as 404 fail immediately; retrying them only burns
//! the politeness budget.

use std::error::Error;
use std::time::{Duration, Instant};

use rand::{rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::config::HarvestConfig;

const MAX_RETRIES: usize = 2;
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// A configured HTTP client for feed, page, and AMP fetches.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build the client with the configured headers and timeout.
    pub fn new(config: &HarvestConfig) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)?,
        );
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a URL's body as text, retrying transient failures.
    #[instrument(level = "debug", skip(self), fields(%url))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(
                        bytes = body.len(),
                        elapsed_ms = attempt_t0.elapsed().as_millis() as u64,
                        "Fetched"
                    );
                    return Ok(body);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES || !is_transient(&e) {
                        return Err(e.into());
                    }

                    let mut delay = BASE_DELAY.saturating_mul(1 << (attempt - 1));
                    if delay > MAX_DELAY {
                        delay = MAX_DELAY;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = MAX_RETRIES,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "Fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    if e.is_timeout() || e.is_connect() {
        return true;
    }
    e.status().is_some_and(|status| status.is_server_error())
}
