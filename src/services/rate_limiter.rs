//! Rate limiting and retry logic for external API calls
//!
//! Provides a rate-limited HTTP client for the search collaborator and a
//! bounded, fixed-delay retry loop used by the classifier.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use backoff::backoff::{Backoff, Constant};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{Client, Response};
use tracing::{debug, warn};

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst capacity (allows short bursts above the rate)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1,
            burst_size: 2,
        }
    }
}

/// A rate-limited HTTP client wrapper
pub struct RateLimitedClient {
    client: Client,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    name: String,
}

impl RateLimitedClient {
    /// Create a new rate-limited client
    pub fn new(name: &str, config: RateLimitConfig, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kapaladaru/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            limiter: Arc::new(RateLimiter::direct(quota)),
            name: name.to_string(),
        })
    }

    /// Client for DuckDuckGo HTML search, which throttles aggressive callers
    pub fn for_search() -> Result<Self> {
        Self::new("duckduckgo", RateLimitConfig::default(), Duration::from_secs(15))
    }

    /// Wait for rate limit and make a GET request with query parameters
    pub async fn get_with_query<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        query: &T,
    ) -> Result<Response> {
        self.wait_for_permit().await;
        debug!(client = %self.name, url = %url, "Making rate-limited GET request with query");

        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .context("HTTP request failed")
    }

    /// Wait for a rate limit permit
    pub async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
    }
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed wait between a failed attempt and the next one
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Create a constant backoff from this config
    pub fn to_backoff(&self) -> Constant {
        Constant::new(self.delay)
    }
}

/// Execute an async operation with bounded retries and a fixed delay.
///
/// The operation receives the 1-based attempt number. No delay follows the
/// final attempt; its error is returned as-is.
pub async fn retry_async<T, E, Fut, F>(
    operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> Result<T, E>
where
    F: Fn(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = 0;
    let mut backoff = config.to_backoff();

    loop {
        attempts += 1;
        match operation(attempts).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempts >= max_attempts {
                    warn!(
                        operation = %operation_name,
                        attempts = attempts,
                        error = %e,
                        "Operation failed after max attempts"
                    );
                    return Err(e);
                }

                match backoff.next_backoff() {
                    Some(duration) => {
                        warn!(
                            operation = %operation_name,
                            attempt = attempts,
                            error = %e,
                            retry_in_ms = duration.as_millis() as u64,
                            "Operation failed, retrying"
                        );
                        if !duration.is_zero() {
                            tokio::time::sleep(duration).await;
                        }
                    }
                    None => return Err(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_retries(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_constant_backoff_never_grows() {
        let mut backoff = RetryConfig::default().to_backoff();
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_async(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("boom".to_string()) }
            },
            &instant_retries(3),
            "test",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_first_success() {
        let result: Result<u32, String> = retry_async(
            |attempt| async move {
                if attempt < 2 {
                    Err("not yet".to_string())
                } else {
                    Ok(attempt)
                }
            },
            &instant_retries(3),
            "test",
        )
        .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), String> = retry_async(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("boom".to_string()) }
            },
            &instant_retries(0),
            "test",
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts_only() {
        let start = tokio::time::Instant::now();
        let result: Result<(), String> = retry_async(
            |_| async { Err("boom".to_string()) },
            &RetryConfig::default(),
            "test",
        )
        .await;

        assert!(result.is_err());
        // Two waits of 5s; nothing after the third attempt
        assert_eq!(start.elapsed().as_secs(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_success() {
        let start = tokio::time::Instant::now();
        let result: Result<u32, String> = retry_async(
            |attempt| async move {
                if attempt == 1 {
                    Err("not yet".to_string())
                } else {
                    Ok(attempt)
                }
            },
            &RetryConfig::default(),
            "test",
        )
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(start.elapsed().as_secs(), 5);
    }
}
