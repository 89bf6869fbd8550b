//! Retry policy with exponential backoff.
//!
//! Repeatedly invokes a caller-supplied operation until it succeeds,
//! exhausts its attempts, or fails with a non-retryable error.

use crate::backoff::BackoffPolicy;
use bridge_core::{BridgeError, BridgeResult};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration
///
/// Immutable after construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,
    /// Base delay between retries
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Maximum delay between retries
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Backoff multiplier (> 1)
    pub multiplier: f64,
    /// Jitter factor (0.0 - 1.0), applied as a multiplicative perturbation
    pub jitter: f64,
    /// HTTP status codes treated as transient
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.125,
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Backoff policy derived from this configuration
    #[must_use]
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.base_delay, self.max_delay, self.multiplier, self.jitter)
    }
}

/// Retry policy implementation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Check if an error is retryable under this policy
    ///
    /// Network-level failures are always retryable; upstream responses are
    /// retryable only if their status code is configured as transient. All
    /// other errors are terminal.
    #[must_use]
    pub fn is_retryable(&self, error: &BridgeError) -> bool {
        Self::is_retryable_with(&self.config, error)
    }

    fn is_retryable_with(config: &RetryConfig, error: &BridgeError) -> bool {
        if error.is_network() {
            return true;
        }
        match error.status_code() {
            Some(code) => config.retry_on_status.contains(&code),
            None => false,
        }
    }

    /// Execute an operation with retry logic
    ///
    /// `name` is a human-readable label used only for diagnostics.
    ///
    /// # Errors
    /// Returns the last observed error if all attempts are exhausted, or the
    /// first non-retryable error immediately.
    pub async fn execute<F, Fut, T>(&self, operation: F, name: &str) -> BridgeResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        self.execute_with_config(operation, name, &self.config).await
    }

    /// Execute with a per-call configuration override
    ///
    /// # Errors
    /// Same contract as [`execute`](Self::execute).
    pub async fn execute_with_config<F, Fut, T>(
        &self,
        operation: F,
        name: &str,
        config: &RetryConfig,
    ) -> BridgeResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        let backoff = config.backoff();
        let max_attempts = config.max_retries.saturating_add(1);
        let mut attempt = 1_u32;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = %name, attempt, "Upstream call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= max_attempts {
                        return Err(error);
                    }
                    if !Self::is_retryable_with(config, &error) {
                        return Err(error);
                    }

                    let delay = backoff.delay_for_attempt(attempt);
                    warn!(
                        operation = %name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying upstream call"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
