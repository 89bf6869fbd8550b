//! Aggregated configuration for the bridge façade.
//!
//! Supplied once at construction and never re-read at runtime. The
//! embedding application typically deserializes this from its own config
//! file and hands it to [`UpstreamBridge::new`](crate::UpstreamBridge::new).

use bridge_cache::{CacheConfig, DeduplicationConfig};
use bridge_core::{BridgeError, BridgeResult};
use bridge_resilience::{CircuitBreakerConfig, RetryConfig};
use serde::Deserialize;

/// Configuration for one upstream bridge instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upstream service name, used in diagnostics and circuit-open errors
    pub service: String,
    /// Retry policy configuration
    pub retry: RetryConfig,
    /// Circuit breaker configuration
    pub circuit_breaker: CircuitBreakerConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Request deduplication configuration
    pub deduplication: DeduplicationConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            service: "upstream".to_string(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            deduplication: DeduplicationConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Create a configuration for the named upstream service
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Default::default()
        }
    }

    /// Set the retry configuration
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the circuit breaker configuration
    #[must_use]
    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    /// Set the cache configuration
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the deduplication configuration
    #[must_use]
    pub fn with_deduplication(mut self, deduplication: DeduplicationConfig) -> Self {
        self.deduplication = deduplication;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`BridgeError::Configuration`] for values that would make a
    /// component misbehave.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.service.is_empty() {
            return Err(BridgeError::configuration("service name must not be empty"));
        }
        if self.retry.multiplier <= 1.0 {
            return Err(BridgeError::configuration(
                "retry multiplier must be greater than 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(BridgeError::configuration(
                "retry jitter must be between 0 and 1",
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(BridgeError::configuration(
                "circuit breaker failure_threshold must be greater than 0",
            ));
        }
        self.cache.validate()?;
        Ok(())
    }
}
