//! Façade composing deduplication, caching, and resilient execution.
//!
//! This is the single entry point the per-resource service wrappers call.
//! Write paths go through [`execute_with_resilience`]; read paths go
//! through [`cached_get`], which layers the deduplicator and the cache in
//! front of the same resilient executor.
//!
//! [`execute_with_resilience`]: UpstreamBridge::execute_with_resilience
//! [`cached_get`]: UpstreamBridge::cached_get

use crate::config::BridgeConfig;
use bridge_cache::{AdaptiveCache, CacheStats, RequestDeduplicator};
use bridge_core::{BridgeError, BridgeEvent, BridgeResult, EventBus};
use bridge_resilience::{CircuitBreaker, CircuitBreakerSnapshot, ResilientExecutor, RetryPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Resilient, caching client core for one upstream service
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct UpstreamBridge {
    executor: ResilientExecutor,
    cache: AdaptiveCache<Value>,
    dedup: RequestDeduplicator,
    events: EventBus,
    default_ttl: Duration,
}

impl UpstreamBridge {
    /// Create a bridge from an aggregated configuration
    ///
    /// # Errors
    /// Returns [`BridgeError::Configuration`] if the configuration is
    /// rejected by validation.
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::build(BridgeConfig::default())
    }

    fn build(config: BridgeConfig) -> Self {
        let BridgeConfig {
            service,
            retry,
            circuit_breaker,
            cache,
            deduplication,
        } = config;

        let events = EventBus::default();
        let breaker = CircuitBreaker::new(service, circuit_breaker).with_events(events.clone());
        let retry = RetryPolicy::new(retry);
        let default_ttl = cache.default_ttl;
        let cache = AdaptiveCache::new(cache).with_events(events.clone());
        let dedup = RequestDeduplicator::new(deduplication);

        Self {
            executor: ResilientExecutor::new(retry, breaker),
            cache,
            dedup,
            events,
            default_ttl,
        }
    }

    /// Execute an upstream operation with retry inside the circuit breaker
    ///
    /// `operation` performs exactly one upstream call per invocation and
    /// returns its parsed result; `name` is a human-readable label used
    /// only for diagnostics.
    ///
    /// # Errors
    /// A typed [`BridgeError`]: the operation's own failure, or a
    /// circuit-open rejection raised without contacting the upstream.
    pub async fn execute_with_resilience<F, Fut, T>(
        &self,
        operation: F,
        name: &str,
    ) -> BridgeResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        self.executor.execute_with_resilience(operation, name).await
    }

    /// Read-through cache with request deduplication
    ///
    /// `key` identifies the request (typically URL plus serialized
    /// parameters). A fresh cached value is returned without any upstream
    /// traffic. Otherwise the first caller claims the in-flight slot and
    /// fetches through the resilient executor, storing the result before
    /// the slot is released; concurrent callers for the same key wait for
    /// that call and read the now-populated cache. A waiter that finds the
    /// cache still empty after the slot clears (the fetch failed) claims
    /// the slot itself and issues a fresh call.
    ///
    /// # Errors
    /// The fetch's own [`BridgeError`], a circuit-open rejection, or a
    /// deduplication timeout when an in-flight call outlives the configured
    /// wait window.
    pub async fn cached_get<T, F, Fut>(
        &self,
        key: &str,
        name: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> BridgeResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        let ttl = ttl.unwrap_or(self.default_ttl);

        loop {
            if let Some(value) = self.cache.get(key).await {
                debug!(key = %key, "Cache hit");
                return serde_json::from_value(value)
                    .map_err(|e| BridgeError::parse(format!("cached value for '{key}': {e}")));
            }

            match self.dedup.begin(key) {
                Some(_guard) => {
                    let result = self.executor.execute_with_resilience(&fetch, name).await;
                    if let Ok(value) = &result {
                        match serde_json::to_value(value) {
                            Ok(json) => self.cache.set_with_ttl(key, json, ttl).await,
                            Err(e) => {
                                warn!(key = %key, error = %e, "Result not storable in cache")
                            }
                        }
                    }
                    // Guard drop releases the in-flight slot and wakes
                    // waiters whether the fetch succeeded or failed.
                    return result;
                }
                None => {
                    debug!(key = %key, "Duplicate request, waiting for in-flight call");
                    self.dedup.wait(key).await?;
                    // Re-read the cache; if the in-flight call stored
                    // nothing, the next iteration claims the slot and
                    // issues a fresh call.
                }
            }
        }
    }

    /// Snapshot of the circuit breaker
    #[must_use]
    pub fn circuit_state(&self) -> CircuitBreakerSnapshot {
        self.executor.circuit_state()
    }

    /// Force the circuit breaker back to Closed
    pub fn reset_circuit(&self) {
        self.executor.reset_circuit();
    }

    /// Drop all cached entries
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Current cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Subscribe to circuit and cache events
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }
}
