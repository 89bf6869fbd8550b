//! # Bridge Client
//!
//! Façade over the upstream bridge: a resilience and caching layer that
//! sits between a tool-calling application and a remote HTTP API. Turns an
//! unreliable, rate-limited upstream into a predictable dependency by
//! bounding latency (circuit breaker), smoothing transient failures
//! (retry with jittered backoff), deduplicating concurrent identical reads,
//! and serving repeat reads from a bounded in-memory cache.
//!
//! Per-resource service wrappers call [`UpstreamBridge::execute_with_resilience`]
//! for writes and [`UpstreamBridge::cached_get`] for reads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod config;

// Re-export the full public surface so embedders depend on one crate
pub use bridge::UpstreamBridge;
pub use bridge_cache::{
    AdaptiveCache, CacheConfig, CacheStats, DeduplicationConfig, RequestDeduplicator,
};
pub use bridge_core::{BridgeError, BridgeEvent, BridgeResult, EventBus, EvictionReason};
pub use bridge_resilience::{
    BackoffPolicy, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState,
    ResilientExecutor, RetryConfig, RetryPolicy,
};
pub use config::BridgeConfig;
