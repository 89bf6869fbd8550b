//! # Bridge Resilience
//!
//! Resilience patterns for calls to the upstream service:
//! - Exponential backoff with jitter
//! - Retry policy for transient failures
//! - Circuit breaker for preventing cascading failures
//! - Resilient executor composing the two

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backoff;
pub mod circuit_breaker;
pub mod executor;
pub mod retry;

// Re-export main types
pub use backoff::BackoffPolicy;
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState,
};
pub use executor::ResilientExecutor;
pub use retry::{RetryConfig, RetryPolicy};
