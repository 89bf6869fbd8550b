//! Resilient executor composing the circuit breaker around retry execution.
//!
//! The breaker wraps the whole retry sequence, so a call that succeeds on
//! its third retry counts as one success to the breaker. Only a sequence
//! that exhausts its retries (or fails terminally) counts as one failure.

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerSnapshot};
use crate::retry::RetryPolicy;
use bridge_core::BridgeResult;
use std::future::Future;

/// Façade the rest of the system calls to reach the upstream
pub struct ResilientExecutor {
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl ResilientExecutor {
    /// Create a new executor from its two components
    #[must_use]
    pub fn new(retry: RetryPolicy, breaker: CircuitBreaker) -> Self {
        Self { retry, breaker }
    }

    /// Create with default retry and breaker configuration
    #[must_use]
    pub fn with_defaults(service: impl Into<String>) -> Self {
        Self::new(
            RetryPolicy::with_defaults(),
            CircuitBreaker::with_defaults(service),
        )
    }

    /// Execute an operation with retry inside the circuit breaker
    ///
    /// `operation` performs exactly one upstream call per invocation; `name`
    /// is a human-readable label used only for diagnostics.
    ///
    /// # Errors
    /// Returns [`bridge_core::BridgeError::CircuitOpen`] without invoking
    /// the operation when the breaker rejects the call; otherwise the retry
    /// executor's outcome.
    pub async fn execute_with_resilience<F, Fut, T>(
        &self,
        operation: F,
        name: &str,
    ) -> BridgeResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        self.breaker.check()?;
        match self.retry.execute(operation, name).await {
            Ok(value) => {
                self.breaker.record_success();
                Ok(value)
            }
            Err(error) => {
                self.breaker.record_failure();
                Err(error)
            }
        }
    }

    /// Snapshot of the breaker for administrative inspection
    #[must_use]
    pub fn circuit_state(&self) -> CircuitBreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Force the breaker back to Closed
    pub fn reset_circuit(&self) {
        self.breaker.reset();
    }

    /// Access the retry policy
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Access the circuit breaker
    #[must_use]
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}
