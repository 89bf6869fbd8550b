//! Resilience integration tests
//!
//! The composed retry + circuit breaker behavior: backoff pacing against
//! a flaky upstream and instant rejection while the circuit is open.

use crate::helpers::*;
use bridge_core::{BridgeError, BridgeResult};
use bridge_resilience::CircuitState;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An operation failing with 503 three times then succeeding completes
/// with three backoff delays and returns the success value.
#[tokio::test]
async fn test_retry_scenario_three_503s_then_success() {
    init_tracing();
    let bridge = test_bridge(3, 10);
    let upstream = FlakyUpstream::new(3, 503);

    // base 5ms, multiplier 2: expected delays ~5ms, ~10ms, ~20ms
    let started = Instant::now();
    let result: Resource = bridge
        .execute_with_resilience(
            || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.call("abc").await }
            },
            "get_dashboard",
        )
        .await
        .expect("succeeds on the fourth attempt");
    let elapsed = started.elapsed();

    assert_eq!(result, resource("abc"));
    assert_eq!(upstream.calls(), 4);
    assert!(elapsed >= Duration::from_millis(35), "three delays summed: {elapsed:?}");
    // A successful sequence is one success to the breaker
    assert_eq!(bridge.circuit_state().failure_count, 0);
}

/// Exhausted retries propagate the last upstream error.
#[tokio::test]
async fn test_retry_exhaustion_propagates_last_error() {
    init_tracing();
    let bridge = test_bridge(2, 10);
    let upstream = FlakyUpstream::always_failing(502);

    let result: BridgeResult<Resource> = bridge
        .execute_with_resilience(
            || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.call("abc").await }
            },
            "get_dashboard",
        )
        .await;

    assert!(matches!(result, Err(BridgeError::Upstream { status_code: 502, .. })));
    assert_eq!(upstream.calls(), 3);
}

/// A terminal client error is never retried.
#[tokio::test]
async fn test_client_error_not_retried() {
    init_tracing();
    let bridge = test_bridge(3, 10);
    let upstream = FlakyUpstream::always_failing(404);

    let result: BridgeResult<Resource> = bridge
        .execute_with_resilience(
            || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.call("abc").await }
            },
            "get_dashboard",
        )
        .await;

    assert!(result.is_err());
    assert_eq!(upstream.calls(), 1);
}

/// Five consecutive 500-level failures open the circuit; the sixth call
/// fails instantly with a circuit-open error and no network attempt.
#[tokio::test]
async fn test_breaker_scenario_five_failures_then_instant_rejection() {
    init_tracing();
    let bridge = test_bridge(0, 5);
    let upstream = FlakyUpstream::always_failing(500);

    for _ in 0..5 {
        let result: BridgeResult<Resource> = bridge
            .execute_with_resilience(
                || {
                    let upstream = Arc::clone(&upstream);
                    async move { upstream.call("abc").await }
                },
                "get_dashboard",
            )
            .await;
        assert!(matches!(result, Err(BridgeError::Upstream { .. })));
    }
    assert_eq!(bridge.circuit_state().state, CircuitState::Open);
    assert_eq!(upstream.calls(), 5);

    let started = Instant::now();
    let result: BridgeResult<Resource> = bridge
        .execute_with_resilience(
            || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.call("abc").await }
            },
            "get_dashboard",
        )
        .await;

    assert!(matches!(result, Err(BridgeError::CircuitOpen { .. })));
    assert_eq!(upstream.calls(), 5, "no network attempt while open");
    assert!(started.elapsed() < Duration::from_millis(10), "rejection is instant");
}

/// After the cooldown a probe is admitted; its success closes the circuit.
#[tokio::test]
async fn test_breaker_recovers_through_half_open() {
    init_tracing();
    let bridge = test_bridge(0, 2);
    // Two failures to trip, then healthy
    let upstream = FlakyUpstream::new(2, 500);

    for _ in 0..2 {
        let _: BridgeResult<Resource> = bridge
            .execute_with_resilience(
                || {
                    let upstream = Arc::clone(&upstream);
                    async move { upstream.call("abc").await }
                },
                "get_dashboard",
            )
            .await;
    }
    assert_eq!(bridge.circuit_state().state, CircuitState::Open);

    // test_bridge cooldown is 50ms
    tokio::time::sleep(Duration::from_millis(80)).await;

    let result: Resource = bridge
        .execute_with_resilience(
            || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.call("abc").await }
            },
            "get_dashboard",
        )
        .await
        .expect("probe succeeds");

    assert_eq!(result, resource("abc"));
    let snapshot = bridge.circuit_state();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failure_count, 0);
}
