//! Test helper utilities for integration tests

use bridge_client::{BridgeConfig, CircuitBreakerConfig, RetryConfig, UpstreamBridge};
use bridge_core::{BridgeError, BridgeResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// A value the mock upstream returns, shaped like a typical resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier
    pub uid: String,
    /// Display title
    pub title: String,
}

/// A canonical test resource
pub fn resource(uid: &str) -> Resource {
    Resource {
        uid: uid.to_string(),
        title: format!("resource {uid}"),
    }
}

/// Mock upstream that fails a fixed number of times before succeeding
///
/// Counts invocations so tests can assert exactly how many calls reached
/// the "network".
pub struct FlakyUpstream {
    calls: AtomicU32,
    failures_before_success: u32,
    error_status: u16,
}

impl FlakyUpstream {
    /// Fail the first `failures_before_success` calls with `error_status`
    pub fn new(failures_before_success: u32, error_status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            failures_before_success,
            error_status,
        })
    }

    /// An upstream that always fails
    pub fn always_failing(error_status: u16) -> Arc<Self> {
        Self::new(u32::MAX, error_status)
    }

    /// Perform one mock upstream call
    pub async fn call(&self, uid: &str) -> BridgeResult<Resource> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures_before_success {
            Err(BridgeError::upstream(self.error_status, "mock upstream failure"))
        } else {
            Ok(resource(uid))
        }
    }

    /// Number of calls that reached this upstream
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Bridge with millisecond-scale timings suitable for tests
pub fn test_bridge(max_retries: u32, failure_threshold: u32) -> UpstreamBridge {
    let config = BridgeConfig::new("mock-upstream")
        .with_retry(RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(100),
            jitter: 0.0,
            ..Default::default()
        })
        .with_circuit_breaker(CircuitBreakerConfig {
            failure_threshold,
            cooldown: Duration::from_millis(50),
            ..Default::default()
        });
    UpstreamBridge::new(config).expect("test config is valid")
}
