//! In-flight request tracking for deduplication.
//!
//! Concurrent callers requesting the same key share one upstream call: the
//! first caller claims the in-flight slot, later callers wait until the
//! slot is released and then re-read the cache. Waiting uses a per-key
//! notifier rather than fixed-interval polling, bounded by a hard timeout.

use bridge_core::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Deduplication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeduplicationConfig {
    /// Hard cap on how long a caller waits for an in-flight duplicate
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Duration,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(10),
        }
    }
}

type Registry = Arc<Mutex<HashMap<String, Arc<Notify>>>>;

/// Tracks which cache keys currently have an upstream call in flight
pub struct RequestDeduplicator {
    config: DeduplicationConfig,
    registry: Registry,
}

/// Claim on the in-flight slot for one key
///
/// Dropping the guard releases the slot and wakes all waiters, so the
/// registry entry is removed however the upstream call resolves.
pub struct FlightGuard {
    key: String,
    registry: Registry,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let notify = self.registry.lock().remove(&self.key);
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }
}

impl RequestDeduplicator {
    /// Create a new deduplicator
    #[must_use]
    pub fn new(config: DeduplicationConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DeduplicationConfig::default())
    }

    /// Try to claim the in-flight slot for `key`
    ///
    /// Returns `None` if a call for this key is already outstanding, in
    /// which case the caller should [`wait`](Self::wait) and re-read the
    /// cache.
    #[must_use]
    pub fn begin(&self, key: &str) -> Option<FlightGuard> {
        let mut registry = self.registry.lock();
        if registry.contains_key(key) {
            return None;
        }
        registry.insert(key.to_string(), Arc::new(Notify::new()));
        debug!(key = %key, "Request marked in flight");
        Some(FlightGuard {
            key: key.to_string(),
            registry: Arc::clone(&self.registry),
        })
    }

    /// Whether a call for `key` is currently outstanding
    #[must_use]
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.registry.lock().contains_key(key)
    }

    /// Number of keys currently in flight
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Wait until the in-flight call for `key` resolves
    ///
    /// Returns immediately if nothing is in flight.
    ///
    /// # Errors
    /// Returns [`BridgeError::DeduplicationTimeout`] if the in-flight call
    /// does not resolve within the configured wait timeout.
    pub async fn wait(&self, key: &str) -> BridgeResult<()> {
        let notify = match self.registry.lock().get(key) {
            Some(notify) => Arc::clone(notify),
            None => return Ok(()),
        };

        let notified = notify.notified();
        tokio::pin!(notified);
        // Register interest before the re-check so a release between the
        // lookup above and the await below cannot be missed.
        notified.as_mut().enable();

        if !self.is_in_flight(key) {
            return Ok(());
        }

        debug!(key = %key, "Waiting for in-flight duplicate");
        match tokio::time::timeout(self.config.wait_timeout, notified).await {
            Ok(()) => Ok(()),
            Err(_) => Err(BridgeError::deduplication_timeout(
                key,
                self.config.wait_timeout,
            )),
        }
    }
}
