//! Bounded TTL cache with recency-based eviction.
//!
//! Entries expire at their deadline, the entry count is capped with strict
//! LRU eviction, and a secondary pass bounds the estimated memory footprint
//! by evicting the oldest quarter of entries. Eviction runs inline on every
//! write; there is no background sweep, so the memory bound is enforced
//! with a delay equal to the time between writes.

use bridge_core::{BridgeError, BridgeEvent, BridgeResult, EventBus, EvictionReason};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_size: usize,
    /// Maximum estimated memory footprint in bytes
    pub max_memory_bytes: u64,
    /// Estimated size of one entry in bytes
    pub per_entry_cost: u64,
    /// TTL applied when the caller does not supply one
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 500,
            max_memory_bytes: 32 * 1024 * 1024,
            per_entry_cost: 64 * 1024,
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`BridgeError::Configuration`] for zero-valued bounds.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.max_size == 0 {
            return Err(BridgeError::configuration("cache max_size must be greater than 0"));
        }
        if self.per_entry_cost == 0 {
            return Err(BridgeError::configuration(
                "cache per_entry_cost must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// One cached value with its expiry and recency bookkeeping
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
    last_accessed_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache statistics for administrative inspection
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of live entries
    pub size: usize,
    /// Keys of the live entries
    pub keys: Vec<String>,
    /// Read hits since construction
    pub hits: u64,
    /// Read misses since construction
    pub misses: u64,
    /// Entries evicted since construction (all reasons)
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of reads served from the cache
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded, TTL-based, recency-ordered store for completed results
pub struct AdaptiveCache<T> {
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    events: Option<EventBus>,
}

impl<T: Clone> AdaptiveCache<T> {
    /// Create a new cache
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            events: None,
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Attach an event bus that receives eviction notifications
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Get a value, bumping its recency
    ///
    /// A stale entry is treated as absent and removed on the spot; a value
    /// is never served at or past its expiry.
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed_at = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.note_evictions(EvictionReason::Expired, 1);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a value with the default TTL
    pub async fn set(&self, key: &str, value: T) {
        self.set_with_ttl(key, value, self.config.default_ttl).await;
    }

    /// Insert a value, then run the inline eviction chain
    ///
    /// Eviction order: expired sweep, strict LRU down to `max_size`, then a
    /// memory pass that drops the oldest 25% of remaining entries when the
    /// estimated footprint exceeds `max_memory_bytes`.
    pub async fn set_with_ttl(&self, key: &str, value: T, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_accessed_at: now,
            },
        );
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache entry stored");

        self.evict(&mut entries, now);
    }

    /// Remove a single entry
    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop all entries
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        debug!("Cache cleared");
    }

    /// Number of live entries, including any not yet swept expired ones
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Current statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            size: entries.len(),
            keys: entries.keys().cloned().collect(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn evict(&self, entries: &mut HashMap<String, CacheEntry<T>>, now: Instant) {
        // Pass 1: drop everything already expired
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let expired = before - entries.len();
        if expired > 0 {
            self.note_evictions(EvictionReason::Expired, expired);
        }

        // Pass 2: strict LRU down to the entry cap
        let mut lru_evicted = 0;
        while entries.len() > self.config.max_size {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                    lru_evicted += 1;
                }
                None => break,
            }
        }
        if lru_evicted > 0 {
            self.note_evictions(EvictionReason::Capacity, lru_evicted);
        }

        // Pass 3: memory bound, one shot per write
        let estimated = entries.len() as u64 * self.config.per_entry_cost;
        if estimated > self.config.max_memory_bytes {
            let drop_count = entries.len().div_ceil(4);
            let mut by_recency: Vec<(String, Instant)> = entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.last_accessed_at))
                .collect();
            by_recency.sort_by_key(|(_, accessed)| *accessed);

            for (key, _) in by_recency.into_iter().take(drop_count) {
                entries.remove(&key);
            }
            debug!(
                evicted = drop_count,
                estimated_bytes = estimated,
                "Cache memory bound exceeded, evicted oldest quarter"
            );
            self.note_evictions(EvictionReason::Memory, drop_count);
        }
    }

    fn note_evictions(&self, reason: EvictionReason, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
        if let Some(events) = &self.events {
            events.publish(BridgeEvent::CacheEvicted { reason, count });
        }
    }
}
