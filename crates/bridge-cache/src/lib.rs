//! # Bridge Cache
//!
//! Read-path building blocks for the upstream bridge:
//! - Bounded TTL cache with recency-based and memory-based eviction
//! - In-flight request deduplication so concurrent identical reads share
//!   one upstream call

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod dedup;

// Re-export main types
pub use cache::{AdaptiveCache, CacheConfig, CacheStats};
pub use dedup::{DeduplicationConfig, FlightGuard, RequestDeduplicator};
