//! Cache integration tests
//!
//! Read-through caching, TTL behavior, and administrative operations
//! exercised through the bridge façade.

use crate::helpers::*;
use std::sync::Arc;
use std::time::Duration;

/// Repeat reads are served from the cache without upstream traffic.
#[tokio::test]
async fn test_repeat_reads_hit_cache() {
    init_tracing();
    let bridge = test_bridge(0, 10);
    let upstream = FlakyUpstream::new(0, 500);

    for _ in 0..5 {
        let result: Resource = bridge
            .cached_get("dashboard:abc", "get_dashboard", None, || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.call("abc").await }
            })
            .await
            .expect("should succeed");
        assert_eq!(result, resource("abc"));
    }

    assert_eq!(upstream.calls(), 1);
    let stats = bridge.cache_stats().await;
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits, 4);
    assert_eq!(stats.keys, vec!["dashboard:abc".to_string()]);
}

/// Distinct keys do not share cache entries.
#[tokio::test]
async fn test_distinct_keys_fetch_separately() {
    init_tracing();
    let bridge = test_bridge(0, 10);
    let upstream = FlakyUpstream::new(0, 500);

    for uid in ["abc", "def", "ghi"] {
        let _: Resource = bridge
            .cached_get(&format!("dashboard:{uid}"), "get_dashboard", None, || {
                let upstream = Arc::clone(&upstream);
                async move { upstream.call(uid).await }
            })
            .await
            .expect("should succeed");
    }

    assert_eq!(upstream.calls(), 3);
    assert_eq!(bridge.cache_stats().await.size, 3);
}

/// An expired entry triggers a fresh fetch.
#[tokio::test]
async fn test_expired_entry_refetched() {
    init_tracing();
    let bridge = test_bridge(0, 10);
    let upstream = FlakyUpstream::new(0, 500);

    for _ in 0..2 {
        let _: Resource = bridge
            .cached_get(
                "dashboard:abc",
                "get_dashboard",
                Some(Duration::from_millis(20)),
                || {
                    let upstream = Arc::clone(&upstream);
                    async move { upstream.call("abc").await }
                },
            )
            .await
            .expect("should succeed");
        tokio::time::sleep(Duration::from_millis(40)).await;
    }

    assert_eq!(upstream.calls(), 2);
}

/// Clearing the cache forces the next read back to the upstream.
#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    init_tracing();
    let bridge = test_bridge(0, 10);
    let upstream = FlakyUpstream::new(0, 500);

    let fetch = |upstream: Arc<FlakyUpstream>| async move { upstream.call("abc").await };

    let _: Resource = bridge
        .cached_get("dashboard:abc", "get_dashboard", None, || {
            fetch(Arc::clone(&upstream))
        })
        .await
        .expect("should succeed");

    bridge.clear_cache().await;
    assert_eq!(bridge.cache_stats().await.size, 0);

    let _: Resource = bridge
        .cached_get("dashboard:abc", "get_dashboard", None, || {
            fetch(Arc::clone(&upstream))
        })
        .await
        .expect("should succeed");

    assert_eq!(upstream.calls(), 2);
}

/// A failed fetch stores nothing, so the next read tries again.
#[tokio::test]
async fn test_failure_not_cached() {
    init_tracing();
    let bridge = test_bridge(0, 10);
    // First call fails, second succeeds
    let upstream = FlakyUpstream::new(1, 503);

    let fetch = |upstream: Arc<FlakyUpstream>| async move { upstream.call("abc").await };

    let first = bridge
        .cached_get::<Resource, _, _>("dashboard:abc", "get_dashboard", None, || {
            fetch(Arc::clone(&upstream))
        })
        .await;
    assert!(first.is_err());
    assert_eq!(bridge.cache_stats().await.size, 0);

    let second: Resource = bridge
        .cached_get("dashboard:abc", "get_dashboard", None, || {
            fetch(Arc::clone(&upstream))
        })
        .await
        .expect("should succeed");
    assert_eq!(second, resource("abc"));
    assert_eq!(upstream.calls(), 2);
}
