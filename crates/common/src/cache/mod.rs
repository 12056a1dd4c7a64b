//! In-process reference-data cache
//!
//! Provides:
//! - Process-wide storage with absolute expiry
//! - Generic get/set operations with TTL
//! - Get-or-load for cache-backed reference reads
//!
//! Constructed once at process start and shared by reference; there is no
//! hidden global. Entries simply go stale within the expiry horizon — no
//! manual invalidation path exists. Concurrent callers racing on the same
//! key during a miss may each invoke the loader: the underlying reference
//! data is read-mostly and idempotent to reload, so the cache is best-effort
//! rather than a single-flight gate.

use crate::errors::{AppError, Result};
use crate::metrics;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// In-memory cache with absolute per-entry expiry
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Create a new cache with the given default TTL
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Get a value from cache; expired entries read as misses
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                let parsed =
                    serde_json::from_value(entry.value.clone()).map_err(|e| AppError::CacheError {
                        message: format!("Failed to parse cached value for '{}': {}", key, e),
                    })?;
                debug!(key = %key, "Cache hit");
                metrics::record_cache(true, "reference");
                Ok(Some(parsed))
            }
            _ => {
                debug!(key = %key, "Cache miss");
                metrics::record_cache(false, "reference");
                Ok(None)
            }
        }
    }

    /// Set a value in cache with the default TTL
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Set a value in cache with a custom TTL
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let json = serde_json::to_value(value).map_err(|e| AppError::CacheError {
            message: format!("Failed to serialize value for '{}': {}", key, e),
        })?;

        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: json,
                expires_at: Instant::now() + ttl,
            },
        );

        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache set");
        Ok(())
    }

    /// Get or set with a loader function
    ///
    /// Loader errors propagate to the caller and nothing is cached.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        // Try to get from cache first
        if let Some(cached) = self.get::<T>(key).await? {
            return Ok(cached);
        }

        // Load from source
        let value = loader().await?;

        // Cache the result
        if let Err(e) = self.set(key, &value).await {
            warn!(error = %e, "Failed to cache value, continuing without cache");
        }

        Ok(value)
    }
}

/// Cache key builder helpers
pub mod keys {
    /// Key holding the full submission status list
    pub fn submission_statuses() -> String {
        "statuses:all".to_string()
    }

    /// Key holding one setting, by normalized name
    pub fn setting(normalized_name: &str) -> String {
        format!("setting:{}", normalized_name)
    }

    /// Key holding the aggregate name-to-value settings map
    pub fn all_settings() -> String {
        "settings:all".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DAY: Duration = Duration::from_secs(86_400);

    #[test]
    fn test_key_builders() {
        assert_eq!(keys::submission_statuses(), "statuses:all");
        assert_eq!(keys::setting("smtp_host"), "setting:smtp_host");
        assert_eq!(keys::all_settings(), "settings:all");
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let cache = MemoryCache::new(DAY);
        cache.set("k", &vec![1, 2, 3]).await.unwrap();

        let got: Option<Vec<i32>> = cache.get("k").await.unwrap();
        assert_eq!(got, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = cache.get("other").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_get_or_load_invokes_loader_once() {
        let cache = MemoryCache::new(DAY);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: String = cache
                .get_or_load("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("loaded".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "loaded");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_reloads() {
        let cache = MemoryCache::new(DAY);
        let calls = AtomicUsize::new(0);

        let load = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42_i64)
        };

        let _: i64 = cache.get_or_load("k", load).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Within the horizon: served from cache
        tokio::time::advance(DAY / 2).await;
        let _: i64 = cache.get_or_load("k", load).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Past the absolute expiry: loader runs again
        tokio::time::advance(DAY).await;
        let _: i64 = cache.get_or_load("k", load).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_error_caches_nothing() {
        let cache = MemoryCache::new(DAY);

        let result: Result<i64> = cache
            .get_or_load("k", || async {
                Err(AppError::Internal {
                    message: "load failed".into(),
                })
            })
            .await;
        assert!(result.is_err());

        let got: Option<i64> = cache.get("k").await.unwrap();
        assert_eq!(got, None);
    }
}
