//! In-process query cache with hierarchical invalidation and request
//! coalescing.
//!
//! Entries are keyed by [`QueryKey`] and store the fetched value as JSON,
//! so any serde-able result type can share one store. An entry is either
//! fresh (served directly) or stale (refetched on next access); a fetch in
//! flight is represented by a held per-key lock, and concurrent callers for
//! the same key wait on that lock instead of issuing duplicate requests.
//! Failed fetches are never cached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{trace, warn};

use crate::config::CacheSettings;
use crate::error::ApiResult;

use super::key::QueryKey;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    stale_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.stale_at
    }
}

/// Key-addressed store shared by every resource client.
pub struct QueryCache {
    entries: DashMap<QueryKey, CacheEntry>,
    locks: DashMap<QueryKey, Arc<Mutex<()>>>,
    stale_ttl: Duration,
    max_entries: usize,
    enabled: bool,
}

impl QueryCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            entries: DashMap::new(),
            locks: DashMap::new(),
            stale_ttl: Duration::from_secs(settings.stale_secs),
            max_entries: settings.max_entries,
            enabled: settings.enabled,
        }
    }

    /// Serves `key` from cache when fresh, otherwise runs `fetcher` and
    /// caches its success value.
    ///
    /// Concurrent calls for an equal key are coalesced: the second caller
    /// waits for the in-flight fetch and then observes its cached result
    /// without a second request. Errors propagate to the caller that
    /// triggered the fetch and leave the key absent.
    pub async fn fetch_with<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        if !self.enabled {
            return fetcher().await;
        }

        if let Some(hit) = self.get::<T>(&key) {
            trace!(%key, "cache hit");
            return Ok(hit);
        }

        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // A coalesced waiter lands here after the leader finished.
        if let Some(hit) = self.get::<T>(&key) {
            trace!(%key, "cache hit after coalesced wait");
            return Ok(hit);
        }

        trace!(%key, "cache miss, fetching");
        let result = fetcher().await;
        if let Ok(value) = &result {
            self.store(key, value);
        }
        result
    }

    /// Fresh-only read. Returns `None` for absent, stale, or undecodable
    /// entries.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        if !entry.is_fresh() {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Reads the last stored value even when stale.
    pub fn get_cached<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Seeds an entry directly, bypassing any fetch. Used by the auth
    /// session to store the current admin from the login response.
    pub fn set<T: Serialize>(&self, key: QueryKey, value: &T) {
        if !self.enabled {
            return;
        }
        self.store(key, value);
    }

    /// Marks every entry whose key has `prefix` as stale. The values stay
    /// readable through [`get_cached`](Self::get_cached) until refetched.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut count = 0usize;
        let stale_at = Instant::now();
        for mut entry in self.entries.iter_mut() {
            if prefix.is_prefix_of(entry.key()) {
                entry.value_mut().stale_at = stale_at;
                count += 1;
            }
        }
        trace!(%prefix, count, "invalidated cache entries");
    }

    /// Drops every entry whose key has `prefix`.
    pub fn remove(&self, prefix: &QueryKey) {
        self.entries.retain(|key, _| !prefix.is_prefix_of(key));
    }

    /// Drops everything, including coalescing locks. Called on logout.
    pub fn clear(&self) {
        self.entries.clear();
        self.locks.clear();
    }

    /// True when the entry exists and is fresh.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.is_fresh())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn store<T: Serialize>(&self, key: QueryKey, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                // A failed store only costs a refetch later.
                warn!(%key, error = %e, "failed to serialize value for cache");
                return;
            }
        };
        if self.entries.len() >= self.max_entries {
            // Soft bound: shed stale entries before growing past the cap.
            self.entries.retain(|_, e| e.is_fresh());
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stale_at: Instant::now() + self.stale_ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::key::Params;
    use crate::cache::keys;

    fn test_cache() -> QueryCache {
        QueryCache::new(&CacheSettings::default())
    }

    #[tokio::test]
    async fn test_fetch_with_caches_success() {
        let cache = test_cache();
        let calls = AtomicUsize::new(0);
        let key = keys::stats::dashboard();

        for _ in 0..3 {
            let value: u64 = cache
                .fetch_with(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42u64)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_with_does_not_cache_errors() {
        let cache = test_cache();
        let calls = AtomicUsize::new(0);
        let key = keys::stats::dashboard();

        let first: ApiResult<u64> = cache
            .fetch_with(key.clone(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(crate::error::ApiError::Server {
                    status: 500,
                    message: "boom".into(),
                })
            })
            .await;
        assert!(first.is_err());
        assert!(!cache.is_fresh(&key));

        let second: u64 = cache
            .fetch_with(key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7u64)
            })
            .await
            .unwrap();
        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_fetches_coalesce() {
        let cache = Arc::new(test_cache());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = keys::users::detail("u1");

        let run = |cache: Arc<QueryCache>, calls: Arc<AtomicUsize>, key: QueryKey| async move {
            cache
                .fetch_with(key, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Hold the fetch open long enough for the second caller
                    // to arrive while it is in flight.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(String::from("admin"))
                })
                .await
        };

        let (a, b) = tokio::join!(
            run(cache.clone(), calls.clone(), key.clone()),
            run(cache.clone(), calls.clone(), key.clone())
        );
        assert_eq!(a.unwrap(), "admin");
        assert_eq!(b.unwrap(), "admin");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hierarchical_invalidation() {
        let cache = test_cache();
        let list_key = keys::residences::list(Params::new().set("status", Some("active")));
        let detail_key = keys::residences::detail("abc");
        let unrelated = keys::users::list(Params::new());

        cache.set(list_key.clone(), &vec!["r1"]);
        cache.set(detail_key.clone(), &"r1");
        cache.set(unrelated.clone(), &vec!["u1"]);

        cache.invalidate(&keys::residences::all());

        assert!(!cache.is_fresh(&list_key));
        assert!(!cache.is_fresh(&detail_key));
        assert!(cache.is_fresh(&unrelated));
        // Stale values remain readable until refetched
        assert_eq!(cache.get_cached::<String>(&detail_key).unwrap(), "r1");
    }

    #[tokio::test]
    async fn test_invalidated_entry_refetches() {
        let cache = test_cache();
        let calls = AtomicUsize::new(0);
        let key = keys::users::detail("u2");

        let fetch = |v: u64| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(v) }
        };
        let first: u64 = cache.fetch_with(key.clone(), || fetch(1)).await.unwrap();
        cache.invalidate(&keys::users::all());
        let second: u64 = cache.fetch_with(key.clone(), || fetch(2)).await.unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let cache = test_cache();
        cache.set(keys::otps::list(), &vec!["123456"]);
        cache.set(keys::admin_users::list(), &vec!["a"]);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let settings = CacheSettings {
            enabled: false,
            ..CacheSettings::default()
        };
        let cache = QueryCache::new(&settings);
        let calls = AtomicUsize::new(0);
        let key = keys::stats::recent();

        for _ in 0..2 {
            let _: u64 = cache
                .fetch_with(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1u64)
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_stale_ttl_expiry() {
        let settings = CacheSettings {
            stale_secs: 0,
            ..CacheSettings::default()
        };
        let cache = QueryCache::new(&settings);
        let key = keys::stats::dashboard();
        cache.set(key.clone(), &1u64);
        assert!(!cache.is_fresh(&key));
        assert_eq!(cache.get_cached::<u64>(&key), Some(1));
    }
}
