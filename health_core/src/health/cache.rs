use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::types::HealthCheckResult;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: HealthCheckResult,
    pub inserted_at: Instant,
}

impl CacheEntry {
    pub fn new(result: HealthCheckResult) -> Self {
        Self {
            result,
            inserted_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_size: usize,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<String, CacheEntry>,
    stats: CacheStats,
}

/// Last result per component, valid for a fixed TTL.
#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl ResultCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
    const DEFAULT_CAPACITY: usize = 64;

    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(Self::DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);

        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, component: &str) -> Option<HealthCheckResult> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let lookup = inner
            .entries
            .get(component)
            .map(|entry| entry.is_fresh(self.ttl).then(|| entry.result.clone()));

        let fresh = match lookup {
            Some(Some(result)) => Some(result),
            Some(None) => {
                inner.entries.pop(component);
                inner.stats.evictions += 1;
                debug!("Cached result expired for component: {}", component);
                None
            }
            None => None,
        };

        match &fresh {
            Some(_) => inner.stats.hits += 1,
            None => inner.stats.misses += 1,
        }
        inner.stats.current_size = inner.entries.len();

        fresh
    }

    pub fn put(&self, component: &str, result: HealthCheckResult) {
        let mut inner = self.inner.lock();
        inner.entries.put(component.to_string(), CacheEntry::new(result));
        inner.stats.current_size = inner.entries.len();
        debug!("Cached result for component: {} (TTL: {:?})", component, self.ttl);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats.current_size = 0;
        debug!("Cleared all cached health results");
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL, Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic_operations() {
        let cache = ResultCache::default();
        assert!(cache.get("database").is_none());

        let result = HealthCheckResult::healthy("database").with_latency(12);
        cache.put("database", result.clone());

        assert_eq!(cache.get("database"), Some(result));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("database").is_none());
    }

    #[test]
    fn test_cache_ttl_expiry_evicts() {
        let cache = ResultCache::new(Duration::from_millis(30), 8);
        cache.put("queue", HealthCheckResult::healthy("queue"));
        assert!(cache.get("queue").is_some());

        std::thread::sleep(Duration::from_millis(50));

        assert!(cache.get("queue").is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_put_overwrites_entry() {
        let cache = ResultCache::default();
        cache.put("database", HealthCheckResult::healthy("database"));
        cache.put("database", HealthCheckResult::unhealthy("database", "down"));

        let cached = cache.get("database").unwrap();
        assert!(cached.is_failure());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_stats() {
        let cache = ResultCache::default();
        cache.put("database", HealthCheckResult::healthy("database"));

        let _ = cache.get("database");
        let _ = cache.get("database");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.current_size, 1);
    }
}
