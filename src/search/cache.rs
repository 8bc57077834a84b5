//! Optional TTL + LRU cache for search responses.
//!
//! Keyed on the full normalized request (filters, sort, pagination) itself,
//! so a lookup only ever returns the response of an equal request. Entries
//! are served for at most `ttl` after insertion since popularity and ratings
//! drift; staleness is bounded by that TTL.
//!
//! All operations use `try_lock` and degrade to a miss or a skipped insert
//! under contention instead of blocking a search.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::config::CacheConfig;
use crate::search::{SearchRequest, SearchResponse};

const MIN_CAPACITY: NonZeroUsize = NonZeroUsize::MIN;

#[derive(Debug, Clone)]
struct CachedSearch {
    response: SearchResponse,
    cached_at: Instant,
}

/// Cache statistics for monitoring and tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that found an entry older than the TTL.
    pub expired: u64,
}

impl CacheStats {
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

pub struct SearchCache {
    entries: Mutex<LruCache<SearchRequest, CachedSearch>>,
    stats: Mutex<CacheStats>,
    ttl: Duration,
}

impl SearchCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(MIN_CAPACITY),
            )),
            stats: Mutex::new(CacheStats::default()),
            ttl,
        }
    }

    /// `None` when caching is disabled.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.capacity, Duration::from_secs(config.ttl_seconds)))
    }

    pub fn get(&self, request: &SearchRequest) -> Option<SearchResponse> {
        self.get_at(request, Instant::now())
    }

    fn get_at(&self, request: &SearchRequest, now: Instant) -> Option<SearchResponse> {
        let mut entries = self.entries.try_lock().ok()?;
        let mut stats = self.stats.try_lock().ok()?;

        let fresh = entries
            .get(request)
            .map(|entry| now.saturating_duration_since(entry.cached_at) <= self.ttl);
        match fresh {
            Some(true) => {
                stats.hits += 1;
                entries.get(request).map(|entry| entry.response.clone())
            }
            Some(false) => {
                entries.pop(request);
                stats.expired += 1;
                stats.misses += 1;
                None
            }
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    pub fn put(&self, request: &SearchRequest, response: SearchResponse) {
        self.put_at(request, response, Instant::now());
    }

    fn put_at(&self, request: &SearchRequest, response: SearchResponse, now: Instant) {
        if let Ok(mut entries) = self.entries.try_lock() {
            entries.put(
                request.clone(),
                CachedSearch {
                    response,
                    cached_at: now,
                },
            );
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.try_lock().map(|s| *s).unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.try_lock().map(|c| c.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.try_lock() {
            entries.clear();
        }
        if let Ok(mut stats) = self.stats.try_lock() {
            *stats = CacheStats::default();
        }
    }
}
