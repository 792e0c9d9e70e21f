//! In-memory response cache.
//!
//! Caches cacheable responses keyed by (normalised query, country,
//! language). Uses [`moka`] for async-friendly caching with a TTL and
//! automatic eviction. Each router owns its cache; a TTL of zero
//! disables it.

use std::time::Duration;

use moka::future::Cache;

use crate::country::CountryCode;
use crate::orchestrator::router::SearchResponse;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased query with whitespace runs collapsed.
    query: String,
    country: Option<CountryCode>,
    language: Option<String>,
}

impl CacheKey {
    /// Build a deterministic cache key.
    ///
    /// The query is lowercased and its whitespace collapsed, so
    /// `"Rust  Lang"` and `"rust lang"` share an entry.
    pub fn new(query: &str, country: Option<CountryCode>, language: Option<&str>) -> Self {
        Self {
            query: query
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
            country,
            language: language.map(str::to_owned),
        }
    }
}

/// TTL-bounded cache of responses.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Option<Cache<CacheKey, SearchResponse>>,
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` responses for `ttl_seconds`.
    ///
    /// A zero TTL or capacity yields a cache that never stores anything.
    pub fn new(ttl_seconds: u64, capacity: u64) -> Self {
        let inner = (ttl_seconds > 0 && capacity > 0).then(|| {
            Cache::builder()
                .max_capacity(capacity)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    /// Whether the cache can hold entries.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Look up a cached response.
    pub async fn get(&self, key: &CacheKey) -> Option<SearchResponse> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    /// Store a response.
    pub async fn insert(&self, key: CacheKey, response: SearchResponse) {
        if let Some(cache) = &self.inner {
            cache.insert(key, response).await;
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
