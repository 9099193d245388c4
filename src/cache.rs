use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{Category, Tool};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300); // 5 minutes

#[derive(Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Read-through cache with a fixed freshness window.
///
/// Stale entries are never evicted, only replaced by the next successful
/// fetch. Nothing is held locked while a fetch is in flight, so two callers
/// missing on the same key may both fetch; the later write wins.
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_fetch_within(key, self.ttl, fetch).await
    }

    /// Same as [`get_or_fetch`](Self::get_or_fetch) with a per-call window.
    ///
    /// A failed fetch leaves whatever entry was there untouched.
    pub async fn get_or_fetch_within<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.fresh(&key, ttl) {
            log::debug!("{} cache hit for {:?}", self.name, key);
            return Ok(value);
        }

        log::debug!("{} cache miss for {:?}", self.name, key);
        let value = fetch().await?;
        self.entries.insert(key, CacheEntry::new(value.clone()));
        Ok(value)
    }

    /// Current value for `key` regardless of freshness.
    #[cfg(test)]
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    #[cfg(test)]
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, CacheEntry::new(value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn fresh(&self, key: &K, ttl: Duration) -> Option<V> {
        // The map guard is dropped before returning, never held across an await.
        let entry = self.entries.get(key)?;
        entry.is_fresh(ttl).then(|| entry.value.clone())
    }
}

/// Key for the similar-tools keyspace, shown as `categoryId:excludedId:limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimilarKey {
    pub category_id: Uuid,
    pub exclude_id: Uuid,
    pub limit: i64,
}

impl fmt::Display for SimilarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.category_id, self.exclude_id, self.limit)
    }
}

/// The process-wide caches, built once at startup and shared through
/// `AppState`.
pub struct DirectoryCache {
    pub categories: TtlCache<(), Arc<Vec<Category>>>,
    pub tool_by_slug: TtlCache<String, Option<Arc<Tool>>>,
    pub similar_tools: TtlCache<SimilarKey, Arc<Vec<Tool>>>,
}

impl DirectoryCache {
    pub fn new(ttl: Duration, similar_tools_ttl: Duration) -> Self {
        Self {
            categories: TtlCache::new("categories", ttl),
            tool_by_slug: TtlCache::new("tool_by_slug", ttl),
            similar_tools: TtlCache::new("similar_tools", similar_tools_ttl),
        }
    }

    pub fn clear(&self) {
        self.categories.clear();
        self.tool_by_slug.clear();
        self.similar_tools.clear();
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_TTL)
    }
}
