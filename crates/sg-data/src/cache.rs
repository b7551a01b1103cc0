use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use sg_types::{DataError, RiskUniverse, SgResult};
use std::sync::Arc;

/// Cache key: the optional selector a universe was loaded for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    selector: Option<String>,
}

impl CacheKey {
    fn new(selector: Option<&str>) -> Self {
        Self {
            selector: selector.map(|s| s.to_string()),
        }
    }
}

/// Cached universe with access metadata
#[derive(Debug, Clone)]
struct CacheEntry {
    universe: Arc<RiskUniverse>,
    loaded_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    access_count: u64,
}

impl CacheEntry {
    fn new(universe: Arc<RiskUniverse>) -> Self {
        let now = Utc::now();
        Self {
            universe,
            loaded_at: now,
            last_accessed: now,
            access_count: 0,
        }
    }

    fn access(&mut self) {
        self.last_accessed = Utc::now();
        self.access_count += 1;
    }
}

/// Memoized risk universes keyed by selector.
///
/// Owned by the caller and shared by reference; entries are handed out as
/// immutable `Arc` snapshots so a request keeps a consistent view even if the
/// entry is replaced concurrently. A lookup never falls back to another
/// selector's entry.
#[derive(Debug)]
pub struct UniverseCache {
    cache: DashMap<CacheKey, RwLock<CacheEntry>>,
    max_entries: usize,
    stats: RwLock<CacheStats>,
}

impl UniverseCache {
    pub fn new() -> Self {
        Self::with_limit(64)
    }

    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            cache: DashMap::new(),
            max_entries: max_entries.max(1),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Cached universe for `selector`, or `DataError::Unavailable`.
    pub fn get(&self, selector: Option<&str>) -> SgResult<Arc<RiskUniverse>> {
        self.lookup(selector)
            .ok_or_else(|| DataError::unavailable(selector).into())
    }

    /// Cached universe for `selector`, if present.
    pub fn lookup(&self, selector: Option<&str>) -> Option<Arc<RiskUniverse>> {
        let key = CacheKey::new(selector);

        if let Some(entry_lock) = self.cache.get(&key) {
            let mut entry = entry_lock.write();
            entry.access();
            self.stats.write().hits += 1;
            tracing::debug!(selector = ?selector, "universe cache hit");
            return Some(Arc::clone(&entry.universe));
        }

        self.stats.write().misses += 1;
        tracing::debug!(selector = ?selector, "universe cache miss");
        None
    }

    /// Store (or replace) the universe for `selector` and return the shared
    /// snapshot.
    pub fn store(&self, selector: Option<&str>, universe: RiskUniverse) -> Arc<RiskUniverse> {
        let key = CacheKey::new(selector);
        let universe = Arc::new(universe);

        if !self.cache.contains_key(&key) && self.cache.len() >= self.max_entries {
            self.evict_lru();
        }

        self.cache
            .insert(key, RwLock::new(CacheEntry::new(Arc::clone(&universe))));

        self.stats.write().stores += 1;
        universe
    }

    /// Drop the entry for `selector`. Returns true if one was present.
    pub fn invalidate(&self, selector: Option<&str>) -> bool {
        self.cache.remove(&CacheKey::new(selector)).is_some()
    }

    /// Evict the least recently used entry
    fn evict_lru(&self) {
        let oldest = self
            .cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().read().last_accessed))
            .min_by(|a, b| a.1.cmp(&b.1))
            .map(|(key, _)| key);

        if let Some(key) = oldest {
            if self.cache.remove(&key).is_some() {
                self.stats.write().evictions += 1;
                tracing::debug!(selector = ?key.selector, "evicted cached universe");
            }
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
        *self.stats.write() = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn get_stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    pub fn get_cache_info(&self) -> Vec<CachedUniverseInfo> {
        let mut info: Vec<CachedUniverseInfo> = self
            .cache
            .iter()
            .map(|entry| {
                let guard = entry.value().read();
                CachedUniverseInfo {
                    selector: entry.key().selector.clone(),
                    risk_factors: guard.universe.risk_factors.len(),
                    counterparties: guard.universe.counterparties.len(),
                    contracts: guard.universe.contracts.len(),
                    loaded_at: guard.loaded_at,
                    access_count: guard.access_count,
                }
            })
            .collect();
        info.sort_by(|a, b| a.selector.cmp(&b.selector));
        info
    }
}

impl Default for UniverseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CachedUniverseInfo {
    pub selector: Option<String>,
    pub risk_factors: usize,
    pub counterparties: usize,
    pub contracts: usize,
    pub loaded_at: DateTime<Utc>,
    pub access_count: u64,
}
