//! Query cache with per-entry TTL and substring invalidation.
//!
//! # Responsibility
//! - Keep recently fetched query results close to the read paths.
//! - Evict stale entries lazily during lookup; no background sweeper runs.
//!
//! # Invariants
//! - An entry is valid iff `now - stored_at <= ttl`.
//! - Cache operations never panic and never surface internal errors; a
//!   malformed internal state degrades to a miss.
//! - Invalidation matches keys by substring and is intentionally coarse.
//!
//! # See also
//! - docs/architecture/caching.md

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Default entry lifetime applied by [`QueryCache::set`].
pub const DEFAULT_TTL_SECONDS: i64 = 300;

/// One cached value plus the bookkeeping needed for lazy expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached payload.
    pub data: V,
    /// Wall-clock instant the value was stored.
    pub stored_at: DateTime<Utc>,
    /// Lifetime after which the value is stale.
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.stored_at) <= self.ttl
    }
}

/// Introspection payload returned by [`QueryCache::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of fresh entries.
    pub size: usize,
    /// Fresh entry keys, sorted for stable output.
    pub keys: Vec<String>,
}

/// Generic key→value cache used by skill read paths.
///
/// Keys are opaque composite strings (for example
/// `skills_<user>_<page>_<limit>`), which is what makes substring
/// invalidation able to sweep every variant for an entity in one call.
#[derive(Debug)]
pub struct QueryCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> QueryCache<V> {
    /// Creates a cache with the default minutes-scale TTL.
    pub fn new() -> Self {
        Self::with_default_ttl(Duration::seconds(DEFAULT_TTL_SECONDS))
    }

    /// Creates a cache with a custom default TTL.
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Stores `value` under `key` with the cache-wide default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Stores `value` under `key` with an explicit TTL.
    ///
    /// # Side effects
    /// - Replaces any previous entry under the same key.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.insert(
            key.into(),
            CacheEntry {
                data: value,
                stored_at: Utc::now(),
                ttl,
            },
        );
    }

    /// Looks up `key`, returning `None` for absent or expired entries.
    ///
    /// # Contract
    /// - An expired entry is removed as a side effect of the lookup.
    /// - Never panics; a fault inside the cache behaves as a miss so that a
    ///   cache bug can never block a read path.
    pub fn get(&self, key: &str) -> Option<V> {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };
        let now = Utc::now();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Removes every key containing `pattern` as a substring.
    ///
    /// Returns the number of evicted entries. Matching is deliberately
    /// coarse so one write can sweep every cached page/variant touching an
    /// entity without enumerating exact keys.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        before - entries.len()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.clear();
    }

    /// Reports fresh entries without evicting stale ones.
    pub fn stats(&self) -> CacheStats {
        let Ok(entries) = self.entries.lock() else {
            return CacheStats {
                size: 0,
                keys: Vec::new(),
            };
        };
        let now = Utc::now();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_fresh(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
        }
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
