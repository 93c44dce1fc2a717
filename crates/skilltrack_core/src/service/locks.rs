//! Keyed async locks.
//!
//! # Responsibility
//! - Hand out one shared async mutex per string key, on demand.
//! - Back per-skill mutation serialization and per-key miss coalescing.
//!
//! # Invariants
//! - The registry's own lock is held only for map access, never across an
//!   await point.
//! - A handle stays usable for as long as any caller holds it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Registry of per-key async mutexes.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared lock handle for `key`, creating it on first use.
    ///
    /// # Contract
    /// - Callers lock the returned handle outside this registry, so key
    ///   contention never blocks handle lookup for other keys.
    pub fn handle(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let Ok(mut map) = self.inner.lock() else {
            // Why: a poisoned registry must not block mutations; an unshared
            // fallback lock only costs serialization for this one call.
            return Arc::new(AsyncMutex::new(()));
        };
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Number of keys with a registered lock.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::KeyedLocks;
    use std::sync::Arc;

    #[test]
    fn same_key_returns_shared_handle() {
        let locks = KeyedLocks::new();
        let first = locks.handle("skill-1");
        let second = locks.handle("skill-1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_handles() {
        let locks = KeyedLocks::new();
        let first = locks.handle("skill-1");
        let second = locks.handle("skill-2");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn handle_serializes_critical_sections() {
        let locks = KeyedLocks::new();
        let handle = locks.handle("skill-1");
        let guard = handle.lock().await;
        let contender = locks.handle("skill-1");
        assert!(contender.try_lock().is_err());
        drop(guard);
        assert!(contender.try_lock().is_ok());
    }
}
