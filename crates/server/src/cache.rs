//! In-process TTL caches for generated readings and entitlement snapshots.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::warn;

fn acquire_read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned: PoisonError<RwLockReadGuard<'_, T>>| {
        warn!("cache lock was poisoned on read, recovering inner value");
        poisoned.into_inner()
    })
}

fn acquire_write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned: PoisonError<RwLockWriteGuard<'_, T>>| {
        warn!("cache lock was poisoned on write, recovering inner value");
        poisoned.into_inner()
    })
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// String-keyed cache whose entries go stale after a fixed TTL.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh value for `key`, if any. Stale entries read as missing.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = acquire_read_lock(&self.entries);
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_for(key, value, self.ttl);
    }

    /// Insert with a custom lifetime, capped at the cache TTL.
    pub fn insert_for(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(self.ttl);
        acquire_write_lock(&self.entries).insert(key.into(), Entry { value, expires_at });
    }

    pub fn invalidate(&self, key: &str) {
        acquire_write_lock(&self.entries).remove(key);
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        acquire_write_lock(&self.entries).retain(|k, _| !k.starts_with(prefix));
    }

    /// Remove stale entries. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = acquire_write_lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        acquire_read_lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("u1:tarot", 1);
        cache.insert("u1:horoscope", 2);
        cache.insert("u2:tarot", 3);
        assert_eq!(cache.get("u1:tarot"), Some(1));

        cache.invalidate("u1:tarot");
        assert_eq!(cache.get("u1:tarot"), None);

        cache.invalidate_prefix("u1:");
        assert_eq!(cache.get("u1:horoscope"), None);
        assert_eq!(cache.get("u2:tarot"), Some(3));
    }

    #[test]
    fn test_stale_entries_are_hidden_and_purged() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert_for("short", "x", Duration::ZERO);
        cache.insert("long", "y");
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_custom_ttl_is_capped() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert_for("k", 1, Duration::from_secs(3600));
        assert_eq!(cache.get("k"), None);
    }
}
