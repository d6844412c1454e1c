//! Least-frequently-used eviction with decay.
//!
//! A prune first drops expired entries while tracking the lowest access count
//! among the survivors. If the cache is still full, that minimum is
//! subtracted from every entry and each entry reaching zero is removed, so a
//! single round can reap several cold entries at once. Ties fall to
//! iteration order.
//!
//! Both passes run under the exclusive lock, so no insert can slip in
//! between finding the minimum and applying it.

use super::EvictionPolicy;
use crate::core::CacheCore;
use crate::error::Result;
use crate::observability::RemovalCause;
use crate::store::Store;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// LFU policy marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lfu;

/// Cache evicting the least frequently read entries.
pub type LfuCache<K, V> = CacheCore<K, V, Lfu>;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Lfu {
    fn name(&self) -> &'static str {
        "LFU"
    }

    fn prune_cache(&self, store: &mut Store<K, V>) -> Result<usize> {
        let now = Instant::now();
        let mut min_count: Option<u64> = None;

        let mut count = store.evict_where(
            |entry| {
                if entry.is_expired_at(now) {
                    return true;
                }
                let accesses = entry.access_count();
                min_count = Some(min_count.map_or(accesses, |min| min.min(accesses)));
                false
            },
            RemovalCause::Expired,
        );

        if !store.is_full() {
            return Ok(count);
        }

        if let Some(min) = min_count {
            count += store.evict_where(|entry| entry.decay(min) == 0, RemovalCause::Evicted);
        }
        Ok(count)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> CacheCore<K, V, Lfu> {
    /// LFU cache whose entries never expire by default.
    pub fn new(capacity: usize) -> Self {
        Self::with_timeout(capacity, Duration::ZERO)
    }

    /// LFU cache with a default TTL applied to every `put`.
    pub fn with_timeout(capacity: usize, timeout: Duration) -> Self {
        CacheCore::with_policy(Lfu, capacity, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfu_evicts_unread_entry() {
        let cache = LfuCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        for _ in 0..3 {
            assert_eq!(cache.get(&"a"), Some(1));
        }
        cache.put("c", 3);

        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_lfu_decay_keeps_relative_order() {
        let cache = LfuCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        for _ in 0..5 {
            cache.get(&"a");
        }
        for _ in 0..2 {
            cache.get(&"b");
        }
        cache.get(&"c");

        // min is 1: a -> 4, b -> 1, c -> 0 (reaped)
        assert_eq!(cache.prune().expect("prune"), 1);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key(&"a"));
        assert!(cache.contains_key(&"b"));
        assert!(!cache.contains_key(&"c"));
    }

    #[test]
    fn test_lfu_reaps_every_entry_at_minimum() {
        let cache = LfuCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get(&"a");

        assert_eq!(cache.prune().expect("prune"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key(&"a"));
    }

    #[test]
    fn test_lfu_prune_when_not_full_only_expires() {
        let cache = LfuCache::new(10);
        cache.put("a", 1);
        cache.put_with_ttl("b", 2, Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.prune().expect("prune"), 1);
        assert!(cache.contains_key(&"a"));
    }

    #[test]
    fn test_lfu_expired_entries_do_not_set_minimum() {
        let cache = LfuCache::new(2);
        cache.put_with_ttl("stale", 0, Duration::from_millis(20));
        cache.put("a", 1);
        cache.get(&"a");
        std::thread::sleep(Duration::from_millis(40));

        // Expiring "stale" frees a slot, so "a" keeps its count.
        cache.put("b", 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key(&"a"));
        assert!(cache.contains_key(&"b"));
    }
}
