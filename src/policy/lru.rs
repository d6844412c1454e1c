//! Least-recently-used eviction.
//!
//! Every read and every re-put moves the entry to the most recent position.
//! Capacity is enforced as part of the insert itself: the least recently used
//! entry is dropped in the same operation that overflowed the cache. A prune
//! therefore only has expired entries left to remove.

use super::EvictionPolicy;
use crate::core::CacheCore;
use crate::error::Result;
use crate::store::Store;
use std::hash::Hash;
use std::time::Duration;

/// LRU policy marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lru;

/// Cache evicting the least recently used entry.
pub type LruCache<K, V> = CacheCore<K, V, Lru>;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Lru {
    fn name(&self) -> &'static str {
        "LRU"
    }

    fn access_ordered(&self) -> bool {
        true
    }

    fn after_insert(&self, store: &mut Store<K, V>) {
        while store.is_over_capacity() {
            if !store.evict_oldest() {
                break;
            }
        }
    }

    fn prune_cache(&self, store: &mut Store<K, V>) -> Result<usize> {
        if !store.prune_expired_active() {
            return Ok(0);
        }
        Ok(store.evict_expired())
    }
}

impl<K: Hash + Eq + Clone, V: Clone> CacheCore<K, V, Lru> {
    /// LRU cache whose entries never expire by default.
    pub fn new(capacity: usize) -> Self {
        Self::with_timeout(capacity, Duration::ZERO)
    }

    /// LRU cache with a default TTL applied to every `put`.
    pub fn with_timeout(capacity: usize, timeout: Duration) -> Self {
        CacheCore::with_policy(Lru, capacity, timeout)
    }
}
