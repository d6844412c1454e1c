//! First-in-first-out eviction.
//!
//! Entries keep their insertion position for their whole life, re-puts
//! included. A prune removes expired entries and then, if the cache is still
//! full, the oldest entry. No per-read bookkeeping beyond the entry's own
//! counters.

use super::EvictionPolicy;
use crate::core::CacheCore;
use crate::error::Result;
use crate::store::Store;
use std::hash::Hash;
use std::time::Duration;

/// FIFO policy marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fifo;

/// Cache evicting in insertion order.
pub type FifoCache<K, V> = CacheCore<K, V, Fifo>;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn prune_cache(&self, store: &mut Store<K, V>) -> Result<usize> {
        let mut count = 0;
        if store.prune_expired_active() {
            count += store.evict_expired();
        }
        if store.is_full() && store.evict_oldest() {
            count += 1;
        }
        Ok(count)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> CacheCore<K, V, Fifo> {
    /// FIFO cache whose entries never expire by default.
    pub fn new(capacity: usize) -> Self {
        Self::with_timeout(capacity, Duration::ZERO)
    }

    /// FIFO cache with a default TTL applied to every `put`.
    pub fn with_timeout(capacity: usize, timeout: Duration) -> Self {
        CacheCore::with_policy(Fifo, capacity, timeout)
    }
}
