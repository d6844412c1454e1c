//! Time-only eviction: no capacity, entries leave when they expire.

use super::EvictionPolicy;
use crate::error::Result;
use crate::store::Store;
use std::hash::Hash;

/// Timed policy marker. Used by [`TimedCache`](crate::TimedCache).
#[derive(Clone, Copy, Debug, Default)]
pub struct Timed;

impl<K: Hash + Eq + Clone, V> EvictionPolicy<K, V> for Timed {
    fn name(&self) -> &'static str {
        "TIMED"
    }

    fn prune_cache(&self, store: &mut Store<K, V>) -> Result<usize> {
        Ok(store.evict_expired())
    }
}
