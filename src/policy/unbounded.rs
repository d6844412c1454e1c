//! Unbounded policy over weakly held values.
//!
//! The store keeps a [`Weak`] per entry. An entry is stale once every strong
//! reference to its value is gone; `get` then removes it and reports it as
//! `Reclaimed`. TTLs are ignored and there is no capacity, so there is
//! nothing for an explicit prune to do.

use super::EvictionPolicy;
use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use crate::observability::RemovalCause;
use crate::store::Store;
use std::sync::Weak;
use std::time::Duration;

/// Unbounded policy marker. Used by [`WeakCache`](crate::WeakCache).
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl<K, T> EvictionPolicy<K, Weak<T>> for Unbounded {
    fn name(&self) -> &'static str {
        "UNBOUNDED"
    }

    fn admit_ttl(&self, _requested: Duration) -> Duration {
        Duration::ZERO
    }

    fn is_stale(&self, entry: &CacheEntry<K, Weak<T>>) -> bool {
        entry.value().strong_count() == 0
    }

    fn stale_cause(&self) -> RemovalCause {
        RemovalCause::Reclaimed
    }

    fn prune_cache(&self, _store: &mut Store<K, Weak<T>>) -> Result<usize> {
        Err(Error::Unsupported(
            "prune is not available on an unbounded weak cache".to_string(),
        ))
    }
}
