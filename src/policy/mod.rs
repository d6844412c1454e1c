//! Eviction policies.
//!
//! A policy decides what a prune pass removes. [`CacheCore`](crate::CacheCore)
//! owns locking, expiration on read and statistics, and calls into the policy
//! with the store held exclusively:
//!
//! - [`prune_cache`](EvictionPolicy::prune_cache) when an insert would exceed
//!   capacity, and on every explicit `prune()`
//! - [`after_insert`](EvictionPolicy::after_insert) after each insert
//!
//! | Policy | Order | Prune |
//! |--------|-------|-------|
//! | [`Fifo`] | insertion | expired entries, then the oldest if still full |
//! | [`Lru`] | access | expired entries only; capacity is enforced on insert |
//! | [`Lfu`] | insertion | expired entries, then decay-and-reap by access count |
//! | [`Timed`] | insertion | expired entries, no capacity |
//! | [`Unbounded`] | insertion | unsupported; dead weak values vanish on access |

use crate::entry::CacheEntry;
use crate::error::Result;
use crate::observability::RemovalCause;
use crate::store::Store;
use std::time::Duration;

pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod timed;
pub mod unbounded;

pub use self::fifo::{Fifo, FifoCache};
pub use self::lfu::{Lfu, LfuCache};
pub use self::lru::{Lru, LruCache};
pub use self::timed::Timed;
pub use self::unbounded::Unbounded;

/// Strategy plugged into a [`CacheCore`](crate::CacheCore).
///
/// **IMPORTANT:** Every method runs under the cache's lock (exclusive for
/// `prune_cache` and `after_insert`, shared for `is_stale`). Keep them free of
/// I/O and blocking calls.
pub trait EvictionPolicy<K, V>: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Whether reads and re-puts move an entry to the most recent position.
    ///
    /// Access-ordered policies take the exclusive lock in `get`.
    fn access_ordered(&self) -> bool {
        false
    }

    /// TTL actually stored for a `put` that asked for `requested`.
    fn admit_ttl(&self, requested: Duration) -> Duration {
        requested
    }

    /// Whether `get` must treat the entry as absent and remove it.
    fn is_stale(&self, entry: &CacheEntry<K, V>) -> bool {
        entry.is_expired()
    }

    /// Cause reported for entries removed because `is_stale` held.
    fn stale_cause(&self) -> RemovalCause {
        RemovalCause::Expired
    }

    /// Hook run after every insert.
    fn after_insert(&self, _store: &mut Store<K, V>) {}

    /// Cleanup pass. Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the policy cannot be pruned explicitly.
    fn prune_cache(&self, store: &mut Store<K, V>) -> Result<usize>;
}
