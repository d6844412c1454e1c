//! Removal notifications and lookup statistics.
//!
//! # Removal listeners
//!
//! Implement [`RemovalListener`] to learn when entries leave a cache:
//!
//! ```
//! use hoard::observability::{RemovalCause, RemovalListener};
//!
//! struct LogEvictions;
//!
//! impl RemovalListener<String, Vec<u8>> for LogEvictions {
//!     fn on_remove(&self, key: &String, value: &Vec<u8>, cause: RemovalCause) {
//!         if cause == RemovalCause::Evicted {
//!             println!("evicted {} ({} bytes)", key, value.len());
//!         }
//!     }
//! }
//! ```
//!
//! Listeners run after the cache's exclusive lock has been released, once per
//! removed entry. They may call back into the cache.
//!
//! | Cause | Raised by |
//! |-------|-----------|
//! | `Explicit` | `remove()` |
//! | `Replaced` | `put()` on a key that is already present |
//! | `Expired` | `get()` finding a stale entry, or a prune scan |
//! | `Evicted` | capacity enforcement by the eviction policy |
//! | `Reclaimed` | `get()` finding a weak entry whose value was dropped |
//!
//! `clear()` drops entries without notifying.
//!
//! # Statistics
//!
//! [`CacheStats`] is a point-in-time copy of the hit/miss counters and size.

use std::fmt;

/// Why an entry left the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Removed by `remove()`.
    Explicit,
    /// Overwritten by a `put()` of the same key.
    Replaced,
    /// Outlived its time-to-live.
    Expired,
    /// Evicted by the policy to respect capacity.
    Evicted,
    /// The weakly held value had no remaining owners.
    Reclaimed,
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalCause::Explicit => write!(f, "Explicit"),
            RemovalCause::Replaced => write!(f, "Replaced"),
            RemovalCause::Expired => write!(f, "Expired"),
            RemovalCause::Evicted => write!(f, "Evicted"),
            RemovalCause::Reclaimed => write!(f, "Reclaimed"),
        }
    }
}

/// Callback invoked for every entry that leaves a cache.
pub trait RemovalListener<K, V>: Send + Sync {
    /// Called once per removed entry.
    fn on_remove(&self, _key: &K, _value: &V, cause: RemovalCause) {
        trace!("Cache REMOVE ({})", cause);
    }
}

/// Default listener (no-op).
#[derive(Clone, Debug, Default)]
pub struct NoOpListener;

impl<K, V> RemovalListener<K, V> for NoOpListener {
    fn on_remove(&self, _key: &K, _value: &V, _cause: RemovalCause) {}
}

impl<K, V, F> RemovalListener<K, V> for F
where
    F: Fn(&K, &V, RemovalCause) + Send + Sync,
{
    fn on_remove(&self, key: &K, value: &V, cause: RemovalCause) {
        self(key, value, cause)
    }
}

/// Lookup statistics for a cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    /// `0` for unbounded.
    pub capacity: usize,
}

impl CacheStats {
    /// Total number of `get()` calls (hits + misses).
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate as a fraction in `[0.0, 1.0]`; `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
