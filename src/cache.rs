//! The cache contract shared by every variant.

use crate::core::CacheCore;
use crate::error::Result;
use crate::observability::CacheStats;
use crate::policy::EvictionPolicy;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Operations every cache variant supports.
///
/// All methods take `&self`; implementations synchronise internally, so a
/// cache can be shared behind an `Arc` without an extra mutex. The trait is
/// object safe: [`CacheConfig::build`](crate::CacheConfig::build) hands out
/// `Box<dyn Cache<K, V>>`.
pub trait Cache<K, V>: Send + Sync {
    /// Store `value` with the cache's default TTL.
    fn put(&self, key: K, value: V);

    /// Store `value` with its own TTL; zero means it never expires.
    ///
    /// If the key is new and the cache is full, an eviction pass runs first.
    fn put_with_ttl(&self, key: K, value: V, ttl: Duration);

    /// Fetch a value, refreshing its last-access time.
    ///
    /// # Returns
    /// - `Some(value)` - hit
    /// - `None` - absent or expired (an expired entry is removed)
    fn get(&self, key: &K) -> Option<V> {
        self.get_with(key, true)
    }

    /// Fetch a value; `update_last_access = false` leaves its expiry clock
    /// untouched.
    fn get_with(&self, key: &K, update_last_access: bool) -> Option<V>;

    /// Remove a value, returning it if present. Removing a missing key is a
    /// no-op.
    fn remove(&self, key: &K) -> Option<V>;

    /// Remove every entry. Hit/miss counters are kept.
    fn clear(&self);

    /// Run the eviction policy's cleanup pass and return how many entries it
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::Unsupported)` if the variant cannot be pruned.
    fn prune(&self) -> Result<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a bounded cache is at capacity; always `false` when unbounded.
    fn is_full(&self) -> bool;

    /// Capacity, `0` for unbounded.
    fn limit(&self) -> usize;

    /// Default TTL, zero when entries do not expire by default.
    fn timeout(&self) -> Duration;

    /// Consistent copy of the key/value pairs. May be stale as soon as it
    /// returns.
    fn snapshot(&self) -> HashMap<K, V>;

    fn stats(&self) -> CacheStats;
}

impl<K, V, P> Cache<K, V> for CacheCore<K, V, P>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy<K, V>,
{
    fn put(&self, key: K, value: V) {
        CacheCore::put(self, key, value)
    }

    fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        CacheCore::put_with_ttl(self, key, value, ttl)
    }

    fn get_with(&self, key: &K, update_last_access: bool) -> Option<V> {
        CacheCore::get_with(self, key, update_last_access)
    }

    fn remove(&self, key: &K) -> Option<V> {
        CacheCore::remove(self, key)
    }

    fn clear(&self) {
        CacheCore::clear(self)
    }

    fn prune(&self) -> Result<usize> {
        CacheCore::prune(self)
    }

    fn len(&self) -> usize {
        CacheCore::len(self)
    }

    fn is_full(&self) -> bool {
        CacheCore::is_full(self)
    }

    fn limit(&self) -> usize {
        CacheCore::limit(self)
    }

    fn timeout(&self) -> Duration {
        CacheCore::timeout(self)
    }

    fn snapshot(&self) -> HashMap<K, V> {
        CacheCore::snapshot(self)
    }

    fn stats(&self) -> CacheStats {
        CacheCore::stats(self)
    }
}
