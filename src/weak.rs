//! Unbounded cache over weakly held values.
//!
//! The cache keeps a [`Weak`] to each value, so it never extends a value's
//! lifetime: once every caller's [`Arc`] is dropped the entry is dead. Dead
//! entries are removed when `get` finds them (reported as
//! [`RemovalCause::Reclaimed`]) and by an amortised sweep on `put`, which runs
//! whenever the map has grown to twice its size after the previous sweep.

use crate::cache::Cache;
use crate::core::CacheCore;
use crate::error::Result;
use crate::observability::{CacheStats, RemovalCause, RemovalListener};
use crate::policy::Unbounded;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

const MIN_SWEEP_AT: usize = 16;

/// Cache that holds values only while something else does.
///
/// ```
/// use hoard::WeakCache;
/// use std::sync::Arc;
///
/// let cache = WeakCache::new();
/// let value = Arc::new(String::from("shared"));
/// cache.put("k", Arc::clone(&value));
/// assert!(cache.get(&"k").is_some());
///
/// drop(value);
/// assert!(cache.get(&"k").is_none());
/// ```
pub struct WeakCache<K, T> {
    core: CacheCore<K, Weak<T>, Unbounded>,
    sweep_at: AtomicUsize,
}

impl<K, T> WeakCache<K, T>
where
    K: Hash + Eq + Clone + Send + Sync,
    T: Send + Sync,
{
    pub fn new() -> Self {
        Self::from_core(CacheCore::with_policy(Unbounded, 0, Duration::ZERO))
    }

    /// Create a cache notifying `listener` of removals. The listener sees the
    /// stored `Weak`, which is dead for `Reclaimed` removals.
    pub fn with_listener<L>(listener: L) -> Self
    where
        L: RemovalListener<K, Weak<T>> + 'static,
    {
        Self::from_core(CacheCore::with_policy(Unbounded, 0, Duration::ZERO).with_listener(listener))
    }

    fn from_core(core: CacheCore<K, Weak<T>, Unbounded>) -> Self {
        WeakCache {
            core,
            sweep_at: AtomicUsize::new(MIN_SWEEP_AT),
        }
    }

    /// Store a weak reference to `value`. Any TTL is ignored.
    pub fn put(&self, key: K, value: Arc<T>) {
        let weak = Arc::downgrade(&value);
        drop(value);
        self.core.put(key, weak);
        self.maybe_sweep();
    }

    /// Fetch the value if it is still alive.
    pub fn get(&self, key: &K) -> Option<Arc<T>> {
        self.get_with(key, true)
    }

    pub fn get_with(&self, key: &K, update_last_access: bool) -> Option<Arc<T>> {
        // The value can die between the staleness check and the upgrade; that
        // is indistinguishable from dying just after a hit.
        self.core
            .get_with(key, update_last_access)
            .and_then(|weak| weak.upgrade())
    }

    /// Remove `key`, returning the value if it was still alive.
    pub fn remove(&self, key: &K) -> Option<Arc<T>> {
        self.core.remove(key).and_then(|weak| weak.upgrade())
    }

    pub fn clear(&self) {
        self.core.clear();
        self.sweep_at.store(MIN_SWEEP_AT, Ordering::Relaxed);
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.core.contains_key(key)
    }

    /// Number of entries whose value is still alive.
    pub fn len(&self) -> usize {
        self.core.count_where(|entry| entry.value().strong_count() > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every dead entry now and return how many were removed.
    pub fn purge_reclaimed(&self) -> usize {
        let count = self.core.evict_where(
            |entry| entry.value().strong_count() == 0,
            RemovalCause::Reclaimed,
        );
        let live = self.core.len();
        self.sweep_at
            .store((live * 2).max(MIN_SWEEP_AT), Ordering::Relaxed);
        if count > 0 {
            debug!("UNBOUNDED SWEEP removed {} reclaimed entries", count);
        }
        count
    }

    /// Live key/value pairs.
    pub fn snapshot(&self) -> HashMap<K, Arc<T>> {
        self.core
            .snapshot()
            .into_iter()
            .filter_map(|(key, weak)| weak.upgrade().map(|value| (key, value)))
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.len(),
            ..self.core.stats()
        }
    }

    fn maybe_sweep(&self) {
        if self.core.len() >= self.sweep_at.load(Ordering::Relaxed) {
            self.purge_reclaimed();
        }
    }
}

impl<K, T> Default for WeakCache<K, T>
where
    K: Hash + Eq + Clone + Send + Sync,
    T: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Cache<K, Arc<T>> for WeakCache<K, T>
where
    K: Hash + Eq + Clone + Send + Sync,
    T: Send + Sync,
{
    fn put(&self, key: K, value: Arc<T>) {
        WeakCache::put(self, key, value)
    }

    fn put_with_ttl(&self, key: K, value: Arc<T>, _ttl: Duration) {
        WeakCache::put(self, key, value)
    }

    fn get_with(&self, key: &K, update_last_access: bool) -> Option<Arc<T>> {
        WeakCache::get_with(self, key, update_last_access)
    }

    fn remove(&self, key: &K) -> Option<Arc<T>> {
        WeakCache::remove(self, key)
    }

    fn clear(&self) {
        WeakCache::clear(self)
    }

    fn prune(&self) -> Result<usize> {
        self.core.prune()
    }

    fn len(&self) -> usize {
        WeakCache::len(self)
    }

    fn is_full(&self) -> bool {
        false
    }

    fn limit(&self) -> usize {
        0
    }

    fn timeout(&self) -> Duration {
        Duration::ZERO
    }

    fn snapshot(&self) -> HashMap<K, Arc<T>> {
        WeakCache::snapshot(self)
    }

    fn stats(&self) -> CacheStats {
        WeakCache::stats(self)
    }
}
