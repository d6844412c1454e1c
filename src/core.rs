//! Generic cache container.
//!
//! [`CacheCore`] owns the entries, the capacity and default TTL, and the
//! hit/miss counters. A single structure-wide [`RwLock`] guards the store:
//!
//! - `get` takes the shared lock (the exclusive one for access-ordered
//!   policies, which reorder on every read). Finding a stale entry, it
//!   releases the shared lock, takes the exclusive one and re-checks before
//!   removing: another thread may have removed or replaced the entry in
//!   between.
//! - `put`, `remove`, `clear`, `prune` and `snapshot` hold the exclusive lock
//!   for their whole duration.
//!
//! Removal listeners run after the lock is released.

use crate::entry::CacheEntry;
use crate::error::Result;
use crate::observability::{CacheStats, NoOpListener, RemovalCause, RemovalListener};
use crate::policy::EvictionPolicy;
use crate::store::{Removed, Store, Weigher};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Outcome of a lookup made under the shared lock.
enum Lookup<V> {
    Missing,
    Stale,
    Hit(V),
}

/// Thread-safe cache parameterised by an [`EvictionPolicy`].
///
/// Use the aliases [`FifoCache`](crate::FifoCache), [`LruCache`](crate::LruCache)
/// and [`LfuCache`](crate::LfuCache) for the capacity-bounded variants.
///
/// # Example
///
/// ```
/// use hoard::LruCache;
/// use std::time::Duration;
///
/// let cache = LruCache::with_timeout(2, Duration::from_secs(60));
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.get(&"a");
/// cache.put("c", 3);
///
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.get(&"a"), Some(1));
/// ```
pub struct CacheCore<K, V, P> {
    store: RwLock<Store<K, V>>,
    policy: P,
    capacity: usize,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    listener: Box<dyn RemovalListener<K, V>>,
}

impl<K, V, P> CacheCore<K, V, P>
where
    K: Hash + Eq + Clone,
    V: Clone,
    P: EvictionPolicy<K, V>,
{
    /// Create a cache with an explicit policy.
    ///
    /// `capacity == 0` means unbounded; `default_ttl == 0` means entries
    /// never expire unless a `put` supplies its own TTL.
    pub fn with_policy(policy: P, capacity: usize, default_ttl: Duration) -> Self {
        CacheCore {
            store: RwLock::new(Store::new(capacity, default_ttl)),
            policy,
            capacity,
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            listener: Box::new(NoOpListener),
        }
    }

    /// Set the removal listener.
    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: RemovalListener<K, V> + 'static,
    {
        self.listener = Box::new(listener);
        self
    }

    /// Bound the total weight of the values as sized by `weigher`.
    ///
    /// The cache counts as full while its weight would exceed `max_weight`
    /// once the incoming value is added, so the policy evicts by weight as
    /// well as by entry count. `0` tracks the weight without bounding it.
    pub fn with_weigher(mut self, max_weight: usize, weigher: Weigher<V>) -> Self {
        self.store.get_mut().set_weigher(max_weight, weigher);
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Store `value` under `key` with the default TTL.
    pub fn put(&self, key: K, value: V) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key` with its own TTL; zero means it never
    /// expires.
    ///
    /// If the key is new and the cache is full, the policy prunes first.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let ttl = self.policy.admit_ttl(ttl);
        let removed = {
            let mut store = self.store.write();
            if !ttl.is_zero() && ttl != self.default_ttl {
                store.mark_per_entry_ttl();
            }
            let incoming = store.weigh(&value);
            store.reserve(incoming);

            // One round frees an entry slot; a weight budget may need several.
            let mut pruned = 0;
            while store.is_really_full(&key) {
                match self.policy.prune_cache(&mut store) {
                    Ok(0) => break,
                    Ok(count) => pruned += count,
                    Err(e) => {
                        warn!("{} prune before insert failed: {}", self.policy.name(), e);
                        break;
                    }
                }
            }
            if pruned > 0 {
                debug!("{} full, pruned {} entries", self.policy.name(), pruned);
            }

            store.insert(CacheEntry::new(key, value, ttl), self.policy.access_ordered());
            self.policy.after_insert(&mut store);
            store.drain_removed()
        };
        self.notify(removed);
    }

    /// Fetch the value for `key`, refreshing its last-access time.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with(key, true)
    }

    /// Fetch the value for `key`.
    ///
    /// A stale entry is removed and counted as a miss. On a hit the access
    /// count is incremented, and the last-access time too unless
    /// `update_last_access` is `false`.
    pub fn get_with(&self, key: &K, update_last_access: bool) -> Option<V> {
        let (lookup, removed) = if self.policy.access_ordered() {
            let mut store = self.store.write();
            let lookup = self.lookup(&store, key, update_last_access);
            match lookup {
                Lookup::Hit(_) => store.promote(key),
                Lookup::Stale => self.evict_stale(&mut store, key),
                Lookup::Missing => {}
            }
            (lookup, store.drain_removed())
        } else {
            let store = self.store.read();
            let lookup = self.lookup(&store, key, update_last_access);
            if let Lookup::Stale = lookup {
                let mut store = self.upgrade(store);
                self.evict_stale(&mut store, key);
                (lookup, store.drain_removed())
            } else {
                (lookup, Vec::new())
            }
        };
        self.notify(removed);

        match lookup {
            Lookup::Hit(value) => {
                self.record_hit();
                Some(value)
            }
            Lookup::Missing | Lookup::Stale => {
                self.record_miss();
                None
            }
        }
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let entry = self.store.write().take(key)?;
        let (key, value) = entry.into_parts();
        self.listener.on_remove(&key, &value, RemovalCause::Explicit);
        Some(value)
    }

    /// Drop every entry. Counters are kept and listeners are not notified.
    pub fn clear(&self) {
        let mut store = self.store.write();
        let count = store.len();
        store.clear();
        debug!("{} CLEAR dropped {} entries", self.policy.name(), count);
    }

    /// Run the policy's cleanup pass, whether or not the cache is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::Unsupported)` for policies that cannot be pruned.
    pub fn prune(&self) -> Result<usize> {
        let (result, removed) = {
            let mut store = self.store.write();
            let result = self.policy.prune_cache(&mut store);
            (result, store.drain_removed())
        };
        self.notify(removed);

        let count = result?;
        debug!("{} PRUNE removed {} entries", self.policy.name(), count);
        Ok(count)
    }

    /// `true` if `key` is present and not stale. Does not count as a lookup.
    pub fn contains_key(&self, key: &K) -> bool {
        self.store
            .read()
            .peek(key)
            .is_some_and(|entry| !self.policy.is_stale(entry))
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// `true` once a bounded cache holds `limit()` entries; always `false`
    /// when unbounded.
    pub fn is_full(&self) -> bool {
        self.store.read().is_full()
    }

    /// Capacity, `0` for unbounded.
    pub fn limit(&self) -> usize {
        self.capacity
    }

    /// Default TTL, zero when entries do not expire by default.
    pub fn timeout(&self) -> Duration {
        self.default_ttl
    }

    /// Total weight of the values, `0` without a weigher.
    pub fn weight(&self) -> usize {
        self.store.read().weight()
    }

    /// Weight budget, `0` for none.
    pub fn max_weight(&self) -> usize {
        self.store.read().max_weight()
    }

    /// Point-in-time copy of all key/value pairs, stale entries included.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.store.write().snapshot()
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hit_count(),
            misses: self.miss_count(),
            len: self.len(),
            capacity: self.capacity,
        }
    }

    /// Count entries matching `predicate` under the shared lock.
    pub(crate) fn count_where<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&&CacheEntry<K, V>) -> bool,
    {
        self.store.read().iter().filter(predicate).count()
    }

    /// Remove entries matching `predicate`, notifying the listener.
    pub(crate) fn evict_where<F>(&self, predicate: F, cause: RemovalCause) -> usize
    where
        F: FnMut(&CacheEntry<K, V>) -> bool,
    {
        let (count, removed) = {
            let mut store = self.store.write();
            let count = store.evict_where(predicate, cause);
            (count, store.drain_removed())
        };
        self.notify(removed);
        count
    }

    fn lookup(&self, store: &Store<K, V>, key: &K, update_last_access: bool) -> Lookup<V> {
        match store.peek(key) {
            None => Lookup::Missing,
            Some(entry) if self.policy.is_stale(entry) => Lookup::Stale,
            Some(entry) => Lookup::Hit(entry.touch(update_last_access).clone()),
        }
    }

    /// Swap a shared guard for the exclusive one.
    ///
    /// The shared guard is released first; callers must re-validate whatever
    /// they observed under it.
    fn upgrade<'a>(
        &'a self,
        guard: RwLockReadGuard<'a, Store<K, V>>,
    ) -> RwLockWriteGuard<'a, Store<K, V>> {
        drop(guard);
        self.store.write()
    }

    /// Remove `key` if it is still stale; it may have been removed or
    /// replaced since the shared lock was released.
    fn evict_stale(&self, store: &mut Store<K, V>, key: &K) {
        if store.peek(key).is_some_and(|entry| self.policy.is_stale(entry)) {
            store.evict(key, self.policy.stale_cause());
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        trace!("{} GET -> HIT", self.policy.name());
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("{} GET -> MISS", self.policy.name());
    }

    fn notify(&self, removed: Vec<Removed<K, V>>) {
        for Removed { entry, cause } in removed {
            let (key, value) = entry.into_parts();
            self.listener.on_remove(&key, &value, cause);
        }
    }
}
