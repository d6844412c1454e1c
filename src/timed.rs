//! Time-only cache with optional scheduled pruning.
//!
//! A [`TimedCache`] has no capacity: entries leave when they expire, either
//! lazily on `get` or through `prune()`. [`schedule_prune`](TimedCache::schedule_prune)
//! runs `prune()` periodically on a background thread; at most one schedule
//! is active per cache.

use crate::cache::Cache;
use crate::core::CacheCore;
use crate::error::Result;
use crate::observability::{CacheStats, RemovalListener};
use crate::policy::Timed;
use crate::scheduler::{check_interval, PruneSchedule};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Unbounded cache whose entries expire after a default TTL.
///
/// # Example
///
/// ```no_run
/// use hoard::TimedCache;
/// use std::time::Duration;
///
/// let cache = TimedCache::new(Duration::from_secs(30));
/// cache.put("session", 42);
///
/// // Sweep expired entries every 5 seconds.
/// cache.schedule_prune(Duration::from_secs(5))?;
/// # Ok::<(), hoard::Error>(())
/// ```
pub struct TimedCache<K, V> {
    core: Arc<CacheCore<K, V, Timed>>,
    schedule: Mutex<Option<PruneSchedule>>,
}

impl<K, V> TimedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache applying `timeout` to every `put` that does not give
    /// its own TTL.
    pub fn new(timeout: Duration) -> Self {
        Self::from_core(CacheCore::with_policy(Timed, 0, timeout))
    }

    /// Like [`new`](Self::new), notifying `listener` of removals.
    ///
    /// Removals found by a scheduled prune are reported on the prune thread.
    /// The listener may still cancel or replace the schedule from there; the
    /// running prune finishes and no further tick follows.
    pub fn with_listener<L>(timeout: Duration, listener: L) -> Self
    where
        L: RemovalListener<K, V> + 'static,
    {
        Self::from_core(CacheCore::with_policy(Timed, 0, timeout).with_listener(listener))
    }

    fn from_core(core: CacheCore<K, V, Timed>) -> Self {
        TimedCache {
            core: Arc::new(core),
            schedule: Mutex::new(None),
        }
    }

    /// Prune every `interval`, starting immediately. Replaces any schedule
    /// already running, which is stopped first.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` if `interval` is zero; a running schedule
    ///   is left untouched
    /// - `Error::IoError` if the background thread cannot be started
    pub fn schedule_prune(&self, interval: Duration) -> Result<()> {
        check_interval(interval)?;
        self.cancel_prune_schedule();

        let core = Arc::clone(&self.core);
        let schedule = PruneSchedule::start(interval, move || core.prune())?;
        // A concurrent call may have installed its own schedule meanwhile.
        let raced = self.schedule.lock().replace(schedule);
        if let Some(raced) = raced {
            raced.stop();
        }
        Ok(())
    }

    /// Stop the scheduled prune, if any.
    pub fn cancel_prune_schedule(&self) {
        // Stopping joins the prune thread, whose listener may need the slot.
        let schedule = self.schedule.lock().take();
        if let Some(schedule) = schedule {
            schedule.stop();
        }
    }

    pub fn is_prune_scheduled(&self) -> bool {
        self.schedule
            .lock()
            .as_ref()
            .is_some_and(PruneSchedule::is_running)
    }

    /// The underlying container.
    pub fn core(&self) -> &CacheCore<K, V, Timed> {
        &self.core
    }

    pub fn put(&self, key: K, value: V) {
        self.core.put(key, value);
    }

    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.core.put_with_ttl(key, value, ttl);
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.core.get(key)
    }

    pub fn get_with(&self, key: &K, update_last_access: bool) -> Option<V> {
        self.core.get_with(key, update_last_access)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.core.remove(key)
    }

    pub fn clear(&self) {
        self.core.clear();
    }

    /// Remove every expired entry.
    pub fn prune(&self) -> Result<usize> {
        self.core.prune()
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.core.timeout()
    }

    pub fn snapshot(&self) -> HashMap<K, V> {
        self.core.snapshot()
    }

    pub fn stats(&self) -> CacheStats {
        self.core.stats()
    }
}

impl<K, V> Cache<K, V> for TimedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn put(&self, key: K, value: V) {
        self.core.put(key, value)
    }

    fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.core.put_with_ttl(key, value, ttl)
    }

    fn get_with(&self, key: &K, update_last_access: bool) -> Option<V> {
        self.core.get_with(key, update_last_access)
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.core.remove(key)
    }

    fn clear(&self) {
        self.core.clear()
    }

    fn prune(&self) -> Result<usize> {
        self.core.prune()
    }

    fn len(&self) -> usize {
        self.core.len()
    }

    fn is_full(&self) -> bool {
        false
    }

    fn limit(&self) -> usize {
        0
    }

    fn timeout(&self) -> Duration {
        self.core.timeout()
    }

    fn snapshot(&self) -> HashMap<K, V> {
        self.core.snapshot()
    }

    fn stats(&self) -> CacheStats {
        self.core.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::observability::RemovalCause;
    use std::sync::{OnceLock, Weak};

    #[test]
    fn test_timed_entries_expire() {
        let cache = TimedCache::new(Duration::from_millis(30));
        cache.put("a", 1);
        cache.put_with_ttl("b", 2, Duration::ZERO);
        assert_eq!(cache.get(&"a"), Some(1));

        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_timed_prune_is_flat_scan() {
        let cache = TimedCache::new(Duration::from_millis(20));
        for i in 0..10 {
            cache.put(i, i);
        }
        cache.put_with_ttl(100, 100, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.prune().expect("prune"), 10);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_timed_is_unbounded() {
        let cache: TimedCache<u32, u32> = TimedCache::new(Duration::from_secs(1));
        for i in 0..500 {
            cache.put(i, i);
        }
        assert_eq!(cache.len(), 500);
        assert_eq!(Cache::limit(&cache), 0);
        assert!(!Cache::is_full(&cache));
    }

    #[test]
    fn test_schedule_prune_sweeps_in_background() {
        let cache = TimedCache::new(Duration::from_millis(20));
        cache.put("a", 1);
        cache.put("b", 2);

        cache
            .schedule_prune(Duration::from_millis(10))
            .expect("Failed to schedule");
        assert!(cache.is_prune_scheduled());

        std::thread::sleep(Duration::from_millis(100));
        // Swept without any get() touching the entries.
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().misses, 0);

        cache.cancel_prune_schedule();
        assert!(!cache.is_prune_scheduled());
    }

    #[test]
    fn test_schedule_prune_replaces_previous() {
        let cache: TimedCache<u32, u32> = TimedCache::new(Duration::from_secs(1));
        cache
            .schedule_prune(Duration::from_millis(10))
            .expect("Failed to schedule");
        cache
            .schedule_prune(Duration::from_millis(50))
            .expect("Failed to reschedule");

        let interval = cache.schedule.lock().as_ref().map(PruneSchedule::interval);
        assert_eq!(interval, Some(Duration::from_millis(50)));
        cache.cancel_prune_schedule();
        cache.cancel_prune_schedule();
    }

    #[test]
    fn test_listener_can_cancel_schedule_from_prune_thread() {
        let handle: Arc<OnceLock<Weak<TimedCache<u32, u32>>>> = Arc::new(OnceLock::new());
        let listener_handle = Arc::clone(&handle);
        let cache = Arc::new(TimedCache::with_listener(
            Duration::from_millis(10),
            move |_: &u32, _: &u32, cause: RemovalCause| {
                if cause != RemovalCause::Expired {
                    return;
                }
                if let Some(cache) = listener_handle.get().and_then(Weak::upgrade) {
                    cache.cancel_prune_schedule();
                }
            },
        ));
        handle
            .set(Arc::downgrade(&cache))
            .expect("Failed to register cache");

        cache.put(1, 1);
        cache
            .schedule_prune(Duration::from_millis(5))
            .expect("Failed to schedule");

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(cache.len(), 0);
        assert!(!cache.is_prune_scheduled());
    }

    #[test]
    fn test_huge_timeout_is_served() {
        let cache = TimedCache::new(Duration::from_secs(u64::MAX / 2));
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.prune().expect("prune"), 0);
    }

    #[test]
    fn test_schedule_prune_rejects_zero_interval() {
        let cache: TimedCache<u32, u32> = TimedCache::new(Duration::from_secs(1));
        cache
            .schedule_prune(Duration::from_millis(10))
            .expect("Failed to schedule");

        let result = cache.schedule_prune(Duration::ZERO);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(cache.is_prune_scheduled());
    }
}
