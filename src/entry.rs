//! Cache entry with time-to-live and access bookkeeping.
//!
//! Key and value are fixed at construction. The last-access timestamp and the
//! access counter are atomics so that a read holding only the shared lock can
//! update them. Concurrent readers of the same entry may interleave; the
//! values are eviction heuristics, not exact counts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A single cached key/value pair.
#[derive(Debug)]
pub struct CacheEntry<K, V> {
    key: K,
    value: V,
    ttl: Duration,
    created_at: Instant,
    /// Nanoseconds between `created_at` and the last access.
    last_access: AtomicU64,
    access_count: AtomicU64,
}

impl<K, V> CacheEntry<K, V> {
    /// Create an entry. A zero `ttl` means the entry never expires on its own.
    pub fn new(key: K, value: V, ttl: Duration) -> Self {
        CacheEntry {
            key,
            value,
            ttl,
            created_at: Instant::now(),
            last_access: AtomicU64::new(0),
            access_count: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// The cached value, without touching access bookkeeping.
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Instant of the last recorded access (construction counts as one).
    pub fn last_access(&self) -> Instant {
        self.created_at + Duration::from_nanos(self.last_access.load(Ordering::Relaxed))
    }

    /// Number of reads recorded through [`touch`](Self::touch), net of LFU decay.
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    /// Instant after which the entry counts as expired, if it has a TTL.
    ///
    /// A deadline past the range of `Instant` is treated as never.
    pub fn expires_at(&self) -> Option<Instant> {
        if self.ttl.is_zero() {
            None
        } else {
            self.last_access().checked_add(self.ttl)
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// `true` when the entry has a TTL and `now` is past `last_access + ttl`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at().is_some_and(|deadline| now > deadline)
    }

    /// Record a read and return the value.
    ///
    /// The access counter is always incremented; the timestamp only when
    /// `update_last_access` is set.
    pub fn touch(&self, update_last_access: bool) -> &V {
        if update_last_access {
            let elapsed = Instant::now().saturating_duration_since(self.created_at);
            let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
            self.last_access.store(nanos, Ordering::Relaxed);
        }
        self.access_count.fetch_add(1, Ordering::Relaxed);
        &self.value
    }

    /// Subtract `by` from the access counter, saturating at zero, and return
    /// the new count.
    pub(crate) fn decay(&self, by: u64) -> u64 {
        let previous = self
            .access_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                Some(count.saturating_sub(by))
            })
            .unwrap_or_else(|count| count);
        previous.saturating_sub(by)
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = CacheEntry::new("k", 1, Duration::ZERO);
        assert!(!entry.is_expired());
        assert!(!entry.is_expired_at(Instant::now() + Duration::from_secs(3600 * 24 * 365)));
        assert_eq!(entry.expires_at(), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new("k", 1, Duration::from_secs(10));
        assert!(!entry.is_expired());
        assert!(!entry.is_expired_at(entry.last_access() + Duration::from_secs(10)));
        assert!(entry.is_expired_at(entry.last_access() + Duration::from_secs(11)));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let entry = CacheEntry::new("k", 1, Duration::MAX);
        assert_eq!(entry.expires_at(), None);
        assert!(!entry.is_expired());

        entry.touch(true);
        assert!(!entry.is_expired_at(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn test_touch_counts_reads() {
        let entry = CacheEntry::new("k", "v", Duration::ZERO);
        assert_eq!(entry.access_count(), 0);

        assert_eq!(*entry.touch(true), "v");
        entry.touch(false);
        entry.touch(true);

        assert_eq!(entry.access_count(), 3);
    }

    #[test]
    fn test_touch_without_update_keeps_timestamp() {
        let entry = CacheEntry::new("k", "v", Duration::from_millis(50));
        let before = entry.last_access();

        std::thread::sleep(Duration::from_millis(5));
        entry.touch(false);
        assert_eq!(entry.last_access(), before);

        entry.touch(true);
        assert!(entry.last_access() > before);
    }

    #[test]
    fn test_touch_extends_deadline() {
        let entry = CacheEntry::new("k", "v", Duration::from_millis(30));
        let first_deadline = entry.expires_at().expect("has ttl");

        std::thread::sleep(Duration::from_millis(10));
        entry.touch(true);

        assert!(entry.expires_at().expect("has ttl") > first_deadline);
    }

    #[test]
    fn test_decay_saturates() {
        let entry = CacheEntry::new("k", "v", Duration::ZERO);
        for _ in 0..5 {
            entry.touch(false);
        }

        assert_eq!(entry.decay(2), 3);
        assert_eq!(entry.decay(10), 0);
        assert_eq!(entry.access_count(), 0);
    }

    #[test]
    fn test_into_parts() {
        let entry = CacheEntry::new("key".to_string(), vec![1u8, 2], Duration::ZERO);
        let (key, value) = entry.into_parts();
        assert_eq!(key, "key");
        assert_eq!(value, vec![1, 2]);
    }
}
