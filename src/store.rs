//! Ordered backing map shared by every eviction policy.
//!
//! Entries live in an unbounded [`lru::LruCache`], which keeps a linked
//! order over a hash map: iteration from the back yields the oldest entry
//! first. Access-ordered policies promote entries on reads and re-puts;
//! every other policy leaves the order at insertion time.
//!
//! A store may also carry a weight budget: a weigher sizes each value, and
//! the store counts as full while the total weight, plus the weight of a
//! value about to be inserted, exceeds the budget.
//!
//! Removals made while the store is borrowed mutably are recorded and handed
//! back to the owning cache, which notifies its listener once the exclusive
//! lock is released.

use crate::entry::CacheEntry;
use crate::observability::RemovalCause;
use lru::LruCache;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// An entry taken out of the store, with the reason it left.
pub(crate) struct Removed<K, V> {
    pub(crate) entry: CacheEntry<K, V>,
    pub(crate) cause: RemovalCause,
}

/// Sizes a value for the weight budget.
pub type Weigher<V> = fn(&V) -> usize;

/// Entries plus the capacity and TTL bookkeeping a policy needs to prune.
pub struct Store<K, V> {
    entries: LruCache<K, CacheEntry<K, V>>,
    capacity: usize,
    default_ttl: Duration,
    per_entry_ttl: bool,
    weigher: Option<Weigher<V>>,
    max_weight: usize,
    weight: usize,
    /// Weight of the value being inserted, counted until the insert lands.
    pending_weight: usize,
    removed: Vec<Removed<K, V>>,
}

impl<K: Hash + Eq + Clone, V> Store<K, V> {
    pub(crate) fn new(capacity: usize, default_ttl: Duration) -> Self {
        Store {
            entries: LruCache::unbounded(),
            capacity,
            default_ttl,
            per_entry_ttl: false,
            weigher: None,
            max_weight: 0,
            weight: 0,
            pending_weight: 0,
            removed: Vec::new(),
        }
    }

    /// Bound the total weight of the values to `max_weight`; `0` disables
    /// the budget but keeps the weight tracked.
    pub(crate) fn set_weigher(&mut self, max_weight: usize, weigher: Weigher<V>) {
        self.max_weight = max_weight;
        self.weigher = Some(weigher);
        self.weight = self.entries.iter().map(|(_, entry)| weigher(entry.value())).sum();
    }

    /// Weight of `value`, `0` without a weigher.
    pub fn weigh(&self, value: &V) -> usize {
        self.weigher.map_or(0, |weigher| weigher(value))
    }

    /// Total weight of the stored values.
    pub fn weight(&self) -> usize {
        self.weight
    }

    /// Weight budget, `0` for none.
    pub fn max_weight(&self) -> usize {
        self.max_weight
    }

    /// Count `weight` against the budget ahead of the insert that brings it.
    pub(crate) fn reserve(&mut self, weight: usize) {
        self.pending_weight = weight;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries, `0` for unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// `true` once the entry count has reached a non-zero capacity, or the
    /// weight is over budget.
    pub fn is_full(&self) -> bool {
        (self.capacity > 0 && self.entries.len() >= self.capacity) || self.is_over_budget()
    }

    /// `true` when the store holds more entries than its capacity allows, or
    /// more weight than its budget.
    pub fn is_over_capacity(&self) -> bool {
        (self.capacity > 0 && self.entries.len() > self.capacity) || self.is_over_budget()
    }

    /// `true` when inserting `key` would grow the store past its capacity or
    /// its weight budget.
    pub fn is_really_full(&self, key: &K) -> bool {
        let count_full = self.capacity > 0 && self.entries.len() >= self.capacity;
        (count_full && !self.entries.contains(key)) || self.is_over_budget()
    }

    fn is_over_budget(&self) -> bool {
        self.max_weight > 0 && self.weight.saturating_add(self.pending_weight) > self.max_weight
    }

    /// Whether an expiration scan can find anything at all.
    ///
    /// False only when there is no default TTL and no `put` ever supplied
    /// its own.
    pub fn prune_expired_active(&self) -> bool {
        !self.default_ttl.is_zero() || self.per_entry_ttl
    }

    pub(crate) fn mark_per_entry_ttl(&mut self) {
        self.per_entry_ttl = true;
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Look up an entry without changing its position.
    pub fn peek(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.entries.peek(key)
    }

    /// Move an entry to the most recent position.
    pub(crate) fn promote(&mut self, key: &K) {
        self.entries.promote(key);
    }

    /// Insert an entry. A present key is replaced in place; `access_ordered`
    /// additionally moves it to the most recent position.
    pub(crate) fn insert(&mut self, entry: CacheEntry<K, V>, access_ordered: bool) {
        let key = entry.key().clone();
        self.pending_weight = 0;
        self.weight = self.weight.saturating_add(self.weigh(entry.value()));
        if let Some(slot) = self.entries.peek_mut(&key) {
            let previous = std::mem::replace(slot, entry);
            self.release(&previous);
            self.removed.push(Removed {
                entry: previous,
                cause: RemovalCause::Replaced,
            });
            if access_ordered {
                self.entries.promote(&key);
            }
        } else {
            self.entries.put(key, entry);
        }
    }

    /// Entries from oldest to newest position.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry<K, V>> + '_ {
        self.entries.iter().rev().map(|(_, entry)| entry)
    }

    /// The entry at the oldest position.
    pub fn oldest(&self) -> Option<&CacheEntry<K, V>> {
        self.entries.peek_lru().map(|(_, entry)| entry)
    }

    /// Remove `key` and record it under `cause`. Returns `false` if absent.
    pub fn evict(&mut self, key: &K, cause: RemovalCause) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                self.release(&entry);
                self.removed.push(Removed { entry, cause });
                true
            }
            None => false,
        }
    }

    /// Remove the entry at the oldest position, recorded as `Evicted`.
    pub fn evict_oldest(&mut self) -> bool {
        match self.entries.pop_lru() {
            Some((_, entry)) => {
                self.release(&entry);
                self.removed.push(Removed {
                    entry,
                    cause: RemovalCause::Evicted,
                });
                true
            }
            None => false,
        }
    }

    /// Remove every entry matching `predicate`, recording each under `cause`.
    pub fn evict_where<F>(&mut self, mut predicate: F, cause: RemovalCause) -> usize
    where
        F: FnMut(&CacheEntry<K, V>) -> bool,
    {
        let doomed: Vec<K> = self
            .iter()
            .filter(|entry| predicate(*entry))
            .map(|entry| entry.key().clone())
            .collect();

        doomed
            .iter()
            .filter(|key| self.evict(key, cause))
            .count()
    }

    /// Remove every entry expired as of now.
    pub fn evict_expired(&mut self) -> usize {
        let now = Instant::now();
        self.evict_where(|entry| entry.is_expired_at(now), RemovalCause::Expired)
    }

    /// Take an entry out without recording it.
    pub(crate) fn take(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        let entry = self.entries.pop(key)?;
        self.release(&entry);
        Some(entry)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.weight = 0;
    }

    fn release(&mut self, entry: &CacheEntry<K, V>) {
        self.weight = self.weight.saturating_sub(self.weigh(entry.value()));
    }

    pub(crate) fn drain_removed(&mut self) -> Vec<Removed<K, V>> {
        std::mem::take(&mut self.removed)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Store<K, V> {
    /// Copy of the current key/value pairs.
    pub(crate) fn snapshot(&self) -> HashMap<K, V> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value().clone()))
            .collect()
    }
}
