//! # LRU Cache
//!
//! Bounded map that evicts the least-recently-used entry first.
//!
//! Recency is tracked with a monotonically increasing stamp per entry and
//! an ordered index from stamp to key, so `get`, `insert` and eviction are
//! all O(log n) with no unsafe linked lists.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A stored value with its recency stamp.
#[derive(Debug)]
struct Slot<V> {
    value: V,
    /// Recency stamp (higher = more recent).
    stamp: u64,
    /// When the value was written, for TTL expiry.
    written_at: Instant,
}

/// Least-recently-used cache with an optional time-to-live.
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// Maximum number of entries.
    capacity: usize,
    /// Entries older than this are treated as absent.
    ttl: Option<Duration>,
    /// Stored entries.
    entries: HashMap<K, Slot<V>>,
    /// Stamp -> key, oldest first.
    order: BTreeMap<u64, K>,
    /// Next recency stamp.
    clock: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl: None,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            clock: 0,
        }
    }

    /// Creates a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        let mut cache = Self::new(capacity);
        cache.ttl = Some(ttl);
        cache
    }

    /// Maximum number of entries.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries (expired entries included until touched).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a value and marks it most-recently-used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_expired(key) {
            self.remove(key);
            return None;
        }

        self.clock += 1;
        let stamp = self.clock;
        let slot = self.entries.get_mut(key)?;
        let previous = std::mem::replace(&mut slot.stamp, stamp);
        if let Some(owned) = self.order.remove(&previous) {
            self.order.insert(stamp, owned);
        }
        Some(&slot.value)
    }

    /// Returns a value without touching recency.
    #[must_use]
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_expired(key) {
            return None;
        }
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Returns true if a live entry exists for the key.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek(key).is_some()
    }

    /// Inserts a value as most-recently-used.
    ///
    /// Returns the entry evicted to make room, if any. Overwriting an
    /// existing key never evicts.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.clock += 1;
        let stamp = self.clock;
        let now = Instant::now();

        if let Some(slot) = self.entries.get_mut(&key) {
            let previous = std::mem::replace(&mut slot.stamp, stamp);
            slot.value = value;
            slot.written_at = now;
            if let Some(owned) = self.order.remove(&previous) {
                self.order.insert(stamp, owned);
            }
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        self.order.insert(stamp, key.clone());
        self.entries.insert(
            key,
            Slot {
                value,
                stamp,
                written_at: now,
            },
        );
        evicted
    }

    /// Removes an entry.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.stamp);
        Some(slot.value)
    }

    /// Removes and returns the least-recently-used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.entries.remove(&key)?;
        Some((key, slot.value))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn is_expired<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match (self.ttl, self.entries.get(key)) {
            (Some(ttl), Some(slot)) => slot.written_at.elapsed() > ttl,
            _ => false,
        }
    }
}
