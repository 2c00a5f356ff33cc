//! Bounded, thread-safe LRU memo cache keyed by string.
//!
//! Both the identity lookup and the preauth decision are memoized through
//! [`LruCache`]. The lock is released while the loader runs, so a slow
//! network call for one key never stalls lookups for another. Each
//! [`LruCache::clear`] bumps a generation counter; a loader that started
//! before the clear does not write its result back.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Counters reported by [`LruCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

struct Slot<V> {
    value: V,
    last_used: u64,
}

struct Inner<V> {
    entries: HashMap<String, Slot<V>>,
    hits: u64,
    misses: u64,
    /// Monotonic access clock for recency ordering.
    tick: u64,
    generation: u64,
}

impl<V: Clone> Inner<V> {
    fn touch(&mut self, key: &str) -> Option<V> {
        self.tick += 1;
        let tick = self.tick;
        let slot = self.entries.get_mut(key)?;
        slot.last_used = tick;
        Some(slot.value.clone())
    }

    fn insert(&mut self, key: &str, value: V, capacity: usize) {
        if !self.entries.contains_key(key) && self.entries.len() >= capacity {
            self.evict_lru();
        }
        self.tick += 1;
        self.entries.insert(
            key.to_string(),
            Slot {
                value,
                last_used: self.tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        if let Some(oldest) = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&oldest);
        }
    }
}

/// Least-recently-used cache with hit/miss counters.
pub struct LruCache<V> {
    capacity: usize,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> LruCache<V> {
    /// Create an empty cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                tick: 0,
                generation: 0,
            }),
        }
    }

    // Every mutation leaves `Inner` consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value for `key`, or run `load` and cache its result.
    ///
    /// Errors from `load` are returned to the caller and never cached.
    pub fn get_or_try_insert_with<E, F>(&self, key: &str, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let generation = {
            let mut inner = self.lock();
            if let Some(value) = inner.touch(key) {
                inner.hits += 1;
                return Ok(value);
            }
            inner.misses += 1;
            inner.generation
        };

        let value = load()?;

        let mut inner = self.lock();
        if inner.generation == generation {
            inner.insert(key, value.clone(), self.capacity);
        }
        Ok(value)
    }

    /// Infallible form of [`get_or_try_insert_with`](Self::get_or_try_insert_with).
    pub fn get_or_insert_with<F>(&self, key: &str, load: F) -> V
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_insert_with::<Infallible, _>(key, || Ok(load())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Look up without loading. Counts as a hit or miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let found = inner.touch(key);
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.generation += 1;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            capacity: self.capacity,
            size: inner.entries.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
