//! A small thread-safe LRU cache.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::hash::Hash;

/// Hit and miss counters of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  /// Lookups answered from the cache.
  pub hits: u64,
  /// Lookups that found nothing.
  pub misses: u64,
}

#[derive(Debug)]
struct Inner<K, V> {
  // Least recently used first.
  entries: IndexMap<K, V>,
  stats: CacheStats,
}

/// A capacity-bounded map that evicts the least recently used entry.
///
/// All methods take `&self`; the cache can be shared between threads.
#[derive(Debug)]
pub struct LruCache<K, V> {
  capacity: usize,
  inner: Mutex<Inner<K, V>>,
}

impl<K, V> LruCache<K, V>
where
  K: Hash + Eq,
  V: Clone,
{
  /// Creates a cache holding at most `capacity` entries.
  pub fn new(capacity: usize) -> Result<Self> {
    if capacity == 0 {
      return Err(Error::ZeroCapacity);
    }
    Ok(Self {
      capacity,
      inner: Mutex::new(Inner {
        entries: IndexMap::with_capacity(capacity),
        stats: CacheStats::default(),
      }),
    })
  }

  /// Maximum number of entries.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Current number of entries.
  pub fn len(&self) -> usize {
    self.inner.lock().entries.len()
  }

  /// Returns `true` if the cache holds nothing.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Hit and miss counters so far.
  pub fn stats(&self) -> CacheStats {
    self.inner.lock().stats
  }

  /// Looks up `key` and marks it as most recently used.
  pub fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let mut guard = self.inner.lock();
    let inner = &mut *guard;
    match inner.entries.get_index_of(key) {
      Some(index) => {
        inner.stats.hits += 1;
        let last = inner.entries.len() - 1;
        inner.entries.move_index(index, last);
        inner.entries.get_index(last).map(|(_, v)| v.clone())
      }
      None => {
        inner.stats.misses += 1;
        None
      }
    }
  }

  /// Inserts or replaces `key`, evicting the least recently used entry when full.
  pub fn insert(&self, key: K, value: V) {
    let mut inner = self.inner.lock();
    if let Some(index) = inner.entries.get_index_of(&key) {
      inner.entries.shift_remove_index(index);
    } else if inner.entries.len() >= self.capacity {
      inner.entries.shift_remove_index(0);
    }
    inner.entries.insert(key, value);
  }

  /// Returns the cached value for `key`, computing and storing it on a miss.
  ///
  /// `compute` runs without holding the lock.
  pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
  where
    F: FnOnce() -> V,
  {
    if let Some(v) = self.get(&key) {
      return v;
    }
    let value = compute();
    self.insert(key, value.clone());
    value
  }

  /// Drops every entry. Counters are kept.
  pub fn clear(&self) {
    self.inner.lock().entries.clear();
  }
}
