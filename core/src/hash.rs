//! Structural hashing and a hash-bucketed deduplication cache.
//!
//! Hashes are used only to narrow a lookup. Every hit is confirmed with a
//! full equality check, so two distinct values that happen to share a hash
//! never alias each other in a [`StructuralCache`].

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hash a value by its structure.
///
/// Deterministic within a process. Equal values always produce equal hashes.
pub fn structural_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash a raw byte block.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write(bytes);
    hasher.finish()
}

/// Mix `value` into `seed`. Not commutative.
pub fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// Hash a sequence of already-hashed elements in order.
///
/// The element count is folded in first so that a prefix never collides
/// trivially with the full sequence.
pub fn hash_sequence<I>(hashes: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let mut count = 0u64;
    let mut seed = 0u64;
    for h in hashes {
        seed = hash_combine(seed, h);
        count += 1;
    }
    hash_combine(count, seed)
}

/// Cache that maps structurally-equal keys to one shared value.
///
/// Keys are bucketed by [`structural_hash`]; lookups compare against every
/// key in the bucket so hash collisions cannot produce false hits.
///
/// Not internally synchronized apart from its statistics. Callers that share
/// a cache wrap it in a `parking_lot::RwLock` and probe with
/// [`get`](Self::get) under the read lock before taking the write lock for
/// insertion; hits found under the read lock are counted too.
pub struct StructuralCache<K, V> {
    buckets: HashMap<u64, Vec<(Arc<K>, V)>>,
    len: usize,
    hits: AtomicU64,
    misses: u64,
}

impl<K: Hash + Eq, V: Clone> StructuralCache<K, V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            len: 0,
            hits: AtomicU64::new(0),
            misses: 0,
        }
    }

    /// Look up a value for `key` without inserting.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_hashed(structural_hash(key), key)
    }

    /// Look up using a precomputed hash.
    pub fn get_hashed(&self, hash: u64, key: &K) -> Option<V> {
        let value = self
            .buckets
            .get(&hash)?
            .iter()
            .find(|(k, _)| **k == *key)
            .map(|(_, v)| v.clone())?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Return the cached value for `key`, creating it with `make` on a miss.
    ///
    /// `make` receives the canonical `Arc<K>` that the cache retains.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> V
    where
        F: FnOnce(&Arc<K>) -> V,
    {
        let hash = structural_hash(&key);
        self.get_or_try_insert_with::<_, std::convert::Infallible>(hash, key, |k| Ok(make(k)))
            .unwrap_or_else(|never| match never {})
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// If `make` fails nothing is inserted and the error is returned.
    pub fn get_or_try_insert_with<F, E>(&mut self, hash: u64, key: K, make: F) -> Result<V, E>
    where
        F: FnOnce(&Arc<K>) -> Result<V, E>,
    {
        if let Some(hit) = self.get_hashed(hash, &key) {
            return Ok(hit);
        }

        let key = Arc::new(key);
        let value = make(&key)?;
        self.buckets
            .entry(hash)
            .or_default()
            .push((key, value.clone()));
        self.len += 1;
        self.misses += 1;
        Ok(value)
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that inserted a new entry.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop every entry and reset statistics.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
        self.hits.store(0, Ordering::Relaxed);
        self.misses = 0;
    }
}

impl<K: Hash + Eq, V: Clone> Default for StructuralCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for StructuralCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralCache")
            .field("len", &self.len)
            .field("buckets", &self.buckets.len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses)
            .finish()
    }
}
