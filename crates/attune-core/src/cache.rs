//! Process-lifetime memoization.
//!
//! Unbounded: entries are never evicted. Used for small key spaces only
//! (pose names, spoken feedback strings).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Key-value cache that keeps every successfully computed value.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> MemoCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached value for `key`, computing it with `f` on a miss.
    ///
    /// Errors from `f` are returned as-is and nothing is cached, so the next
    /// call retries.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, f: F) -> Result<&V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        use std::collections::hash_map::Entry;

        match self.entries.entry(key) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let value = f()?;
                Ok(e.insert(value))
            }
        }
    }
}
