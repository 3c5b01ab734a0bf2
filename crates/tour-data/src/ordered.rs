//! Insertion-ordered grouping.
//!
//! Every dashboard series lists its buckets in the order the first record of
//! each bucket was seen, never sorted. [`FirstSeenMap`] is the fold target the
//! aggregators share to keep that ordering explicit.

use std::collections::HashMap;
use std::hash::Hash;

/// A map whose iteration order is the order keys were first inserted.
#[derive(Debug, Clone)]
pub struct FirstSeenMap<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> Default for FirstSeenMap<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> FirstSeenMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to the value for `key`, inserting `init()` at the end of
    /// the order when the key is new. Existing keys keep their position.
    pub fn entry_or_insert_with(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.index.insert(key.clone(), pos);
                self.entries.push((key, init()));
                pos
            }
        };
        &mut self.entries[pos].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

impl<K: Eq + Hash + Clone, V: Default> FirstSeenMap<K, V> {
    /// Like [`FirstSeenMap::entry_or_insert_with`] with `V::default()`.
    pub fn entry_or_default(&mut self, key: K) -> &mut V {
        self.entry_or_insert_with(key, V::default)
    }
}
