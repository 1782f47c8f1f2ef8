//! Index (C4): concurrent-safe-by-construction key -> arena-slot mapping.
//!
//! Grounded on the `map: HashMap<Arc<[u8]>, usize, RandomState>` field of
//! `hkv-engine::memory::ShardInner` — same map type (`hashbrown` +
//! `ahash::RandomState`), generalized from byte-slice keys to a generic
//! `K`. It lives behind the same lock as the recency list (§4.3: "the
//! index is chosen to be intrinsically thread-safe as a defensive
//! measure"); under that single lock its own reads are already
//! structurally consistent.

use std::borrow::Borrow;
use std::hash::Hash;

use ahash::RandomState;
use hashbrown::HashMap;

pub(crate) struct Index<K> {
    map: HashMap<K, usize, RandomState>,
}

impl<K> Index<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).copied()
    }

    /// Inserts or overwrites the mapping, returning the previous slot
    /// index if the key was already present.
    pub fn insert(&mut self, key: K, slot: usize) -> Option<usize> {
        self.map.insert(key, slot)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Weakly-consistent snapshot of the current keys (`keys()`, §4.4).
    pub fn keys_snapshot(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.map.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove_roundtrip() {
        let mut idx: Index<String> = Index::new();
        assert_eq!(idx.insert("a".to_string(), 7), None);
        assert_eq!(idx.get("a"), Some(7));
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.remove("a"), Some(7));
        assert_eq!(idx.get("a"), None);
        assert_eq!(idx.len(), 0);
    }

    #[test]
    fn insert_overwrite_returns_old_slot() {
        let mut idx: Index<&str> = Index::new();
        idx.insert("k", 1);
        assert_eq!(idx.insert("k", 2), Some(1));
        assert_eq!(idx.get("k"), Some(2));
    }

    #[test]
    fn keys_snapshot_reflects_current_contents() {
        let mut idx: Index<i32> = Index::new();
        idx.insert(1, 0);
        idx.insert(2, 1);
        let mut keys = idx.keys_snapshot();
        keys.sort();
        assert_eq!(keys, vec![1, 2]);
    }
}
