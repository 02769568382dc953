//! Memoization of macro parses
//!
//! A parse is a pure function of its input text and the `included` flag, so results can be
//! shared between callers. Entries are keyed by a blake3 digest and evicted least recently used
//! first once the capacity is reached.

use super::nodes::MacroNode;
use linked_hash_map::LinkedHashMap;
use std::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 2000;

#[derive(Debug)]
pub struct MacroCache {
    capacity: usize,
    entries: Mutex<LinkedHashMap<blake3::Hash, Vec<MacroNode>>>,
}

impl Default for MacroCache {
    fn default() -> Self {
        MacroCache::new(DEFAULT_CAPACITY)
    }
}

impl MacroCache {
    pub fn new(capacity: usize) -> Self {
        MacroCache {
            capacity: capacity.max(1),
            entries: Mutex::new(LinkedHashMap::new()),
        }
    }

    pub fn key(text: &str, included: bool) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[included as u8]);
        hasher.update(text.as_bytes());
        hasher.finalize()
    }

    pub fn get(&self, key: &blake3::Hash) -> Option<Vec<MacroNode>> {
        // A poisoned lock only means another parse panicked; the map itself is still sound.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get_refresh(key).map(|nodes| nodes.clone())
    }

    pub fn insert(&self, key: blake3::Hash, nodes: Vec<MacroNode>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, nodes);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = MacroCache::new(2);
        let (a, b, c) = (
            MacroCache::key("a", true),
            MacroCache::key("b", true),
            MacroCache::key("c", true),
        );
        cache.insert(a, vec![MacroNode::text("a")]);
        cache.insert(b, vec![MacroNode::text("b")]);
        assert!(cache.get(&a).is_some());
        cache.insert(c, vec![MacroNode::text("c")]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn test_included_flag_is_part_of_the_key() {
        assert_ne!(MacroCache::key("x", true), MacroCache::key("x", false));
    }
}
