use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Hash any key material into a cache key.
pub fn cache_key(parts: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    hasher.finish()
}

/// Memoized results of a pure stage, keyed by a hash of its inputs.
///
/// Values are cloned out, so store cheap handles (`Arc`, small enums).
/// Invalidation is up to the owner, through [`MemoCache::clear`] and
/// [`MemoCache::sweep`].
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: HashMap<u64, V>,
    /// Keys looked up since the last sweep.
    used: HashSet<u64>,
    hits: u64,
    misses: u64,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            used: HashSet::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<V: Clone> MemoCache<V> {
    pub fn get_or_insert_with(&mut self, key: u64, compute: impl FnOnce() -> V) -> V {
        self.used.insert(key);
        if let Some(v) = self.entries.get(&key) {
            self.hits += 1;
            return v.clone();
        }
        self.misses += 1;
        let v = compute();
        self.entries.insert(key, v.clone());
        v
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.used.clear();
    }

    /// Drop every entry not looked up since the previous sweep. Returns the
    /// number of entries dropped.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        let used = std::mem::take(&mut self.used);
        self.entries.retain(|key, _| used.contains(key));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn computes_once_per_key() {
        let calls = Cell::new(0);
        let mut cache = MemoCache::default();
        let key = cache_key(("load", 42u64));
        for _ in 0..3 {
            let v = cache.get_or_insert_with(key, || {
                calls.set(calls.get() + 1);
                "table"
            });
            assert_eq!(v, "table");
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats(), (2, 1));
    }

    #[test]
    fn different_parameters_get_different_keys() {
        assert_ne!(cache_key((1u64, true)), cache_key((1u64, false)));
        assert_eq!(cache_key((1u64, "x")), cache_key((1u64, "x")));
    }

    #[test]
    fn sweep_keeps_only_recently_used_keys() {
        let mut cache = MemoCache::default();
        cache.get_or_insert_with(1, || "a");
        cache.get_or_insert_with(2, || "b");
        assert_eq!(cache.sweep(), 0);

        cache.get_or_insert_with(2, || "b");
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_or_insert_with(1, || "again"), "again");
    }

    #[test]
    fn clearing_forces_recompute() {
        let mut cache = MemoCache::default();
        cache.get_or_insert_with(7, || 1);
        assert_eq!(cache.get_or_insert_with(7, || 2), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_insert_with(7, || 2), 2);
    }
}
