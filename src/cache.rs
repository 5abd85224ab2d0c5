//! Small fixed-capacity cache with FIFO eviction.
//!
//! Used to avoid re-deriving format objects per cell and per line. Caching never changes
//! results, only cost, so a capacity of one is always a valid choice.

use std::collections::VecDeque;
use std::fmt;

/// Key → value cache holding at most `capacity` entries.
///
/// When full, inserting a new key evicts the oldest inserted entry. Lookups do not refresh
/// an entry's position.
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: VecDeque<(K, V)>,
}

impl<K: PartialEq, V> BoundedCache<K, V> {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be > 0");
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace. Returns the entry evicted to make room, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return None;
        }
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back((key, value));
        evicted
    }

    /// Return the cached value for `key`, building and inserting it on a miss.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, build: F) -> Result<&V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let idx = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                let value = build(&key)?;
                self.insert(key, value);
                self.entries.len() - 1
            }
        };
        Ok(&self.entries[idx].1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: fmt::Debug, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("keys", &self.entries.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::BoundedCache;

    fn fill(capacity: usize, inserts: usize) -> BoundedCache<usize, String> {
        let mut cache = BoundedCache::new(capacity);
        for i in 0..inserts {
            cache.insert(i, format!("v{i}"));
        }
        cache
    }

    #[test]
    fn capacity_one_keeps_latest() {
        let cache = fill(1, 2);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(&0));
        assert_eq!(cache.get(&1).map(String::as_str), Some("v1"));
    }

    #[test]
    fn capacity_two_evicts_first_inserted() {
        let mut cache = fill(2, 2);
        // Reading does not refresh position.
        assert!(cache.get(&0).is_some());
        let evicted = cache.insert(2, "v2".to_string());
        assert_eq!(evicted, Some((0, "v0".to_string())));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&1) && cache.contains(&2));
    }

    #[test]
    fn capacity_n_retains_exactly_n() {
        for n in [3usize, 5, 16] {
            let cache = fill(n, n + 1);
            assert_eq!(cache.len(), n);
            assert!(!cache.contains(&0));
            assert!((1..=n).all(|k| cache.contains(&k)));
        }
    }

    #[test]
    fn replacing_existing_key_does_not_evict() {
        let mut cache = fill(2, 2);
        assert_eq!(cache.insert(0, "again".to_string()), None);
        assert_eq!(cache.get(&0).map(String::as_str), Some("again"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn get_or_try_insert_with_builds_once() {
        let mut cache: BoundedCache<&str, usize> = BoundedCache::new(2);
        let mut builds = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert_with("k", |_| -> Result<usize, ()> {
                    builds += 1;
                    Ok(42)
                })
                .unwrap();
            assert_eq!(*v, 42);
        }
        assert_eq!(builds, 1);
        let err = cache.get_or_try_insert_with("bad", |_| Err::<usize, _>("nope"));
        assert_eq!(err, Err("nope"));
        assert!(!cache.contains(&"bad"));
    }

    #[test]
    #[should_panic(expected = "cache capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = BoundedCache::<u8, u8>::new(0);
    }
}
