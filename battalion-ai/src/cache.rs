//! Bounded memoization cache with FIFO eviction

use std::collections::VecDeque;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::AiError;

/// Key to lazily computed value, holding at most `capacity` entries.
/// When full, the oldest inserted entry is evicted.
#[derive(Clone, Debug)]
pub struct FixedCache<K, V> {
    capacity: usize,
    map: FxHashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> FixedCache<K, V> {
    pub fn new(capacity: usize) -> Result<Self, AiError> {
        if capacity == 0 {
            return Err(AiError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            map: FxHashMap::default(),
            order: VecDeque::with_capacity(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Cached value for `key`, computing and storing it on a miss.
    /// The key is only cloned on a miss.
    pub fn get_or_compute(&mut self, key: &K, compute: impl FnOnce(&K) -> V) -> &mut V {
        if !self.map.contains_key(key) {
            if self.map.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.map.remove(&oldest);
                }
            }
            let value = compute(key);
            self.order.push_back(key.clone());
            self.map.insert(key.clone(), value);
        }
        self.map.get_mut(key).expect("entry present after insert")
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_hit_skips_compute() {
        let mut cache = FixedCache::new(4).unwrap();
        let calls = Cell::new(0);
        let compute = |k: &u32| {
            calls.set(calls.get() + 1);
            k * 10
        };
        assert_eq!(*cache.get_or_compute(&3, compute), 30);
        assert_eq!(*cache.get_or_compute(&3, compute), 30);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut cache = FixedCache::new(2).unwrap();
        cache.get_or_compute(&1, |_| "a");
        cache.get_or_compute(&2, |_| "b");
        cache.get_or_compute(&1, |_| "ignored");
        cache.get_or_compute(&3, |_| "c");
        assert_eq!(cache.len(), 2);
        // Oldest insertion goes first, hits do not refresh
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(FixedCache::<u32, u32>::new(0), Err(AiError::ZeroCapacity)));
    }
}
