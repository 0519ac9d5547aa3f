//! Binary min-heap with decrease-key.
//!
//! Keys are opaque identities, not array slots, so the heap keeps a
//! `key -> slot` index that is updated on every swap. `decrease_key` uses the
//! index to find the entry in O(1) and sifts it up in O(log n).

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::HeapError;

#[derive(Debug, Clone, Copy)]
struct HeapEntry<K> {
    key: K,
    priority: f64,
}

#[derive(Debug, Clone)]
pub struct MinHeap<K> {
    entries: Vec<HeapEntry<K>>,
    positions: HashMap<K, usize>,
}

impl<K> Default for MinHeap<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> MinHeap<K>
where
    K: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Current priority of `key`, if it is still queued.
    pub fn priority(&self, key: &K) -> Option<f64> {
        self.positions.get(key).map(|&slot| self.entries[slot].priority)
    }

    pub fn peek(&self) -> Option<(K, f64)> {
        self.entries.first().map(|entry| (entry.key, entry.priority))
    }

    pub fn insert(&mut self, key: K, priority: f64) -> Result<(), HeapError> {
        if self.positions.contains_key(&key) {
            return Err(HeapError::DuplicateKey);
        }
        let slot = self.entries.len();
        self.entries.push(HeapEntry { key, priority });
        self.positions.insert(key, slot);
        self.sift_up(slot);
        Ok(())
    }

    pub fn extract_min(&mut self) -> Result<(K, f64), HeapError> {
        if self.entries.is_empty() {
            return Err(HeapError::Empty);
        }
        let last = self.entries.len() - 1;
        self.swap(0, last);
        let entry = self.entries.pop().ok_or(HeapError::Empty)?;
        self.positions.remove(&entry.key);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Ok((entry.key, entry.priority))
    }

    /// Lower the priority of `key` to `priority`.
    ///
    /// Returns `Ok(false)` and leaves the heap untouched when `priority` is
    /// not strictly smaller than the current one.
    pub fn decrease_key(&mut self, key: K, priority: f64) -> Result<bool, HeapError> {
        let slot = *self.positions.get(&key).ok_or(HeapError::UnknownKey)?;
        if priority.total_cmp(&self.entries[slot].priority).is_ge() {
            return Ok(false);
        }
        self.entries[slot].priority = priority;
        self.sift_up(slot);
        Ok(true)
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.entries[a]
            .priority
            .total_cmp(&self.entries[b].priority)
            .is_lt()
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.positions.insert(self.entries[a].key, a);
        self.positions.insert(self.entries[b].key, b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.less(slot, parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        assert_eq!(self.entries.len(), self.positions.len());
        for (slot, entry) in self.entries.iter().enumerate() {
            assert_eq!(self.positions.get(&entry.key), Some(&slot));
            if slot > 0 {
                let parent = (slot - 1) / 2;
                assert!(self.entries[parent].priority <= entry.priority);
            }
        }
    }
}
