//! Exact-match LRU cache
//!
//! Entries live in an arena (`Vec`) and are threaded into a doubly linked
//! recency list through `prev`/`next` slot indices. A hash map resolves keys
//! to slots. Promotion and eviction only rewrite indices, so both are O(1)
//! and no entry is ever referenced by more than one owner.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::mem;

/// Sentinel for "no neighbour"
const NIL: usize = usize::MAX;

struct Slot<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Fixed-capacity key/value store with least-recently-used eviction.
///
/// The list head is the most recently used entry and the tail the least
/// recently used. Once the arena is full, inserting a new key recycles the
/// tail slot, so `len() <= capacity()` holds after every call.
pub struct ExactCache<K, V> {
    capacity: usize,
    slots: Vec<Slot<K, V>>,
    index: HashMap<K, usize>,
    head: usize,
    tail: usize,
}

impl<K, V> ExactCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of zero yields a cache that never retains anything.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check for a key without touching recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Look up a value and promote it to most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        Some(&self.slots[idx].value)
    }

    /// Look up a value without promoting it
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&idx| &self.slots[idx].value)
    }

    /// Insert or replace a value, making it the most recently used entry.
    ///
    /// Returns the entry that no longer fits: the evicted least recently
    /// used pair when a new key arrives at capacity, or the given pair
    /// itself when the capacity is zero. Replacing an existing key never
    /// evicts.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity == 0 {
            return Some((key, value));
        }

        if let Some(&idx) = self.index.get(&key) {
            self.slots[idx].value = value;
            self.promote(idx);
            return None;
        }

        if self.slots.len() < self.capacity {
            let idx = self.slots.len();
            self.slots.push(Slot {
                key: key.clone(),
                value,
                prev: NIL,
                next: NIL,
            });
            self.push_front(idx);
            self.index.insert(key, idx);
            return None;
        }

        let idx = self.tail;
        self.unlink(idx);

        let slot = &mut self.slots[idx];
        let old_key = mem::replace(&mut slot.key, key.clone());
        let old_value = mem::replace(&mut slot.value, value);

        self.index.remove(&old_key);
        self.index.insert(key, idx);
        self.push_front(idx);

        Some((old_key, old_value))
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }

        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;

        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }

        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;

        if self.head != NIL {
            self.slots[self.head].prev = idx;
        }

        self.head = idx;

        if self.tail == NIL {
            self.tail = idx;
        }
    }
}

impl<K, V> fmt::Debug for ExactCache<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&K> = Iter {
            slots: &self.slots,
            cursor: self.head,
        }
        .map(|(k, _)| k)
        .collect();

        f.debug_struct("ExactCache")
            .field("capacity", &self.capacity)
            .field("recency", &keys)
            .finish()
    }
}

/// Recency-ordered iterator over an [`ExactCache`]
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    cursor: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }

        let slot = &self.slots[self.cursor];
        self.cursor = slot.next;
        Some((&slot.key, &slot.value))
    }
}
