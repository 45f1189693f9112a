//! Open-addressing hash table keyed by interned strings
//!
//! Collisions are resolved by linear probing. Deleted entries leave a
//! tombstone (no key, value `true`) so that probe sequences running through
//! them stay intact; a truly empty slot has no key and a nil value.
//!
//! `count` includes tombstones, and the table grows before an insert would
//! push `count / capacity` above [`MAX_LOAD`]. Growing rehashes only live
//! entries, so tombstones disappear and `count` drops back to the number of
//! keys.

use crate::bytecode::Value;

use super::ObjRef;

/// Maximum load factor, tombstones included
pub const MAX_LOAD: f64 = 0.75;

/// Capacity used for the first allocation
const MIN_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: Option<ObjRef>,
    value: Value,
}

impl Entry {
    const EMPTY: Entry = Entry {
        key: None,
        value: Value::Nil,
    };

    fn is_tombstone(&self) -> bool {
        self.key.is_none() && self.value == Value::Bool(true)
    }
}

/// Hash table from string handles to values
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Occupied slots, tombstones included
    count: usize,
    entries: Vec<Entry>,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupied slots, tombstones included
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of live keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.key.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the value stored for `key`
    #[must_use]
    pub fn get(&self, key: ObjRef) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        let entry = &self.entries[find_slot(&self.entries, key)];
        entry.key.map(|_| entry.value)
    }

    /// Insert or overwrite `key`, returning true if the key was not present
    pub fn set(&mut self, key: ObjRef, value: Value) -> bool {
        if exceeds_max_load(self.count + 1, self.capacity()) {
            self.adjust_capacity(grow_capacity(self.capacity()));
        }

        let index = find_slot(&self.entries, key);
        let entry = &mut self.entries[index];
        let is_new_key = entry.key.is_none();
        // Reusing a tombstone keeps its slot in `count`.
        if is_new_key && entry.value.is_nil() {
            self.count += 1;
        }

        entry.key = Some(key);
        entry.value = value;
        is_new_key
    }

    /// Remove `key`, leaving a tombstone. Returns false if it was absent.
    pub fn delete(&mut self, key: ObjRef) -> bool {
        if self.count == 0 {
            return false;
        }

        let index = find_slot(&self.entries, key);
        let entry = &mut self.entries[index];
        if entry.key.is_none() {
            return false;
        }

        entry.key = None;
        entry.value = Value::Bool(true);
        true
    }

    /// Copy every live entry of `self` into `to`
    pub fn add_all(&self, to: &mut Table) {
        for (key, value) in self.iter() {
            to.set(key, value);
        }
    }

    /// Find an interned string by content
    ///
    /// `resolve` maps a key back to its characters; it is only called for
    /// keys whose cached hash matches.
    pub fn find_string<'a>(
        &self,
        chars: &str,
        hash: u32,
        resolve: impl Fn(ObjRef) -> &'a str,
    ) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }

        let capacity = self.capacity();
        let mut index = hash as usize % capacity;
        loop {
            let entry = &self.entries[index];
            match entry.key {
                None if !entry.is_tombstone() => return None,
                Some(key) if key.hash() == hash && resolve(key) == chars => return Some(key),
                _ => {}
            }
            index = (index + 1) % capacity;
        }
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, Value)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.key.map(|key| (key, entry.value)))
    }

    /// Reallocate to `capacity` slots and rehash live entries
    fn adjust_capacity(&mut self, capacity: usize) {
        let old = std::mem::replace(&mut self.entries, vec![Entry::EMPTY; capacity]);
        self.count = 0;
        for entry in old {
            let Some(key) = entry.key else {
                continue;
            };
            let index = find_slot(&self.entries, key);
            self.entries[index] = entry;
            self.count += 1;
        }
    }
}

fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity * 2
    }
}

#[allow(clippy::cast_precision_loss)]
fn exceeds_max_load(count: usize, capacity: usize) -> bool {
    count as f64 > capacity as f64 * MAX_LOAD
}

/// Slot for `key`: its own slot if present, else the first tombstone passed,
/// else the empty slot that ended the probe.
///
/// `entries` must be non-empty and contain at least one empty slot.
fn find_slot(entries: &[Entry], key: ObjRef) -> usize {
    let capacity = entries.len();
    let mut index = key.hash() as usize % capacity;
    let mut tombstone = None;
    loop {
        let entry = &entries[index];
        match entry.key {
            Some(existing) if existing == key => return index,
            Some(_) => {}
            None if entry.is_tombstone() => {
                tombstone.get_or_insert(index);
            }
            None => return tombstone.unwrap_or(index),
        }
        index = (index + 1) % capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{Heap, ObjKind};

    /// A key with a chosen hash, for forcing collisions
    fn key(index: u32, hash: u32) -> ObjRef {
        ObjRef::new(index, hash, ObjKind::String)
    }

    #[test]
    fn empty_table() {
        let table = Table::new();
        assert_eq!(table.capacity(), 0);
        assert_eq!(table.get(key(0, 1)), None);
        assert!(table.is_empty());
    }

    #[test]
    fn set_then_get() {
        let mut heap = Heap::new();
        let name = heap.copy_string("name");
        let mut table = Table::new();

        assert!(table.set(name, Value::Number(1.0)));
        assert_eq!(table.get(name), Some(Value::Number(1.0)));
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn overwrite_is_not_new() {
        let mut table = Table::new();
        let k = key(0, 7);
        assert!(table.set(k, Value::Nil));
        assert!(!table.set(k, Value::Bool(false)));
        assert_eq!(table.get(k), Some(Value::Bool(false)));
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn delete_leaves_tombstone() {
        let mut table = Table::new();
        let k = key(0, 3);
        table.set(k, Value::Number(2.0));

        assert!(table.delete(k));
        assert_eq!(table.get(k), None);
        assert!(!table.delete(k));
        // Tombstones still count toward the load factor.
        assert_eq!(table.count(), 1);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn delete_missing_key() {
        let mut table = Table::new();
        assert!(!table.delete(key(0, 0)));
        table.set(key(1, 0), Value::Nil);
        assert!(!table.delete(key(2, 0)));
    }

    #[test]
    fn probing_past_tombstone_finds_collided_key() {
        let mut table = Table::new();
        let first = key(0, 5);
        let second = key(1, 5);
        table.set(first, Value::Number(1.0));
        table.set(second, Value::Number(2.0));

        table.delete(first);
        assert_eq!(table.get(second), Some(Value::Number(2.0)));
    }

    #[test]
    fn insert_reuses_tombstone() {
        let mut table = Table::new();
        let first = key(0, 5);
        let second = key(1, 5);
        table.set(first, Value::Number(1.0));
        table.delete(first);

        assert!(table.set(second, Value::Number(2.0)));
        assert_eq!(table.count(), 1);
        assert_eq!(table.get(second), Some(Value::Number(2.0)));
    }

    #[test]
    fn growth_keeps_every_key() {
        let mut table = Table::new();
        let keys: Vec<ObjRef> = (0..100).map(|i| key(i, i.wrapping_mul(2_654_435_761))).collect();
        for (i, &k) in keys.iter().enumerate() {
            assert!(table.set(k, Value::Number(i as f64)));
            assert!(table.count() * 4 <= table.capacity() * 3);
            assert!(table.capacity().is_power_of_two());
        }
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(table.get(k), Some(Value::Number(i as f64)));
        }
        assert_eq!(table.len(), 100);
    }

    #[test]
    fn growth_drops_tombstones() {
        let mut table = Table::new();
        for i in 0..6 {
            table.set(key(i, i), Value::Nil);
        }
        for i in 0..5 {
            table.delete(key(i, i));
        }
        assert_eq!(table.count(), 6);
        assert_eq!(table.capacity(), 8);

        // The seventh occupied slot would exceed the load factor.
        table.set(key(10, 10), Value::Nil);
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.count(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn add_all_copies_live_entries() {
        let mut from = Table::new();
        from.set(key(0, 1), Value::Number(1.0));
        from.set(key(1, 2), Value::Number(2.0));
        from.set(key(2, 3), Value::Number(3.0));
        from.delete(key(1, 2));

        let mut to = Table::new();
        to.set(key(0, 1), Value::Nil);
        from.add_all(&mut to);

        assert_eq!(to.get(key(0, 1)), Some(Value::Number(1.0)));
        assert_eq!(to.get(key(1, 2)), None);
        assert_eq!(to.get(key(2, 3)), Some(Value::Number(3.0)));
        assert_eq!(to.len(), 2);
    }

    #[test]
    fn find_string_compares_content() {
        let mut heap = Heap::new();
        let hello = heap.copy_string("hello");
        let strings = heap.strings();

        let found = strings.find_string("hello", hello.hash(), |k| heap.as_str(k));
        assert_eq!(found, Some(hello));

        let missing = strings.find_string("hellp", hello.hash(), |k| heap.as_str(k));
        assert_eq!(missing, None);
    }

    #[test]
    fn find_string_skips_tombstones() {
        let mut heap = Heap::new();
        let a = heap.copy_string("a");
        let b = heap.copy_string("b");

        let mut table = Table::new();
        // Same bucket for both, with `a` deleted in front of `b`.
        let shadow = ObjRef::new(a.index() as u32, 9, ObjKind::String);
        let target = ObjRef::new(b.index() as u32, 9, ObjKind::String);
        table.set(shadow, Value::Nil);
        table.set(target, Value::Nil);
        table.delete(shadow);

        assert_eq!(table.find_string("b", 9, |k| heap.as_str(k)), Some(target));
        assert_eq!(table.find_string("a", 9, |k| heap.as_str(k)), None);
    }

    /// Minimal linear congruential generator for repeatable op sequences
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u32 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (self.0 >> 33) as u32
        }
    }

    #[test]
    fn random_set_delete_matches_hash_map() {
        use std::collections::HashMap;

        // Few distinct hashes so probe chains overlap and tombstones pile up
        let keys: Vec<ObjRef> = (0..64).map(|i| key(i, i % 5)).collect();

        for seed in 0..20 {
            let mut rng = Lcg(seed);
            let mut table = Table::new();
            let mut model: HashMap<ObjRef, Value> = HashMap::new();

            for step in 0..500 {
                let k = keys[rng.next() as usize % keys.len()];
                if rng.next() % 3 == 0 {
                    assert_eq!(table.delete(k), model.remove(&k).is_some());
                } else {
                    let value = Value::Number(f64::from(step));
                    assert_eq!(table.set(k, value), model.insert(k, value).is_none());
                }

                for &k in &keys {
                    assert_eq!(table.get(k), model.get(&k).copied(), "seed {seed} step {step}");
                }
                assert_eq!(table.len(), model.len());
                assert!(table.count() >= table.len());
                #[allow(clippy::cast_precision_loss)]
                let within_load = table.count() as f64 <= table.capacity() as f64 * MAX_LOAD;
                assert!(within_load, "seed {seed} step {step}");
            }
        }
    }
}
