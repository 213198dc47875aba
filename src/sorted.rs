//! Flat sorted array: a `Vec` kept in ascending order after every mutation.
//!
//! Lookups are a binary search; inserts and deletes shift the tail of the
//! vector, so both are O(n). This is the baseline the tree backends are
//! checked against.

use crate::key::{self, Key};
use crate::Collection;

#[derive(Clone, Debug, Default)]
pub struct FlatSortedArray {
    keys: Vec<Key>,
}

impl FlatSortedArray {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Backing storage, always ascending and free of duplicates.
    #[inline]
    pub fn as_slice(&self) -> &[Key] {
        &self.keys
    }

    /// Inserts `key` at its sorted position.
    ///
    /// An equal key already present is replaced and returned.
    pub fn insert(&mut self, key: Key) -> Option<Key> {
        match key::search(&self.keys, &key) {
            Ok(idx) => Some(std::mem::replace(&mut self.keys[idx], key)),
            Err(idx) => {
                self.keys.insert(idx, key);
                None
            }
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let idx = key::search(&self.keys, key).ok()?;
        Some(self.keys[idx].as_slice())
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Key> {
        let idx = key::search(&self.keys, key).ok()?;
        Some(self.keys.remove(idx))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.keys.iter().map(Vec::as_slice)
    }
}

impl Collection for FlatSortedArray {
    fn add(&mut self, key: Key) {
        self.insert(key);
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        FlatSortedArray::get(self, key)
    }

    fn delete(&mut self, key: &[u8]) -> Option<Key> {
        self.remove(key)
    }

    fn freeze(&mut self) {}

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
        Box::new(FlatSortedArray::iter(self))
    }
}
