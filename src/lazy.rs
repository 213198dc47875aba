//! Lazily-sorted array: append now, sort once.
//!
//! Keys are appended unsorted while the array is mutable. [`freeze`] sorts the
//! storage a single time and switches the array to its read phase, after which
//! lookups and deletes binary search exactly like [`FlatSortedArray`].
//!
//! The two phases are exclusive: adding after freeze, or reading before it,
//! is a misuse of the API. The `try_*` methods report it as an [`Error`]; the
//! [`Collection`] methods panic.
//!
//! [`freeze`]: LazySortedArray::try_freeze
//! [`FlatSortedArray`]: crate::FlatSortedArray

use tracing::debug;

use crate::error::{Error, Result};
use crate::key::{self, Key};
use crate::Collection;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Accepting adds; storage is in insertion order.
    Mutable,
    /// Sorted and deduplicated; accepting lookups and deletes.
    Frozen,
}

#[derive(Clone, Debug)]
pub struct LazySortedArray {
    keys: Vec<Key>,
    phase: Phase,
}

impl LazySortedArray {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            phase: Phase::Mutable,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            phase: Phase::Mutable,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.phase == Phase::Frozen
    }

    /// Backing storage. Insertion order until frozen, ascending afterwards.
    #[inline]
    pub fn as_slice(&self) -> &[Key] {
        &self.keys
    }

    pub fn try_add(&mut self, key: Key) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::AddAfterFreeze);
        }
        self.keys.push(key);
        Ok(())
    }

    /// Sorts the storage and enters the frozen phase.
    ///
    /// Equal keys collapse to the one added last, so a frozen array holds
    /// each key once.
    pub fn try_freeze(&mut self) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::AlreadyFrozen);
        }

        // Stable sort keeps equal keys in insertion order, so the later copy
        // is swapped forward before the earlier one is dropped.
        self.keys.sort_by(|a, b| key::compare(a, b));
        let before = self.keys.len();
        self.keys.dedup_by(|later, kept| {
            if later == kept {
                std::mem::swap(later, kept);
                true
            } else {
                false
            }
        });
        self.phase = Phase::Frozen;

        debug!(
            keys = self.keys.len(),
            collapsed = before - self.keys.len(),
            "froze lazily-sorted array"
        );
        Ok(())
    }

    pub fn try_get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        if !self.is_frozen() {
            return Err(Error::NotFrozen);
        }
        Ok(key::search(&self.keys, key)
            .ok()
            .map(|idx| self.keys[idx].as_slice()))
    }

    pub fn try_delete(&mut self, key: &[u8]) -> Result<Option<Key>> {
        if !self.is_frozen() {
            return Err(Error::NotFrozen);
        }
        Ok(key::search(&self.keys, key)
            .ok()
            .map(|idx| self.keys.remove(idx)))
    }

    /// Number of stored keys. Before freeze this counts duplicates.
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

impl Default for LazySortedArray {
    fn default() -> Self {
        Self::new()
    }
}

#[track_caller]
fn violated<T>(err: Error) -> T {
    panic!("{err}")
}

impl Collection for LazySortedArray {
    fn add(&mut self, key: Key) {
        self.try_add(key).unwrap_or_else(violated)
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.try_get(key).unwrap_or_else(violated)
    }

    fn delete(&mut self, key: &[u8]) -> Option<Key> {
        self.try_delete(key).unwrap_or_else(violated)
    }

    fn freeze(&mut self) {
        self.try_freeze().unwrap_or_else(violated)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
        Box::new(LazySortedArray::iter(self))
    }
}
