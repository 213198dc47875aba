//! # keyset
//!
//! Ordered collections of unique byte-string keys behind one interface, with
//! four interchangeable backends:
//!
//! | Backend             | add          | get      | delete   | notes                          |
//! |---------------------|--------------|----------|----------|--------------------------------|
//! | [`FlatSortedArray`] | O(n)         | O(log n) | O(n)     | always sorted                  |
//! | [`LazySortedArray`] | O(1) amort.  | O(log n) | O(n)     | add before freeze, read after  |
//! | [`RedBlackTree`]    | O(log n)     | O(log n) | O(log n) | index-addressed node arena     |
//! | [`BTree`]           | O(log n)     | O(log n) | O(log n) | minimum degree `t >= 2`        |
//!
//! Keys order lexicographically by byte ([`key::compare`]). A collection is a
//! set: the stored key is its own payload, and adding a key equal to a stored
//! one replaces it.
//!
//! ## Example
//!
//! ```rust
//! use keyset::{Backend, Collection};
//!
//! let mut c = Backend::BTree { degree: 4 }.build().unwrap();
//! c.add(b"aaa".to_vec());
//! c.add(b"ccc".to_vec());
//! c.add(b"bbb".to_vec());
//! c.freeze();
//!
//! assert_eq!(c.get(b"bbb"), Some(&b"bbb"[..]));
//! assert_eq!(c.get(b"ddd"), None);
//! assert_eq!(c.delete(b"ccc"), Some(b"ccc".to_vec()));
//! ```
//!
//! Collections are single-owner and not synchronised; wrap one in a lock to
//! share it between threads.

#![deny(unsafe_code)]

pub mod btree;
pub mod error;
pub mod key;
pub mod lazy;
pub mod rbtree;
pub mod sorted;

pub use btree::{BTree, DEFAULT_DEGREE};
pub use error::{Error, Result};
pub use key::{compare, Key};
pub use lazy::{LazySortedArray, Phase};
pub use rbtree::RedBlackTree;
pub use sorted::FlatSortedArray;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

// =============================================================================
// Collection contract
// =============================================================================

/// The operations every backend supports.
///
/// `get` and `delete` report a missing key as `None`. Misuse of a backend's
/// lifecycle (see [`LazySortedArray`]) panics.
pub trait Collection {
    /// Adds `key`, replacing an equal key if one is stored.
    fn add(&mut self, key: Key);

    /// Returns the stored key equal to `key`.
    fn get(&self, key: &[u8]) -> Option<&[u8]>;

    /// Removes and returns the stored key equal to `key`.
    fn delete(&mut self, key: &[u8]) -> Option<Key>;

    /// Commits bulk-loaded keys for reading. Required once before `get` or
    /// `delete` on a [`LazySortedArray`]; a no-op for every other backend.
    fn freeze(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Stored keys, ascending once the collection is sorted.
    fn iter(&self) -> Box<dyn Iterator<Item = &[u8]> + '_>;
}

// =============================================================================
// Backend selection
// =============================================================================

/// Which backend to build, with its configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    FlatSorted,
    LazySorted,
    RedBlack,
    BTree { degree: usize },
}

impl Backend {
    /// Every backend, with the B-tree at [`DEFAULT_DEGREE`].
    pub const ALL: [Backend; 4] = [
        Backend::FlatSorted,
        Backend::LazySorted,
        Backend::RedBlack,
        Backend::BTree {
            degree: DEFAULT_DEGREE,
        },
    ];

    pub fn build(self) -> Result<AnyCollection> {
        let collection = match self {
            Backend::FlatSorted => AnyCollection::FlatSorted(FlatSortedArray::new()),
            Backend::LazySorted => AnyCollection::LazySorted(LazySortedArray::new()),
            Backend::RedBlack => AnyCollection::RedBlack(RedBlackTree::new()),
            Backend::BTree { degree } => AnyCollection::BTree(BTree::try_new(degree)?),
        };
        debug!(backend = %self, "built collection");
        Ok(collection)
    }

    /// True if reads are only legal after [`Collection::freeze`].
    pub fn requires_freeze(self) -> bool {
        matches!(self, Backend::LazySorted)
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::BTree {
            degree: DEFAULT_DEGREE,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::FlatSorted => f.write_str("flat"),
            Backend::LazySorted => f.write_str("lazy"),
            Backend::RedBlack => f.write_str("rbtree"),
            Backend::BTree { degree } => write!(f, "btree:{degree}"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    /// Parses `flat`, `lazy`, `rbtree`, `btree` or `btree:<degree>`.
    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::UnknownBackend(s.to_owned());
        match s.trim() {
            "flat" => Ok(Backend::FlatSorted),
            "lazy" => Ok(Backend::LazySorted),
            "rbtree" => Ok(Backend::RedBlack),
            "btree" => Ok(Backend::default()),
            other => {
                let degree = other
                    .strip_prefix("btree:")
                    .ok_or_else(unknown)?
                    .parse::<usize>()
                    .map_err(|_| unknown())?;
                if degree < 2 {
                    return Err(Error::InvalidDegree(degree));
                }
                Ok(Backend::BTree { degree })
            }
        }
    }
}

// =============================================================================
// AnyCollection
// =============================================================================

/// A collection of any backend, dispatched by `match`.
#[derive(Clone, Debug)]
pub enum AnyCollection {
    FlatSorted(FlatSortedArray),
    LazySorted(LazySortedArray),
    RedBlack(RedBlackTree),
    BTree(BTree),
}

impl AnyCollection {
    pub fn backend(&self) -> Backend {
        match self {
            AnyCollection::FlatSorted(_) => Backend::FlatSorted,
            AnyCollection::LazySorted(_) => Backend::LazySorted,
            AnyCollection::RedBlack(_) => Backend::RedBlack,
            AnyCollection::BTree(t) => Backend::BTree { degree: t.degree() },
        }
    }

    fn inner(&self) -> &dyn Collection {
        match self {
            AnyCollection::FlatSorted(c) => c,
            AnyCollection::LazySorted(c) => c,
            AnyCollection::RedBlack(c) => c,
            AnyCollection::BTree(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Collection {
        match self {
            AnyCollection::FlatSorted(c) => c,
            AnyCollection::LazySorted(c) => c,
            AnyCollection::RedBlack(c) => c,
            AnyCollection::BTree(c) => c,
        }
    }
}

impl Collection for AnyCollection {
    #[inline]
    fn add(&mut self, key: Key) {
        self.inner_mut().add(key)
    }

    #[inline]
    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.inner().get(key)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Option<Key> {
        self.inner_mut().delete(key)
    }

    #[inline]
    fn freeze(&mut self) {
        self.inner_mut().freeze()
    }

    #[inline]
    fn len(&self) -> usize {
        self.inner().len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
        self.inner().iter()
    }
}


#[cfg(test)]
mod proptests;
