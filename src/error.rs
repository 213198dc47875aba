//! Configuration and contract errors.
//!
//! A missing key is never an error: lookups and deletes report absence with
//! `None`. The variants here describe misuse of a collection. The checked
//! `try_*` entry points return them; the [`Collection`](crate::Collection)
//! trait methods panic with their message instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// B-tree minimum degree below 2.
    #[error("b-tree minimum degree must be at least 2, got {0}")]
    InvalidDegree(usize),

    /// Add on a lazily-sorted array after it was frozen.
    #[error("cannot add keys to a frozen collection")]
    AddAfterFreeze,

    /// Get or delete on a lazily-sorted array before it was frozen.
    #[error("collection must be frozen before lookups or deletes")]
    NotFrozen,

    /// Second freeze of a lazily-sorted array.
    #[error("collection is already frozen")]
    AlreadyFrozen,

    /// Backend name that does not parse.
    #[error("unknown backend {0:?}")]
    UnknownBackend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
