//! Keys and the byte-wise ordering every backend sorts by.

use std::cmp::Ordering;

/// An owned key. Collections store keys as their own payload.
pub type Key = Vec<u8>;

/// Lexicographic byte comparison.
///
/// A key that is a proper prefix of another orders before it, so `b""` is the
/// smallest key and `b"ab" < b"abc" < b"b"`.
#[inline]
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Binary search over an ascending slice of keys.
///
/// `Ok(i)` if `keys[i] == key`, otherwise `Err(i)` with the position of the
/// first element greater than `key`.
#[inline]
pub(crate) fn search(keys: &[Key], key: &[u8]) -> Result<usize, usize> {
    keys.binary_search_by(|probe| compare(probe, key))
}
