//! Multiway B-tree parameterised by its minimum degree `t`.
//!
//! Every node holds at most `2t - 1` sorted keys; every node but the root
//! holds at least `t - 1`. Internal nodes own `keys + 1` boxed children and
//! all leaves sit at the same depth.
//!
//! Both mutations work in a single top-down pass:
//! - insert splits any full node before descending into it, so a split never
//!   has to propagate back up;
//! - delete tops up any minimal child (borrowing from a sibling or merging
//!   with one) before descending into it, so removing from a leaf never
//!   underflows.

use std::cmp::Ordering;

use tracing::trace;

use crate::error::{Error, Result};
use crate::key::{self, Key};
use crate::Collection;

/// Minimum degree used by [`Backend::default`](crate::Backend).
pub const DEFAULT_DEGREE: usize = 32;

// =============================================================================
// Node
// =============================================================================

#[derive(Clone, Debug, Default)]
struct Node {
    keys: Vec<Key>,
    /// Empty for leaves, `keys.len() + 1` entries otherwise.
    children: Vec<Box<Node>>,
}

impl Node {
    fn with_capacity(degree: usize, leaf: bool) -> Self {
        Self {
            keys: Vec::with_capacity(2 * degree - 1),
            children: if leaf {
                Vec::new()
            } else {
                Vec::with_capacity(2 * degree)
            },
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    fn search(&self, key: &[u8]) -> std::result::Result<usize, usize> {
        key::search(&self.keys, key)
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let mut node = self;
        loop {
            match node.search(key) {
                Ok(idx) => return Some(node.keys[idx].as_slice()),
                Err(_) if node.is_leaf() => return None,
                Err(idx) => node = &*node.children[idx],
            }
        }
    }

    /// Splits the full child at `idx`: its median moves up into `self` and
    /// its upper `t - 1` keys move into a new right sibling.
    fn split_child(&mut self, idx: usize, degree: usize) {
        let child = &mut self.children[idx];
        debug_assert_eq!(child.keys.len(), 2 * degree - 1);

        let mut right = Node::with_capacity(degree, child.is_leaf());
        right.keys.extend(child.keys.drain(degree..));
        if !child.is_leaf() {
            right.children.extend(child.children.drain(degree..));
        }
        let median = child.keys.pop().expect("full node has a median");

        self.keys.insert(idx, median);
        self.children.insert(idx + 1, Box::new(right));
    }

    /// Inserts into a node known to have room for one more key.
    fn insert_non_full(&mut self, key: Key, degree: usize) -> Option<Key> {
        let mut idx = match self.search(&key) {
            Ok(idx) => return Some(std::mem::replace(&mut self.keys[idx], key)),
            Err(idx) => idx,
        };

        if self.is_leaf() {
            self.keys.insert(idx, key);
            return None;
        }

        if self.children[idx].keys.len() == 2 * degree - 1 {
            self.split_child(idx, degree);
            match key::compare(&key, &self.keys[idx]) {
                Ordering::Less => {}
                Ordering::Greater => idx += 1,
                Ordering::Equal => {
                    return Some(std::mem::replace(&mut self.keys[idx], key));
                }
            }
        }
        self.children[idx].insert_non_full(key, degree)
    }

    /// Removes `key` from the subtree. `self` must hold at least `t` keys
    /// unless it is the root.
    fn remove(&mut self, key: &[u8], degree: usize) -> Option<Key> {
        match self.search(key) {
            Ok(idx) if self.is_leaf() => Some(self.keys.remove(idx)),
            Ok(idx) => {
                if self.children[idx].keys.len() >= degree {
                    let pred = self.children[idx].pop_last(degree);
                    Some(std::mem::replace(&mut self.keys[idx], pred))
                } else if self.children[idx + 1].keys.len() >= degree {
                    let succ = self.children[idx + 1].pop_first(degree);
                    Some(std::mem::replace(&mut self.keys[idx], succ))
                } else {
                    // Both neighbours are minimal: fold the key down into a
                    // merged child of 2t - 1 keys and remove it from there.
                    self.merge_children(idx);
                    self.children[idx].remove(key, degree)
                }
            }
            Err(_) if self.is_leaf() => None,
            Err(idx) => {
                let idx = self.fill_child(idx, degree);
                self.children[idx].remove(key, degree)
            }
        }
    }

    /// Removes and returns the largest key in the subtree.
    fn pop_last(&mut self, degree: usize) -> Key {
        if self.is_leaf() {
            return self.keys.pop().expect("non-empty leaf");
        }
        let idx = self.fill_child(self.children.len() - 1, degree);
        self.children[idx].pop_last(degree)
    }

    /// Removes and returns the smallest key in the subtree.
    fn pop_first(&mut self, degree: usize) -> Key {
        if self.is_leaf() {
            return self.keys.remove(0);
        }
        let idx = self.fill_child(0, degree);
        self.children[idx].pop_first(degree)
    }

    /// Ensures the child at `idx` holds at least `t` keys before a descent.
    ///
    /// Returns the index of the child that now covers the same key range,
    /// which moves one to the left when the child is merged into its left
    /// sibling.
    fn fill_child(&mut self, idx: usize, degree: usize) -> usize {
        if self.children[idx].keys.len() >= degree {
            return idx;
        }
        if idx > 0 && self.children[idx - 1].keys.len() >= degree {
            self.borrow_from_left(idx);
            idx
        } else if idx + 1 < self.children.len() && self.children[idx + 1].keys.len() >= degree {
            self.borrow_from_right(idx);
            idx
        } else if idx + 1 < self.children.len() {
            self.merge_children(idx);
            idx
        } else {
            self.merge_children(idx - 1);
            idx - 1
        }
    }

    /// Rotates the last key of the left sibling up through the separator
    /// and into the front of `children[idx]`.
    fn borrow_from_left(&mut self, idx: usize) {
        let left = &mut self.children[idx - 1];
        let key = left.keys.pop().expect("sibling above minimum");
        let edge = left.children.pop();

        let sep = std::mem::replace(&mut self.keys[idx - 1], key);
        let child = &mut self.children[idx];
        child.keys.insert(0, sep);
        if let Some(edge) = edge {
            child.children.insert(0, edge);
        }
    }

    /// Rotates the first key of the right sibling up through the separator
    /// and onto the end of `children[idx]`.
    fn borrow_from_right(&mut self, idx: usize) {
        let right = &mut self.children[idx + 1];
        let key = right.keys.remove(0);
        let edge = (!right.is_leaf()).then(|| right.children.remove(0));

        let sep = std::mem::replace(&mut self.keys[idx], key);
        let child = &mut self.children[idx];
        child.keys.push(sep);
        if let Some(edge) = edge {
            child.children.push(edge);
        }
    }

    /// Merges `children[idx + 1]` and the separator `keys[idx]` into
    /// `children[idx]`.
    fn merge_children(&mut self, idx: usize) {
        let right = self.children.remove(idx + 1);
        let sep = self.keys.remove(idx);
        let Node { keys, children } = *right;

        let left = &mut self.children[idx];
        left.keys.push(sep);
        left.keys.extend(keys);
        left.children.extend(children);
    }
}

// =============================================================================
// BTree
// =============================================================================

#[derive(Clone, Debug)]
pub struct BTree {
    root: Box<Node>,
    degree: usize,
    count: usize,
    height: usize,
}

impl BTree {
    /// Creates an empty tree with minimum degree `degree`.
    ///
    /// # Panics
    ///
    /// If `degree < 2`. Use [`BTree::try_new`] to handle that as an error.
    #[track_caller]
    pub fn new(degree: usize) -> Self {
        Self::try_new(degree).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_new(degree: usize) -> Result<Self> {
        if degree < 2 {
            return Err(Error::InvalidDegree(degree));
        }
        Ok(Self {
            root: Box::new(Node::with_capacity(degree, true)),
            degree,
            count: 0,
            height: 1,
        })
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of node levels; a lone root leaf has height 1.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn max_keys(&self) -> usize {
        2 * self.degree - 1
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.root.get(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `key`, replacing and returning an equal key if one is stored.
    pub fn insert(&mut self, key: Key) -> Option<Key> {
        if self.root.keys.len() == self.max_keys() {
            let old_root = std::mem::replace(
                &mut self.root,
                Box::new(Node::with_capacity(self.degree, false)),
            );
            self.root.children.push(old_root);
            self.root.split_child(0, self.degree);
            self.height += 1;
            trace!(height = self.height, "b-tree root split");
        }

        let replaced = self.root.insert_non_full(key, self.degree);
        if replaced.is_none() {
            self.count += 1;
        }
        replaced
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Key> {
        let removed = self.root.remove(key, self.degree);

        // A merge at the top can drain the root; its only child takes over.
        if self.root.keys.is_empty() && !self.root.is_leaf() {
            if let Some(child) = self.root.children.pop() {
                self.root = child;
                self.height -= 1;
                trace!(height = self.height, "b-tree root collapsed");
            }
        }

        if removed.is_some() {
            self.count -= 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.root = Box::new(Node::with_capacity(self.degree, true));
        self.count = 0;
        self.height = 1;
    }

    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(&self.root);
        iter
    }
}

/// In-order iterator over a [`BTree`].
pub struct Iter<'a> {
    /// Nodes on the current path with the index of their next key.
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = &**child,
                None => break,
            }
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, idx) = self.stack.last_mut()?;
            let node: &'a Node = *node;
            let i = *idx;
            if i >= node.keys.len() {
                self.stack.pop();
                continue;
            }
            *idx += 1;
            if let Some(child) = node.children.get(i + 1) {
                self.push_left_spine(child);
            }
            return Some(node.keys[i].as_slice());
        }
    }
}

impl Collection for BTree {
    fn add(&mut self, key: Key) {
        self.insert(key);
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        BTree::get(self, key)
    }

    fn delete(&mut self, key: &[u8]) -> Option<Key> {
        self.remove(key)
    }

    fn freeze(&mut self) {}

    fn len(&self) -> usize {
        self.count
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
        Box::new(BTree::iter(self))
    }
}

// =============================================================================
// Invariant checks (tests)
// =============================================================================

#[cfg(test)]
impl BTree {
    /// Panics unless occupancy, ordering and uniform leaf depth hold.
    pub(crate) fn validate(&self) {
        let mut leaf_depth = None;
        let mut seen = 0usize;
        self.validate_node(&self.root, true, 1, None, None, &mut leaf_depth, &mut seen);
        assert_eq!(seen, self.count, "reachable keys must match len");
        assert_eq!(leaf_depth, Some(self.height), "height must match leaf depth");
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_node(
        &self,
        node: &Node,
        is_root: bool,
        depth: usize,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
        leaf_depth: &mut Option<usize>,
        seen: &mut usize,
    ) {
        let n = node.keys.len();
        assert!(n <= self.max_keys(), "node over capacity: {n}");
        if !is_root {
            assert!(n >= self.degree - 1, "node under minimum: {n}");
        }
        assert!(
            node.keys.windows(2).all(|w| w[0] < w[1]),
            "node keys must be strictly ascending"
        );
        if let (Some(lo), Some(first)) = (lower, node.keys.first()) {
            assert!(lo < first.as_slice(), "key below its separator");
        }
        if let (Some(hi), Some(last)) = (upper, node.keys.last()) {
            assert!(last.as_slice() < hi, "key above its separator");
        }
        *seen += n;

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(d) => assert_eq!(d, depth, "leaves must share one depth"),
            }
            return;
        }

        assert_eq!(node.children.len(), n + 1, "internal node edge count");
        for (i, child) in node.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(node.keys[i - 1].as_slice()) };
            let hi = if i == n { upper } else { Some(node.keys[i].as_slice()) };
            self.validate_node(child, false, depth + 1, lo, hi, leaf_depth, seen);
        }
    }
}
