//! Red-black tree over an index-addressed node arena.
//!
//! Nodes live in a single `Vec` and refer to each other by `u32` slot
//! index, with [`NIL`] marking an absent child or parent. Rotations only
//! rewrite indices, so no node is ever shared or reference counted. Slots
//! freed by deletes are recycled by later inserts.
//!
//! The tree maintains the usual red-black invariants:
//! - a red node never has a red child;
//! - every root-to-absent-child path crosses the same number of black nodes;
//! - the root is black.
//!
//! which bound the height to `2 * log2(n + 1)`.

use std::cmp::Ordering;

use crate::key::{self, Key};
use crate::Collection;

// =============================================================================
// Node arena
// =============================================================================

type NodeId = u32;

/// Absent child/parent.
const NIL: NodeId = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct Node {
    key: Key,
    color: Color,
    parent: NodeId,
    left: NodeId,
    right: NodeId,
}

#[derive(Clone, Debug, Default)]
struct NodeArena {
    slots: Vec<Node>,
    free: Vec<NodeId>,
}

impl NodeArena {
    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id as usize] = node;
            return id;
        }
        let id = self.slots.len();
        debug_assert!(id < NIL as usize, "node arena exhausted");
        self.slots.push(node);
        id as NodeId
    }

    /// Releases a slot and hands back the key it held.
    fn free(&mut self, id: NodeId) -> Key {
        let node = &mut self.slots[id as usize];
        node.parent = NIL;
        node.left = NIL;
        node.right = NIL;
        self.free.push(id);
        std::mem::take(&mut node.key)
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    #[cfg(test)]
    fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

impl std::ops::Index<NodeId> for NodeArena {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.slots[id as usize]
    }
}

impl std::ops::IndexMut<NodeId> for NodeArena {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots[id as usize]
    }
}

// =============================================================================
// RedBlackTree
// =============================================================================

#[derive(Clone, Debug)]
pub struct RedBlackTree {
    nodes: NodeArena,
    root: NodeId,
    count: usize,
}

impl RedBlackTree {
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::default(),
            root: NIL,
            count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
        self.count = 0;
    }

    // --- accessors that treat NIL as a black leaf ---

    #[inline]
    fn color(&self, id: NodeId) -> Color {
        if id == NIL {
            Color::Black
        } else {
            self.nodes[id].color
        }
    }

    #[inline]
    fn is_red(&self, id: NodeId) -> bool {
        self.color(id) == Color::Red
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        if id != NIL {
            self.nodes[id].color = color;
        }
    }

    #[inline]
    fn left(&self, id: NodeId) -> NodeId {
        self.nodes[id].left
    }

    #[inline]
    fn right(&self, id: NodeId) -> NodeId {
        self.nodes[id].right
    }

    #[inline]
    fn parent(&self, id: NodeId) -> NodeId {
        self.nodes[id].parent
    }

    fn find(&self, key: &[u8]) -> NodeId {
        let mut cur = self.root;
        while cur != NIL {
            let node = &self.nodes[cur];
            cur = match key::compare(key, &node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return cur,
            };
        }
        NIL
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while self.left(id) != NIL {
            id = self.left(id);
        }
        id
    }

    /// Points `parent`'s link that used to reach `old` at `new`.
    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if parent == NIL {
            self.root = new;
        } else if self.left(parent) == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        let inner = self.left(y);
        self.nodes[x].right = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        let xp = self.parent(x);
        self.nodes[y].parent = xp;
        self.replace_child(xp, x, y);
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left(x);
        let inner = self.right(y);
        self.nodes[x].left = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        let xp = self.parent(x);
        self.nodes[y].parent = xp;
        self.replace_child(xp, x, y);
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    // --- lookup ---

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match self.find(key) {
            NIL => None,
            id => Some(self.nodes[id].key.as_slice()),
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.find(key) != NIL
    }

    // --- insert ---

    /// Inserts `key`, replacing and returning an equal key if one is stored.
    pub fn insert(&mut self, key: Key) -> Option<Key> {
        let mut parent = NIL;
        let mut went_left = false;
        let mut cur = self.root;
        while cur != NIL {
            parent = cur;
            match key::compare(&key, &self.nodes[cur].key) {
                Ordering::Less => {
                    went_left = true;
                    cur = self.left(cur);
                }
                Ordering::Greater => {
                    went_left = false;
                    cur = self.right(cur);
                }
                Ordering::Equal => {
                    return Some(std::mem::replace(&mut self.nodes[cur].key, key));
                }
            }
        }

        let z = self.nodes.alloc(Node {
            key,
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
        });
        if parent == NIL {
            self.root = z;
        } else if went_left {
            self.nodes[parent].left = z;
        } else {
            self.nodes[parent].right = z;
        }
        self.count += 1;
        self.insert_fixup(z);
        None
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.is_red(self.parent(z)) {
            // A red parent is never the root, so the grandparent exists.
            let p = self.parent(z);
            let g = self.parent(p);
            if p == self.left(g) {
                let uncle = self.right(g);
                if self.is_red(uncle) {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                    continue;
                }
                if z == self.right(p) {
                    z = p;
                    self.rotate_left(z);
                }
                let p = self.parent(z);
                let g = self.parent(p);
                self.set_color(p, Color::Black);
                self.set_color(g, Color::Red);
                self.rotate_right(g);
            } else {
                let uncle = self.left(g);
                if self.is_red(uncle) {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                    continue;
                }
                if z == self.left(p) {
                    z = p;
                    self.rotate_right(z);
                }
                let p = self.parent(z);
                let g = self.parent(p);
                self.set_color(p, Color::Black);
                self.set_color(g, Color::Red);
                self.rotate_left(g);
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    // --- remove ---

    /// Replaces the subtree rooted at `u` with the one rooted at `v`.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let up = self.parent(u);
        self.replace_child(up, u, v);
        if v != NIL {
            self.nodes[v].parent = up;
        }
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Key> {
        let z = self.find(key);
        if z == NIL {
            return None;
        }

        // `x` moves into the position vacated by the spliced-out node; it may
        // be NIL, so its parent is tracked separately.
        let x;
        let x_parent;
        let removed_color;

        if self.left(z) == NIL {
            removed_color = self.color(z);
            x = self.right(z);
            x_parent = self.parent(z);
            self.transplant(z, x);
        } else if self.right(z) == NIL {
            removed_color = self.color(z);
            x = self.left(z);
            x_parent = self.parent(z);
            self.transplant(z, x);
        } else {
            // Two children: the in-order successor takes z's place and color.
            let y = self.minimum(self.right(z));
            removed_color = self.color(y);
            x = self.right(y);
            if self.parent(y) == z {
                x_parent = y;
            } else {
                x_parent = self.parent(y);
                self.transplant(y, x);
                let zr = self.right(z);
                self.nodes[y].right = zr;
                self.nodes[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.left(z);
            self.nodes[y].left = zl;
            self.nodes[zl].parent = y;
            let zc = self.color(z);
            self.set_color(y, zc);
        }

        if removed_color == Color::Black {
            self.remove_fixup(x, x_parent);
        }
        self.count -= 1;
        Some(self.nodes.free(z))
    }

    /// Restores uniform black height after a black node left the path
    /// through `x`.
    fn remove_fixup(&mut self, mut x: NodeId, mut parent: NodeId) {
        while x != self.root && !self.is_red(x) {
            if x == self.left(parent) {
                let mut w = self.right(parent);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    w = self.right(parent);
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if !self.is_red(self.right(w)) {
                        let wl = self.left(w);
                        self.set_color(wl, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(parent);
                    }
                    let pc = self.color(parent);
                    self.set_color(w, pc);
                    self.set_color(parent, Color::Black);
                    let wr = self.right(w);
                    self.set_color(wr, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                    parent = NIL;
                }
            } else {
                let mut w = self.left(parent);
                if self.is_red(w) {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    w = self.left(parent);
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if !self.is_red(self.left(w)) {
                        let wr = self.right(w);
                        self.set_color(wr, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(parent);
                    }
                    let pc = self.color(parent);
                    self.set_color(w, pc);
                    self.set_color(parent, Color::Black);
                    let wl = self.left(w);
                    self.set_color(wl, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                    parent = NIL;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }
}

impl Default for RedBlackTree {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over a [`RedBlackTree`].
pub struct Iter<'a> {
    tree: &'a RedBlackTree,
    stack: Vec<NodeId>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut id: NodeId) {
        while id != NIL {
            self.stack.push(id);
            id = self.tree.left(id);
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.push_left_spine(self.tree.right(id));
        Some(self.tree.nodes[id].key.as_slice())
    }
}

impl Collection for RedBlackTree {
    fn add(&mut self, key: Key) {
        self.insert(key);
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        RedBlackTree::get(self, key)
    }

    fn delete(&mut self, key: &[u8]) -> Option<Key> {
        self.remove(key)
    }

    fn freeze(&mut self) {}

    fn len(&self) -> usize {
        self.count
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
        Box::new(RedBlackTree::iter(self))
    }
}

// =============================================================================
// Invariant checks (tests)
// =============================================================================

#[cfg(test)]
impl RedBlackTree {
    /// Panics unless every red-black and search-tree invariant holds.
    /// Returns the black height of the tree.
    pub(crate) fn validate(&self) -> usize {
        assert!(!self.is_red(self.root), "root must be black");
        if self.root != NIL {
            assert_eq!(self.parent(self.root), NIL, "root must have no parent");
        }
        let mut seen = 0usize;
        let black_height = self.validate_node(self.root, None, None, &mut seen);
        assert_eq!(seen, self.count, "reachable nodes must match len");
        assert_eq!(self.nodes.live(), self.count, "arena must hold only live nodes");
        black_height
    }

    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
        seen: &mut usize,
    ) -> usize {
        if id == NIL {
            return 1;
        }
        *seen += 1;
        let node = &self.nodes[id];
        if let Some(lo) = lower {
            assert!(lo < node.key.as_slice(), "left subtree key out of order");
        }
        if let Some(hi) = upper {
            assert!(node.key.as_slice() < hi, "right subtree key out of order");
        }
        for child in [node.left, node.right] {
            if child != NIL {
                assert_eq!(self.parent(child), id, "child must link back to parent");
            }
        }
        if node.color == Color::Red {
            assert!(!self.is_red(node.left), "red node with red left child");
            assert!(!self.is_red(node.right), "red node with red right child");
        }

        let lh = self.validate_node(node.left, lower, Some(&node.key), seen);
        let rh = self.validate_node(node.right, Some(&node.key), upper, seen);
        assert_eq!(lh, rh, "black height must be uniform");
        lh + usize::from(node.color == Color::Black)
    }

    pub(crate) fn height(&self) -> usize {
        fn depth(t: &RedBlackTree, id: NodeId) -> usize {
            if id == NIL {
                0
            } else {
                1 + depth(t, t.left(id)).max(depth(t, t.right(id)))
            }
        }
        depth(self, self.root)
    }
}
