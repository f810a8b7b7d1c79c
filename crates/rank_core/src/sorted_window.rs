//! Ordered window store: the sorted half of the sliding window.
//!
//! A treap over an arena of slots. Entries are `(value, seq)` pairs
//! ordered by value with the strictly increasing `seq` counter as a
//! tie-breaker, so no two live entries ever compare equal and equal
//! values keep their insertion order.
//!
//! Handles are arena slot indices. Rebalancing rotations rewire links
//! but never move a node between slots, so a handle stays valid from
//! `insert` until the matching `remove` no matter how many unrelated
//! mutations happen in between. The rank pointer and the temporal
//! queue both depend on that.
//!
//! Priorities are a hash of `seq` rather than drawn from an RNG, which
//! keeps the whole filter pass deterministic.

use crate::float_trait::RankFloat;
use std::cmp::Ordering;

const NIL: u32 = u32::MAX;

/// Stable reference to one window entry, valid until that entry is removed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NodeHandle(u32);

struct Node<F> {
    value: F,
    seq: u64,
    priority: u64,
    left: u32,
    right: u32,
    parent: u32,
}

pub struct SortedWindow<F: RankFloat> {
    nodes: Vec<Node<F>>,
    free: Vec<u32>,
    root: u32,
    len: usize,
}

/// Finalizer of SplitMix64; decorrelates consecutive seq ids into
/// well-mixed treap priorities.
#[inline]
fn mix_priority(seq: u64) -> u64 {
    let mut z = seq.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl<F: RankFloat> SortedWindow<F> {
    pub fn with_capacity(capacity: usize) -> Self {
        SortedWindow {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn value(&self, handle: NodeHandle) -> F {
        self.nodes[handle.0 as usize].value
    }

    /// Total order over entries: value first (IEEE total order), then seq.
    #[inline]
    fn cmp_entry(&self, value: F, seq: u64, at: u32) -> Ordering {
        let node = &self.nodes[at as usize];
        value
            .total_cmp(&node.value)
            .then(seq.cmp(&node.seq))
    }

    /// Insert an entry; expected O(log n). The returned handle survives
    /// every mutation except its own removal.
    pub fn insert(&mut self, value: F, seq: u64) -> NodeHandle {
        let id = self.alloc(value, seq);

        if self.root == NIL {
            self.root = id;
            self.len = 1;
            return NodeHandle(id);
        }

        // Standard BST descent; keys are unique so Equal never occurs.
        let mut cur = self.root;
        loop {
            let next = match self.cmp_entry(value, seq, cur) {
                Ordering::Less => self.nodes[cur as usize].left,
                _ => self.nodes[cur as usize].right,
            };
            if next == NIL {
                break;
            }
            cur = next;
        }
        match self.cmp_entry(value, seq, cur) {
            Ordering::Less => self.nodes[cur as usize].left = id,
            _ => self.nodes[cur as usize].right = id,
        }
        self.nodes[id as usize].parent = cur;

        // Restore the heap property by rotating the new leaf up.
        while self.nodes[id as usize].parent != NIL {
            let parent = self.nodes[id as usize].parent;
            if self.nodes[id as usize].priority >= self.nodes[parent as usize].priority {
                break;
            }
            self.rotate_up(id);
        }

        self.len += 1;
        NodeHandle(id)
    }

    /// Remove the entry behind `handle`; expected O(log n). Only this
    /// handle is invalidated.
    pub fn remove(&mut self, handle: NodeHandle) {
        let id = handle.0;

        // Rotate the node down to a leaf, always lifting the child with
        // the smaller priority so the heap property is preserved.
        loop {
            let left = self.nodes[id as usize].left;
            let right = self.nodes[id as usize].right;
            let lift = match (left, right) {
                (NIL, NIL) => break,
                (l, NIL) => l,
                (NIL, r) => r,
                (l, r) => {
                    if self.nodes[l as usize].priority <= self.nodes[r as usize].priority {
                        l
                    } else {
                        r
                    }
                }
            };
            self.rotate_up(lift);
        }

        // Detach the leaf.
        let parent = self.nodes[id as usize].parent;
        if parent == NIL {
            self.root = NIL;
        } else if self.nodes[parent as usize].left == id {
            self.nodes[parent as usize].left = NIL;
        } else {
            self.nodes[parent as usize].right = NIL;
        }

        self.free.push(id);
        self.len -= 1;
    }

    /// Handle at the given 0-based sorted position. O(k log n); only
    /// called once per pass, to seat the rank pointer.
    pub fn nth(&self, rank_index: usize) -> NodeHandle {
        debug_assert!(rank_index < self.len);
        let mut cur = self.leftmost(self.root);
        for _ in 0..rank_index {
            cur = self
                .next(NodeHandle(cur))
                .expect("rank_index < len")
                .0;
        }
        NodeHandle(cur)
    }

    /// In-order successor, or None at the maximum entry.
    pub fn next(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let id = handle.0;
        let right = self.nodes[id as usize].right;
        if right != NIL {
            return Some(NodeHandle(self.leftmost(right)));
        }
        let mut cur = id;
        let mut parent = self.nodes[cur as usize].parent;
        while parent != NIL && self.nodes[parent as usize].right == cur {
            cur = parent;
            parent = self.nodes[cur as usize].parent;
        }
        (parent != NIL).then(|| NodeHandle(parent))
    }

    /// In-order predecessor, or None at the minimum entry.
    pub fn prev(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let id = handle.0;
        let left = self.nodes[id as usize].left;
        if left != NIL {
            return Some(NodeHandle(self.rightmost(left)));
        }
        let mut cur = id;
        let mut parent = self.nodes[cur as usize].parent;
        while parent != NIL && self.nodes[parent as usize].left == cur {
            cur = parent;
            parent = self.nodes[cur as usize].parent;
        }
        (parent != NIL).then(|| NodeHandle(parent))
    }

    fn alloc(&mut self, value: F, seq: u64) -> u32 {
        let node = Node {
            value,
            seq,
            priority: mix_priority(seq),
            left: NIL,
            right: NIL,
            parent: NIL,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn leftmost(&self, mut id: u32) -> u32 {
        debug_assert_ne!(id, NIL);
        while self.nodes[id as usize].left != NIL {
            id = self.nodes[id as usize].left;
        }
        id
    }

    fn rightmost(&self, mut id: u32) -> u32 {
        debug_assert_ne!(id, NIL);
        while self.nodes[id as usize].right != NIL {
            id = self.nodes[id as usize].right;
        }
        id
    }

    /// Rotate `x` above its parent, preserving in-order position of
    /// every node. Links move, slots do not.
    fn rotate_up(&mut self, x: u32) {
        let p = self.nodes[x as usize].parent;
        debug_assert_ne!(p, NIL);
        let g = self.nodes[p as usize].parent;

        if self.nodes[p as usize].left == x {
            // Right rotation around p.
            let moved = self.nodes[x as usize].right;
            self.nodes[p as usize].left = moved;
            if moved != NIL {
                self.nodes[moved as usize].parent = p;
            }
            self.nodes[x as usize].right = p;
        } else {
            // Left rotation around p.
            let moved = self.nodes[x as usize].left;
            self.nodes[p as usize].right = moved;
            if moved != NIL {
                self.nodes[moved as usize].parent = p;
            }
            self.nodes[x as usize].left = p;
        }
        self.nodes[p as usize].parent = x;
        self.nodes[x as usize].parent = g;

        if g == NIL {
            self.root = x;
        } else if self.nodes[g as usize].left == p {
            self.nodes[g as usize].left = x;
        } else {
            self.nodes[g as usize].right = x;
        }
    }
}
