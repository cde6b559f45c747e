//! Slot arena for branch nodes and leaves.
//!
//! Nodes and leaves live in two flat vectors and refer to each other by
//! 32-bit index, so the trie does no per-node heap allocation. Freed slots
//! are chained onto a free list per vector and handed out again before
//! either vector grows.

use std::mem;

use crate::bits;
use crate::error::{Error, Result};

/// Terminates a free list. Never a valid slot index.
pub(crate) const NIL: u32 = u32::MAX;

/// Leaves are indexed `0..NIL`.
pub(crate) const MAX_LEAVES: usize = NIL as usize;

/// `n` leaves need `n - 1` branch nodes.
pub(crate) const MAX_NODES: usize = MAX_LEAVES - 1;

/// Most leaf slots reserved up front; a larger capacity hint grows on demand.
const MAX_PREALLOC: usize = 1 << 20;

/// Tagged reference from a node (or the root) to what hangs below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Child {
    Nil,
    Node(u32),
    Leaf(u32),
}

/// Branch node testing one bit of the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Node {
    /// Byte position within the key.
    pub offset: u32,
    /// Single-bit mask applied to the byte at `offset`.
    pub bit: u8,
    /// `child[0]` holds keys with the bit clear, `child[1]` keys with it set.
    pub child: [Child; 2],
}

impl Node {
    pub(crate) fn new(offset: u32, bit: u8) -> Self {
        debug_assert!(bit.is_power_of_two(), "bit mask {bit:#04x}");
        Self {
            offset,
            bit,
            child: [Child::Nil; 2],
        }
    }

    #[inline]
    pub(crate) fn direction(&self, key: &[u8]) -> usize {
        bits::direction(key, self.offset, self.bit)
    }

    #[inline]
    pub(crate) fn position(&self) -> u64 {
        bits::bit_position(self.offset, self.bit)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Leaf<V> {
    pub key: Box<[u8]>,
    pub value: V,
}

/// A free slot keeps its successor in its own variant, never in the payload.
#[derive(Clone, Debug)]
enum Slot<T> {
    Occupied(T),
    Free { next: u32 },
}

#[derive(Clone, Debug)]
pub(crate) struct Arena<V> {
    nodes: Vec<Slot<Node>>,
    leaves: Vec<Slot<Leaf<V>>>,
    free_node: u32,
    free_leaf: u32,
    live_nodes: usize,
    live_leaves: usize,
    key_bytes: usize,
    leaf_limit: usize,
    node_limit: usize,
}

impl<V> Arena<V> {
    pub(crate) fn new(capacity: usize, leaf_limit: usize) -> Self {
        let leaf_limit = leaf_limit.min(MAX_LEAVES);
        let capacity = capacity.min(leaf_limit).min(MAX_PREALLOC);
        Self {
            nodes: Vec::with_capacity(capacity.saturating_sub(1)),
            leaves: Vec::with_capacity(capacity),
            free_node: NIL,
            free_leaf: NIL,
            live_nodes: 0,
            live_leaves: 0,
            key_bytes: 0,
            leaf_limit,
            node_limit: MAX_NODES,
        }
    }

    #[inline]
    pub(crate) fn live_nodes(&self) -> usize {
        self.live_nodes
    }

    #[inline]
    pub(crate) fn live_leaves(&self) -> usize {
        self.live_leaves
    }

    pub(crate) fn alloc_leaf(&mut self, key: Box<[u8]>, value: V) -> Result<u32> {
        if self.live_leaves >= self.leaf_limit {
            return Err(Error::CapacityExceeded {
                limit: self.leaf_limit,
            });
        }

        let key_len = key.len();
        let slot = Slot::Occupied(Leaf { key, value });
        let idx = if self.free_leaf == NIL {
            let idx = self.leaves.len() as u32;
            self.leaves.push(slot);
            idx
        } else {
            let idx = self.free_leaf;
            match mem::replace(&mut self.leaves[idx as usize], slot) {
                Slot::Free { next } => self.free_leaf = next,
                Slot::Occupied(_) => panic!("corrupt arena: free leaf list points at live leaf {idx}"),
            }
            idx
        };

        self.live_leaves += 1;
        self.key_bytes += key_len;
        Ok(idx)
    }

    /// Releases a leaf slot and hands back what it held.
    pub(crate) fn free_leaf(&mut self, idx: u32) -> Leaf<V> {
        let freed = Slot::Free {
            next: self.free_leaf,
        };
        let leaf = match mem::replace(&mut self.leaves[idx as usize], freed) {
            Slot::Occupied(leaf) => leaf,
            Slot::Free { .. } => panic!("corrupt arena: leaf {idx} freed twice"),
        };
        self.free_leaf = idx;
        self.live_leaves -= 1;
        self.key_bytes -= leaf.key.len();
        leaf
    }

    pub(crate) fn alloc_node(&mut self, node: Node) -> Result<u32> {
        if self.live_nodes >= self.node_limit {
            return Err(Error::CapacityExceeded {
                limit: self.node_limit,
            });
        }

        let slot = Slot::Occupied(node);
        let idx = if self.free_node == NIL {
            let idx = self.nodes.len() as u32;
            self.nodes.push(slot);
            idx
        } else {
            let idx = self.free_node;
            match mem::replace(&mut self.nodes[idx as usize], slot) {
                Slot::Free { next } => self.free_node = next,
                Slot::Occupied(_) => panic!("corrupt arena: free node list points at live node {idx}"),
            }
            idx
        };

        self.live_nodes += 1;
        Ok(idx)
    }

    pub(crate) fn free_node(&mut self, idx: u32) {
        let freed = Slot::Free {
            next: self.free_node,
        };
        if let Slot::Free { .. } = mem::replace(&mut self.nodes[idx as usize], freed) {
            panic!("corrupt arena: node {idx} freed twice");
        }
        self.free_node = idx;
        self.live_nodes -= 1;
    }

    #[inline]
    pub(crate) fn node(&self, idx: u32) -> &Node {
        match &self.nodes[idx as usize] {
            Slot::Occupied(node) => node,
            Slot::Free { .. } => panic!("corrupt trie: node {idx} is on the free list"),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, idx: u32) -> &mut Node {
        match &mut self.nodes[idx as usize] {
            Slot::Occupied(node) => node,
            Slot::Free { .. } => panic!("corrupt trie: node {idx} is on the free list"),
        }
    }

    /// Child of a live node that must be present, as on any path of a
    /// well-formed trie.
    #[inline]
    pub(crate) fn child(&self, idx: u32, direction: usize) -> Child {
        match self.node(idx).child[direction] {
            Child::Nil => panic!("corrupt trie: node {idx} has no child in direction {direction}"),
            child => child,
        }
    }

    #[inline]
    pub(crate) fn leaf(&self, idx: u32) -> &Leaf<V> {
        match &self.leaves[idx as usize] {
            Slot::Occupied(leaf) => leaf,
            Slot::Free { .. } => panic!("corrupt trie: leaf {idx} is on the free list"),
        }
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self, idx: u32) -> &mut Leaf<V> {
        match &mut self.leaves[idx as usize] {
            Slot::Occupied(leaf) => leaf,
            Slot::Free { .. } => panic!("corrupt trie: leaf {idx} is on the free list"),
        }
    }

    /// Bytes reserved by both slot vectors plus the stored key bytes.
    pub(crate) fn memory_usage(&self) -> usize {
        self.nodes.capacity() * mem::size_of::<Slot<Node>>()
            + self.leaves.capacity() * mem::size_of::<Slot<Leaf<V>>>()
            + self.key_bytes
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        self.leaves.shrink_to_fit();
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
        self.free_node = NIL;
        self.free_leaf = NIL;
        self.live_nodes = 0;
        self.live_leaves = 0;
        self.key_bytes = 0;
    }

    #[cfg(test)]
    pub(crate) fn slot_counts(&self) -> (usize, usize) {
        (self.nodes.len(), self.leaves.len())
    }
}
