//! Descents from the root shared by lookups and mutations.

use crate::arena::Child;
use crate::bits::CritBit;
use crate::tree::Critbit;

/// Where a child reference is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    Root,
    Child(u32, usize),
}

/// Leaf reached by a descent, with the two nodes above it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ancestry {
    pub leaf: u32,
    /// `(node, direction taken)`; `None` when the leaf is the root.
    pub parent: Option<(u32, usize)>,
    /// `None` when the parent is the root.
    pub grandparent: Option<(u32, usize)>,
}

impl Ancestry {
    /// Link that currently points at the parent node.
    pub(crate) fn parent_link(&self) -> Link {
        match self.grandparent {
            Some((node, direction)) => Link::Child(node, direction),
            None => Link::Root,
        }
    }
}

/// The subtree a new branch node has to be spliced in front of.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BranchPoint {
    pub link: Link,
    pub target: Child,
}

impl<V> Critbit<V> {
    /// Leaf that `key` collides with, following `key`'s bits from the root.
    ///
    /// Not an exact match: the caller compares the leaf key itself.
    pub(crate) fn find_best_leaf(&self, key: &[u8]) -> Option<u32> {
        let mut current = self.root;
        loop {
            match current {
                Child::Nil => return None,
                Child::Leaf(idx) => return Some(idx),
                Child::Node(idx) => {
                    let direction = self.arena.node(idx).direction(key);
                    current = self.arena.child(idx, direction);
                }
            }
        }
    }

    /// [`find_best_leaf`](Self::find_best_leaf), also reporting the parent and
    /// grandparent so the caller can unlink the leaf.
    pub(crate) fn find_best_leaf_with_ancestry(&self, key: &[u8]) -> Option<Ancestry> {
        let mut parent = None;
        let mut grandparent = None;
        let mut current = self.root;
        loop {
            match current {
                Child::Nil => return None,
                Child::Leaf(leaf) => {
                    return Some(Ancestry {
                        leaf,
                        parent,
                        grandparent,
                    })
                }
                Child::Node(idx) => {
                    let direction = self.arena.node(idx).direction(key);
                    grandparent = parent;
                    parent = Some((idx, direction));
                    current = self.arena.child(idx, direction);
                }
            }
        }
    }

    /// Descends while nodes test bits more significant than `crit`, and
    /// returns the first item that must end up below a node branching on it.
    pub(crate) fn find_branch_point(&self, crit: &CritBit, key: &[u8]) -> BranchPoint {
        let position = crit.position();
        let mut link = Link::Root;
        let mut current = self.root;
        while let Child::Node(idx) = current {
            let node = self.arena.node(idx);
            debug_assert_ne!(node.position(), position);
            if node.position() > position {
                break;
            }
            let direction = node.direction(key);
            link = Link::Child(idx, direction);
            current = self.arena.child(idx, direction);
        }
        BranchPoint {
            link,
            target: current,
        }
    }

    pub(crate) fn set_link(&mut self, link: Link, item: Child) {
        match link {
            Link::Root => self.root = item,
            Link::Child(idx, direction) => self.arena.node_mut(idx).child[direction] = item,
        }
    }
}
