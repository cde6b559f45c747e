//! Ordered traversal.
//!
//! Walks are depth-first with an explicit stack: a branch node pushes its
//! right child and then its left, so leaves come off the stack in
//! byte-lexicographic key order.

use std::iter::FusedIterator;

use crate::arena::Child;
use crate::bits::find_critical_bit;
use crate::tree::Critbit;

/// Explicit work stack for tree walks.
///
/// Sized up front from the key count, since the height of a crit-bit trie
/// is usually close to `log2(len)`, and grown by half when a deeper path
/// shows up.
#[derive(Clone, Debug)]
pub(crate) struct WalkStack {
    items: Vec<Child>,
}

impl WalkStack {
    pub(crate) fn for_keys(keys: usize) -> Self {
        let estimate = ((keys.max(1) as f64).log2() * 1.5) as usize;
        Self {
            items: Vec::with_capacity(estimate.max(3)),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, item: Child) {
        if self.items.len() == self.items.capacity() {
            self.items.reserve_exact((self.items.capacity() / 2).max(1));
        }
        self.items.push(item);
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Child> {
        self.items.pop()
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

/// Iterator over `(key, value)` pairs in key order.
///
/// Created by [`Critbit::iter`], [`Critbit::iter_from`] and
/// [`Critbit::range_from`].
#[derive(Clone)]
pub struct Iter<'a, V> {
    tree: &'a Critbit<V>,
    stack: WalkStack,
    limit: Option<usize>,
}

impl<'a, V> Iter<'a, V> {
    fn empty(tree: &'a Critbit<V>) -> Self {
        Self {
            tree,
            stack: WalkStack::for_keys(0),
            limit: None,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.limit == Some(0) {
            return None;
        }
        let arena = &self.tree.arena;
        while let Some(item) = self.stack.pop() {
            match item {
                Child::Leaf(idx) => {
                    if let Some(limit) = self.limit.as_mut() {
                        *limit -= 1;
                    }
                    let leaf = arena.leaf(idx);
                    return Some((&leaf.key[..], &leaf.value));
                }
                Child::Node(idx) => {
                    self.stack.push(arena.child(idx, 1));
                    self.stack.push(arena.child(idx, 0));
                }
                Child::Nil => unreachable!("nil child pushed onto walk stack"),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = self.tree.len();
        (0, Some(self.limit.map_or(upper, |limit| limit.min(upper))))
    }
}

impl<V> FusedIterator for Iter<'_, V> {}

/// Iterator over keys in order. Created by [`Critbit::keys`].
#[derive(Clone)]
pub struct Keys<'a, V> {
    inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> FusedIterator for Keys<'_, V> {}

impl<'a, V> IntoIterator for &'a Critbit<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> Critbit<V> {
    /// Iterates over all entries in key order.
    pub fn iter(&self) -> Iter<'_, V> {
        let mut iter = Iter {
            tree: self,
            stack: WalkStack::for_keys(self.len()),
            limit: None,
        };
        if self.root != Child::Nil {
            iter.stack.push(self.root);
        }
        iter
    }

    /// Iterates over all keys in order.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys { inner: self.iter() }
    }

    /// Iterates from the entry anchored at `key`, yielding at most
    /// `max_count` entries (`0` for no limit).
    ///
    /// The anchor is `key` itself when stored. Otherwise, unless
    /// `exact_only` is set, it is the leaf a lookup of `key` lands on,
    /// provided that leaf's key starts with `key`; if not, nothing is
    /// yielded. From the anchor the walk continues through the anchor's
    /// sibling subtree and everything after it, but not through subtrees
    /// that branch off above the anchor's parent, so the entries come out in
    /// order and all share the anchor's neighbourhood. Use
    /// [`range_from`](Self::range_from) for an unrestricted lower bound.
    pub fn iter_from(&self, key: &[u8], exact_only: bool, max_count: usize) -> Iter<'_, V> {
        let Some(path) = self.find_best_leaf_with_ancestry(key) else {
            return Iter::empty(self);
        };

        let found = &self.arena.leaf(path.leaf).key;
        if find_critical_bit(found, key).is_some() && (exact_only || !found.starts_with(key)) {
            return Iter::empty(self);
        }

        let mut iter = Iter {
            tree: self,
            stack: WalkStack::for_keys(self.len()),
            limit: (max_count > 0).then_some(max_count),
        };
        if let Some((parent, 0)) = path.parent {
            iter.stack.push(self.arena.child(parent, 1));
        }
        iter.stack.push(Child::Leaf(path.leaf));
        iter
    }

    /// Iterates over every entry whose key is `>= key`, in order.
    ///
    /// `key` need not be stored.
    pub fn range_from(&self, key: &[u8]) -> Iter<'_, V> {
        let Some(best) = self.find_best_leaf(key) else {
            return Iter::empty(self);
        };
        let crit = find_critical_bit(&self.arena.leaf(best).key, key);

        let mut stack = WalkStack::for_keys(self.len());
        let mut current = self.root;
        while let Child::Node(idx) = current {
            let node = self.arena.node(idx);
            if crit.is_some_and(|crit| node.position() > crit.position()) {
                break;
            }
            let direction = node.direction(key);
            if direction == 0 {
                stack.push(self.arena.child(idx, 1));
            }
            current = self.arena.child(idx, direction);
        }

        // Everything under `current` agrees with the best leaf at the
        // critical bit, so it sorts after `key` exactly when that bit is set.
        match crit {
            None => stack.push(current),
            Some(crit) if crit.direction == 1 => stack.push(current),
            Some(_) => {}
        }

        Iter {
            tree: self,
            stack,
            limit: None,
        }
    }
}
