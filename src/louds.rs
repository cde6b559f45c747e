//! Level-order unary degree sequence (LOUDS) of a trie's shape.
//!
//! The encoding starts with a super-root `10`, then lists every item in
//! breadth-first order: a branch node contributes `110` (two children), a
//! leaf contributes `0`. Key bytes are not encoded, so two tries with the
//! same branching structure encode identically.

use std::collections::VecDeque;
use std::fmt;

use crate::arena::Child;
use crate::tree::Critbit;

/// A packed bit sequence produced by [`Critbit::encode_shape`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Louds {
    words: Vec<u64>,
    len: usize,
}

impl Louds {
    fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(64)),
            len: 0,
        }
    }

    fn push(&mut self, bit: bool) {
        let word = self.len / 64;
        if word == self.words.len() {
            self.words.push(0);
        }
        if bit {
            self.words[word] |= 1 << (self.len % 64);
        }
        self.len += 1;
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no bits. Never true for an encoded trie.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| self.words[index / 64] >> (index % 64) & 1 == 1)
    }

    /// Bits in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.words[i / 64] >> (i % 64) & 1 == 1)
    }

    /// One byte per bit, each `0` or `1`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.iter().map(u8::from).collect()
    }

    /// Backing words; bit `i` is bit `i % 64` of word `i / 64`.
    pub fn as_words(&self) -> &[u64] {
        &self.words
    }
}

impl fmt::Display for Louds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl<V> Critbit<V> {
    /// Encodes the shape of the trie as LOUDS.
    ///
    /// A trie with `n` nodes and leaves in total encodes to `2n + 1` bits;
    /// an empty trie encodes to the single bit `0`.
    pub fn encode_shape(&self) -> Louds {
        if self.root == Child::Nil {
            let mut louds = Louds::with_capacity(1);
            louds.push(false);
            return louds;
        }

        let items = self.node_count() + self.len();
        let mut louds = Louds::with_capacity(2 * items + 1);
        louds.push(true);
        louds.push(false);

        let mut queue = VecDeque::with_capacity(self.len());
        queue.push_back(self.root);
        while let Some(item) = queue.pop_front() {
            match item {
                Child::Leaf(_) => louds.push(false),
                Child::Node(idx) => {
                    louds.push(true);
                    louds.push(true);
                    louds.push(false);
                    queue.push_back(self.arena.child(idx, 0));
                    queue.push_back(self.arena.child(idx, 1));
                }
                Child::Nil => unreachable!("nil child queued for encoding"),
            }
        }

        debug_assert_eq!(louds.len(), 2 * items + 1);
        louds
    }
}
