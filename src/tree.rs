//! The trie container and its point operations.

use std::fmt;

use tracing::{debug, trace};

use crate::arena::{Arena, Child, Leaf, Node};
use crate::bits::find_critical_bit;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::MAX_KEY_LEN;

/// An ordered map from byte-string keys to `V`, stored as a critical-bit trie.
///
/// Every branch node and every key/value pair lives in an arena slot and is
/// referenced by index. A trie holding `n >= 1` keys always has exactly
/// `n - 1` branch nodes.
pub struct Critbit<V> {
    pub(crate) arena: Arena<V>,
    pub(crate) root: Child,
    pub(crate) config: Config,
}

impl<V> Critbit<V> {
    /// Creates an empty trie with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty trie with slots preallocated for `capacity` keys.
    ///
    /// The capacity is only a hint and never limits the trie.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(Config::default().with_initial_capacity(capacity))
    }

    /// Creates an empty trie with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            arena: Arena::new(config.initial_capacity, config.key_limit()),
            root: Child::Nil,
            config,
        }
    }

    /// The configuration this trie was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of stored keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.live_leaves()
    }

    /// Whether the trie holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live branch nodes, always `len() - 1` for a non-empty trie.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.live_nodes()
    }

    /// Approximate heap footprint in bytes: reserved slots plus key bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.arena.memory_usage()
    }

    /// Releases spare slot capacity.
    pub fn shrink_to_fit(&mut self) {
        self.arena.shrink_to_fit();
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = Child::Nil;
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let idx = self.find_exact(key)?;
        Some(&self.arena.leaf(idx).value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let idx = self.find_exact(key)?;
        Some(&mut self.arena.leaf_mut(idx).value)
    }

    /// Whether `key` is stored.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find_exact(key).is_some()
    }

    /// Returns the smallest stored key that starts with `prefix`, with its value.
    ///
    /// An exact match is returned as is.
    pub fn get_prefix(&self, prefix: &[u8]) -> Option<(&[u8], &V)> {
        if prefix.len() > MAX_KEY_LEN {
            return None;
        }
        let leaf = self.arena.leaf(self.find_best_leaf(prefix)?);
        let matches =
            leaf.key.starts_with(prefix) || find_critical_bit(&leaf.key, prefix).is_none();
        matches.then(|| (&*leaf.key, &leaf.value))
    }

    /// Inserts `key` with `value`.
    ///
    /// Returns `Ok(true)` if the key was added. If it was already present the
    /// stored value is left alone, `value` is dropped and `Ok(false)` is
    /// returned. On error the trie is unchanged.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<bool> {
        if key.len() > MAX_KEY_LEN {
            return Err(Error::KeyTooLong {
                len: key.len(),
                max: MAX_KEY_LEN,
            });
        }

        let Some(best) = self.find_best_leaf(key) else {
            let leaf = self.alloc_leaf(key, value)?;
            self.root = Child::Leaf(leaf);
            return Ok(true);
        };

        let Some(crit) = find_critical_bit(&self.arena.leaf(best).key, key) else {
            return Ok(false);
        };

        // With a single leaf the branch point is the root leaf itself.
        let branch = self.find_branch_point(&crit, key);
        let leaf = self.alloc_leaf(key, value)?;

        let mut node = Node::new(crit.offset, crit.bit);
        node.child[1 - crit.direction] = Child::Leaf(leaf);
        node.child[crit.direction] = branch.target;
        let node = match self.arena.alloc_node(node) {
            Ok(node) => node,
            Err(err) => {
                self.arena.free_leaf(leaf);
                return Err(err);
            }
        };

        trace!(
            target: "critbit::tree",
            offset = crit.offset,
            bit = crit.bit,
            node,
            leaf,
            "spliced in branch node"
        );
        self.set_link(branch.link, Child::Node(node));
        Ok(true)
    }

    /// Replaces the value stored under `key`, returning the old one.
    ///
    /// Returns `None` and leaves the trie unchanged if `key` is absent.
    pub fn update(&mut self, key: &[u8], value: V) -> Option<V> {
        self.get_mut(key).map(|slot| std::mem::replace(slot, value))
    }

    /// Stores `value` under `key`, replacing any existing value.
    pub fn upsert(&mut self, key: &[u8], value: V) -> Result<()> {
        if let Some(slot) = self.get_mut(key) {
            *slot = value;
            return Ok(());
        }
        let inserted = self.insert(key, value)?;
        debug_assert!(inserted, "absent key reported as present on insert");
        Ok(())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        if key.len() > MAX_KEY_LEN {
            return None;
        }
        let path = self.find_best_leaf_with_ancestry(key)?;
        if find_critical_bit(&self.arena.leaf(path.leaf).key, key).is_some() {
            return None;
        }

        let Leaf { value, .. } = self.arena.free_leaf(path.leaf);
        match path.parent {
            None => self.root = Child::Nil,
            Some((parent, direction)) => {
                // The sibling takes the parent's place.
                let sibling = self.arena.child(parent, 1 - direction);
                self.set_link(path.parent_link(), sibling);
                self.arena.free_node(parent);
                trace!(target: "critbit::tree", node = parent, "elided branch node");
            }
        }
        Some(value)
    }

    /// Removes `key`, reporting whether it was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.remove(key).is_some()
    }

    fn find_exact(&self, key: &[u8]) -> Option<u32> {
        if key.len() > MAX_KEY_LEN {
            return None;
        }
        let idx = self.find_best_leaf(key)?;
        find_critical_bit(&self.arena.leaf(idx).key, key)
            .is_none()
            .then_some(idx)
    }

    fn alloc_leaf(&mut self, key: &[u8], value: V) -> Result<u32> {
        self.arena.alloc_leaf(key.into(), value).map_err(|err| {
            debug!(target: "critbit::tree", len = self.len(), %err, "insert rejected");
            err
        })
    }
}

impl<V> Default for Critbit<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for Critbit<V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            config: self.config.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Critbit<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v)))
            .finish()
    }
}
