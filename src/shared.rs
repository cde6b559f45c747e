//! A trie behind a reader-writer lock.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::error::Result;
use crate::tree::Critbit;

/// A [`Critbit`] that can be shared between threads.
///
/// Readers run in parallel and writers are exclusive. Each method holds the
/// lock for its whole duration and returns owned data, so no borrow of the
/// trie outlives the call. Use [`read`](Self::read) or
/// [`write`](Self::write) to run several operations under one lock.
pub struct SharedCritbit<V> {
    inner: RwLock<Critbit<V>>,
}

impl<V> SharedCritbit<V> {
    /// Create an empty shared trie with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty shared trie with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(Critbit::with_config(config)),
        }
    }

    /// Unwrap the trie.
    pub fn into_inner(self) -> Critbit<V> {
        self.inner.into_inner()
    }

    /// Insert a key-value pair. Returns `Ok(false)` if the key was present.
    pub fn insert(&self, key: impl AsRef<[u8]>, value: V) -> Result<bool> {
        self.inner.write().insert(key.as_ref(), value)
    }

    /// Insert or overwrite a key-value pair.
    pub fn upsert(&self, key: impl AsRef<[u8]>, value: V) -> Result<()> {
        self.inner.write().upsert(key.as_ref(), value)
    }

    /// Replace the value of a present key, returning the old value.
    pub fn update(&self, key: impl AsRef<[u8]>, value: V) -> Option<V> {
        self.inner.write().update(key.as_ref(), value)
    }

    /// Remove a key, returning its value.
    pub fn remove(&self, key: impl AsRef<[u8]>) -> Option<V> {
        self.inner.write().remove(key.as_ref())
    }

    /// Remove a key. Returns whether it was present.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> bool {
        self.inner.write().delete(key.as_ref())
    }

    /// Check if a key is stored.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.inner.read().contains_key(key.as_ref())
    }

    /// Get the number of keys.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the trie is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys in order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.inner.read().keys().map(<[u8]>::to_vec).collect()
    }

    /// Lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Critbit<V>> {
        self.inner.read()
    }

    /// Lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Critbit<V>> {
        self.inner.write()
    }
}

impl<V: Clone> SharedCritbit<V> {
    /// Get a copy of the value for a key.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<V> {
        self.inner.read().get(key.as_ref()).cloned()
    }

    /// Get the first key starting with `prefix`, with its value.
    pub fn get_prefix(&self, prefix: impl AsRef<[u8]>) -> Option<(Vec<u8>, V)> {
        let inner = self.inner.read();
        inner
            .get_prefix(prefix.as_ref())
            .map(|(k, v)| (k.to_vec(), v.clone()))
    }

    /// Collect [`Critbit::iter_from`].
    pub fn iter_from(
        &self,
        key: impl AsRef<[u8]>,
        exact_only: bool,
        max_count: usize,
    ) -> Vec<(Vec<u8>, V)> {
        let inner = self.inner.read();
        inner
            .iter_from(key.as_ref(), exact_only, max_count)
            .map(|(k, v)| (k.to_vec(), v.clone()))
            .collect()
    }

    /// Collect [`Critbit::range_from`].
    pub fn range_from(&self, key: impl AsRef<[u8]>) -> Vec<(Vec<u8>, V)> {
        let inner = self.inner.read();
        inner
            .range_from(key.as_ref())
            .map(|(k, v)| (k.to_vec(), v.clone()))
            .collect()
    }
}

impl<V> Default for SharedCritbit<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> From<Critbit<V>> for SharedCritbit<V> {
    fn from(tree: Critbit<V>) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }
}
