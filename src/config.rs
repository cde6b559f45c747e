//! Construction-time settings.

use crate::MAX_KEYS;

/// Configuration for a [`Critbit`](crate::Critbit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of keys to preallocate slots for. A hint only; the trie grows past it.
    pub initial_capacity: usize,
    /// Maximum number of live keys. Inserts beyond it fail with
    /// [`Error::CapacityExceeded`](crate::Error::CapacityExceeded).
    /// Values above [`MAX_KEYS`] are treated as `MAX_KEYS`.
    pub max_keys: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            max_keys: MAX_KEYS,
        }
    }
}

impl Config {
    /// Sets the preallocation hint.
    pub fn with_initial_capacity(mut self, keys: usize) -> Self {
        self.initial_capacity = keys;
        self
    }

    /// Sets the live key limit.
    pub fn with_max_keys(mut self, keys: usize) -> Self {
        self.max_keys = keys;
        self
    }

    pub(crate) fn key_limit(&self) -> usize {
        self.max_keys.min(MAX_KEYS)
    }

    /// Same limits, sized for a trie that will hold `keys` keys.
    pub(crate) fn sized_for(&self, keys: usize) -> Self {
        Self {
            initial_capacity: keys,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.initial_capacity, 0);
        assert_eq!(config.key_limit(), MAX_KEYS);
    }

    #[test]
    fn test_limit_is_clamped() {
        let config = Config::default().with_max_keys(usize::MAX);
        assert_eq!(config.key_limit(), MAX_KEYS);

        let config = Config::default().with_max_keys(10).with_initial_capacity(4);
        assert_eq!(config.key_limit(), 10);
        assert_eq!(config.sized_for(7).initial_capacity, 7);
        assert_eq!(config.sized_for(7).max_keys, 10);
    }
}
