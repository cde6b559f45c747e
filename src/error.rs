//! Errors for trie mutations.

/// Result alias for fallible trie operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons an insert can be rejected.
///
/// Lookups never fail; a missing key is reported through `Option` or `bool`.
/// Either error leaves the trie exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The key is longer than [`MAX_KEY_LEN`](crate::MAX_KEY_LEN).
    #[error("key is {len} bytes, maximum is {max}")]
    KeyTooLong {
        /// Length of the rejected key.
        len: usize,
        /// Longest key the trie accepts.
        max: usize,
    },
    /// No slot is left for another key.
    #[error("trie is full ({limit} keys)")]
    CapacityExceeded {
        /// The key limit that was reached.
        limit: usize,
    },
}
