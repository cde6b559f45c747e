//! # critbit-rs
//!
//! An ordered map from byte-string keys to values, stored as a critical-bit
//! (crit-bit) trie.
//!
//! Branch nodes and key/value leaves live in two index-addressed arenas with
//! free lists, so the trie does no per-node allocation and reuses slots
//! freed by deletes. Besides exact and prefix lookup and ordered iteration,
//! a trie can be split into two independent minimal tries at any key count,
//! and its shape can be encoded as a LOUDS bit sequence.
//!
//! ## Example
//!
//! ```rust
//! use critbit_rs::Critbit;
//!
//! let mut tree: Critbit<u64> = Critbit::new();
//! tree.insert(b"green", 1).unwrap();
//! tree.insert(b"gremlin", 2).unwrap();
//! tree.insert(b"blue", 3).unwrap();
//!
//! assert_eq!(tree.get(b"green"), Some(&1));
//! assert_eq!(tree.get_prefix(b"grem"), Some((&b"gremlin"[..], &2)));
//!
//! let keys: Vec<&[u8]> = tree.keys().collect();
//! assert_eq!(keys, [&b"blue"[..], b"green", b"gremlin"]);
//!
//! let (left, right) = tree.split_at(1);
//! assert_eq!(left.len(), 1);
//! assert_eq!(right.get(b"gremlin"), Some(&2));
//! ```
//!
//! ## Key comparison
//!
//! Keys are compared as if zero-padded to a common length. Two keys that
//! differ only in trailing `0x00` bytes are the same key to the trie.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
mod bits;
mod config;
mod error;
mod iter;
mod louds;
mod search;
mod shared;
mod split;
mod tree;

pub use bits::{find_critical_bit, CritBit};
pub use config::Config;
pub use error::{Error, Result};
pub use iter::{Iter, Keys};
pub use louds::Louds;
pub use shared::SharedCritbit;
pub use tree::Critbit;

/// Longest accepted key, in bytes.
pub const MAX_KEY_LEN: usize = 65536;

/// Most keys a trie can hold: one 32-bit index is reserved as a sentinel.
pub const MAX_KEYS: usize = u32::MAX as usize;


#[cfg(test)]
mod proptests;
