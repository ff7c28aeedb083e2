//! # art-index
//!
//! An ordered index over binary keys using an Adaptive Radix Tree (ART).
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory Databases"
//! (ICDE 2013, Leis et al.)
//!
//! Keys are compared as unsigned bytes, most significant byte first. Inner
//! nodes switch between 4, 16, 48 and 256-way layouts as their fan-out
//! changes, and every node keeps an uplink to its parent so ordered
//! navigation (successor, predecessor, ceiling, floor) never needs a stack.
//!
//! ## Example
//!
//! ```rust
//! use art_index::AdaptiveRadixTree;
//!
//! let mut tree: AdaptiveRadixTree<u64> = AdaptiveRadixTree::new();
//! tree.insert(b"hello", 1);
//! tree.insert(b"help", 2);
//! tree.insert(b"world", 3);
//!
//! assert_eq!(tree.get(b"hello"), Some(&1));
//! assert_eq!(tree.ceiling_key(b"hem"), Some(&b"world"[..]));
//! assert_eq!(tree.floor_key(b"hem"), Some(&b"help"[..]));
//!
//! let keys: Vec<&[u8]> = tree.keys().collect();
//! assert_eq!(keys, [&b"hello"[..], &b"help"[..], &b"world"[..]]);
//! ```

#![deny(unsafe_code)]

pub mod art;
pub mod error;
pub mod key;
pub mod ordering;
pub mod shared;

#[cfg(test)]
mod proptests;

pub use art::{AdaptiveRadixTree, Iter, Keys, NodeStats, NodeType, Range, Values};
pub use error::{ArtError, Result};
pub use key::{BinaryComparable, KeyedArt};
pub use shared::SharedArt;

/// Configuration for a tree.
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity hint for the node arena
    pub initial_capacity: usize,
    /// Replace an inner node left holding a single leaf by that leaf after a
    /// removal, so depth tracks where keys diverge rather than how long they
    /// once were
    pub collapse_single_child: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            collapse_single_child: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let mut t: AdaptiveRadixTree<u64> = AdaptiveRadixTree::new();
        t.insert(b"hello", 1);
        t.insert(b"world", 2);
        assert_eq!(t.get(b"hello"), Some(&1));
        assert_eq!(t.get(b"world"), Some(&2));
        assert_eq!(t.get(b"missing"), None);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_update() {
        let mut t: AdaptiveRadixTree<u64> = AdaptiveRadixTree::new();
        assert_eq!(t.insert(b"key", 1), None);
        assert_eq!(t.insert(b"key", 2), Some(1));
        assert_eq!(t.get(b"key"), Some(&2));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut t: AdaptiveRadixTree<u64> = AdaptiveRadixTree::new();
        t.insert(b"a", 1);
        t.insert(b"b", 2);
        t.insert(b"c", 3);

        assert_eq!(t.remove(b"b"), Some(2));
        assert_eq!(t.get(b"b"), None);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(b"a"), Some(&1));
        assert_eq!(t.get(b"c"), Some(&3));

        // Reinserting a removed key should increase length.
        assert_eq!(t.insert(b"b", 4), None);
        assert_eq!(t.get(b"b"), Some(&4));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_many_keys() {
        let mut t: AdaptiveRadixTree<usize> = AdaptiveRadixTree::new();
        for i in 0..10_000usize {
            let key = format!("key:{i:05}");
            t.insert(key.as_bytes(), i);
        }
        assert_eq!(t.len(), 10_000);
        for i in (0..10_000usize).step_by(7) {
            let key = format!("key:{i:05}");
            assert_eq!(t.get(key.as_bytes()), Some(&i));
        }
        t.check_integrity().unwrap();

        for i in (0..10_000usize).filter(|i| i % 3 != 0) {
            let key = format!("key:{i:05}");
            assert_eq!(t.remove(key.as_bytes()), Some(i));
        }
        assert_eq!(t.len(), 3334);
        t.check_integrity().unwrap();
        assert!(t.values().copied().eq((0..10_000usize).step_by(3)));
    }

    #[test]
    fn test_binary_keys_with_zero_bytes() {
        let mut t: AdaptiveRadixTree<u8> = AdaptiveRadixTree::new();
        let keys: [&[u8]; 5] = [b"\x00", b"\x00\x00", b"\x00\x01", b"\x01", b"\x00\x00\x00"];
        for (i, k) in keys.iter().enumerate() {
            t.insert(k, i as u8);
        }
        let mut sorted = keys.to_vec();
        sorted.sort();
        assert!(t.keys().eq(sorted));
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(t.get(k), Some(&(i as u8)));
        }
    }

    #[test]
    fn test_config_capacity_hint() {
        let config = Config {
            initial_capacity: 1,
            ..Config::default()
        };
        let mut t = AdaptiveRadixTree::with_config(config);
        for i in 0u16..300 {
            t.insert(&i.to_be_bytes(), i);
        }
        assert_eq!(t.len(), 300);
        assert_eq!(t.config().initial_capacity, 1);
        t.check_integrity().unwrap();
    }
}
