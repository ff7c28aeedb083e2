//! Adaptive Radix Tree (ART) implementation.
//!
//! Based on "The Adaptive Radix Tree: ARTful Indexing for Main-Memory Databases"
//! by Leis et al., 2013.
//!
//! Key features:
//! - Adaptive node sizes (4, 16, 48, 256 children)
//! - Leaves stored lazily at the shallowest depth where their key is unique
//! - Uplinks from every node to its parent, so ordered navigation and
//!   iteration need no traversal stack

mod arena;
mod debug;
mod iter;
mod node;

use std::fmt;
use std::mem;
use std::ops::{Bound, RangeBounds};

use tracing::{debug, trace};

use crate::error::{ArtError, Result};
use crate::ordering::{common_prefix_len, compare};
use crate::Config;

use arena::{Arena, NodeId};
use node::{edge_at, Edge, Kind, Node, Uplink};

pub use debug::NodeStats;
pub use iter::{Iter, Keys, Range, Values};
pub use node::NodeType;

/// An ordered map from byte-string keys to values.
///
/// Keys compare as unsigned bytes, most significant first, and a key sorts
/// before every key it is a prefix of.
pub struct AdaptiveRadixTree<V> {
    arena: Arena<V>,
    root: Option<NodeId>,
    len: usize,
    config: Config,
}

impl<V> AdaptiveRadixTree<V> {
    /// Create a new empty tree with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new empty tree with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            arena: Arena::with_capacity(config.initial_capacity),
            root: None,
            len: 0,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        debug!(len = self.len, nodes = self.arena.live(), "clearing tree");
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    // =========================================================================
    // Point operations
    // =========================================================================

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.find_leaf(key).map(|id| &self.arena.leaf(id).value)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let id = self.find_leaf(key)?;
        Some(&mut self.arena.leaf_mut(id).value)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find_leaf(key).is_some()
    }

    /// Whether any entry holds `value`. Scans every leaf.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Insert a key-value pair.
    ///
    /// Returns the previous value if the key was already present.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let Some(mut id) = self.root else {
            self.root = Some(self.arena.alloc(Node::leaf(key, value)));
            self.len = 1;
            return None;
        };

        let mut depth = 0;
        loop {
            if self.arena.is_leaf(id) {
                let leaf = self.arena.leaf_mut(id);
                if leaf.key.as_slice() == key {
                    return Some(mem::replace(&mut leaf.value, value));
                }
                self.branch(id, depth, key, value);
                self.len += 1;
                return None;
            }

            let edge = edge_at(key, depth);
            match self.arena.inner(id).child(edge) {
                Some(child) => {
                    id = child;
                    depth += 1;
                }
                None => {
                    let leaf = self.arena.alloc(Node::leaf(key, value));
                    self.link(id, edge, leaf);
                    self.len += 1;
                    return None;
                }
            }
        }
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let id = self.find_leaf(key)?;
        Some(self.remove_leaf(id).1)
    }

    // =========================================================================
    // Ordered navigation
    // =========================================================================

    /// Smallest key in the tree.
    pub fn first_key(&self) -> Option<&[u8]> {
        self.first_key_value().map(|(k, _)| k)
    }

    /// Largest key in the tree.
    pub fn last_key(&self) -> Option<&[u8]> {
        self.last_key_value().map(|(k, _)| k)
    }

    pub fn first_key_value(&self) -> Option<(&[u8], &V)> {
        self.first_leaf().map(|id| self.entry(id))
    }

    pub fn last_key_value(&self) -> Option<(&[u8], &V)> {
        self.last_leaf().map(|id| self.entry(id))
    }

    /// Remove and return the entry with the smallest key.
    pub fn pop_first(&mut self) -> Option<(Vec<u8>, V)> {
        let id = self.first_leaf()?;
        Some(self.remove_leaf(id))
    }

    /// Remove and return the entry with the largest key.
    pub fn pop_last(&mut self) -> Option<(Vec<u8>, V)> {
        let id = self.last_leaf()?;
        Some(self.remove_leaf(id))
    }

    /// Smallest key `>= key`.
    pub fn ceiling_key(&self, key: &[u8]) -> Option<&[u8]> {
        self.ceiling_key_value(key).map(|(k, _)| k)
    }

    /// Largest key `<= key`.
    pub fn floor_key(&self, key: &[u8]) -> Option<&[u8]> {
        self.floor_key_value(key).map(|(k, _)| k)
    }

    /// Smallest key `> key`.
    pub fn higher_key(&self, key: &[u8]) -> Option<&[u8]> {
        self.higher_key_value(key).map(|(k, _)| k)
    }

    /// Largest key `< key`.
    pub fn lower_key(&self, key: &[u8]) -> Option<&[u8]> {
        self.lower_key_value(key).map(|(k, _)| k)
    }

    pub fn ceiling_key_value(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        self.seek_ceiling(key).map(|id| self.entry(id))
    }

    pub fn floor_key_value(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        self.seek_floor(key).map(|id| self.entry(id))
    }

    pub fn higher_key_value(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        self.seek_higher(key).map(|id| self.entry(id))
    }

    pub fn lower_key_value(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        self.seek_lower(key).map(|id| self.entry(id))
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        let ends = self.first_leaf().zip(self.last_leaf());
        Iter::new(Range::new(self, ends), self.len)
    }

    pub fn keys(&self) -> Keys<'_, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, V> {
        Values::new(self.iter())
    }

    /// Entries whose keys fall within `range`, in ascending order.
    ///
    /// Returns [`ArtError::InvertedRange`] if the start bound is greater than
    /// the end bound.
    ///
    /// ```
    /// use art_index::AdaptiveRadixTree;
    ///
    /// let tree: AdaptiveRadixTree<u32> =
    ///     [(b"a", 1), (b"b", 2), (b"c", 3)].into_iter().collect();
    /// let keys: Vec<&[u8]> = tree
    ///     .range(&b"b"[..]..)
    ///     .unwrap()
    ///     .map(|(k, _)| k)
    ///     .collect();
    /// assert_eq!(keys, [b"b", b"c"]);
    /// ```
    pub fn range<K, R>(&self, range: R) -> Result<Range<'_, V>>
    where
        K: AsRef<[u8]> + ?Sized,
        R: RangeBounds<K>,
    {
        let start = as_bytes(range.start_bound());
        let end = as_bytes(range.end_bound());
        if let (Bound::Included(s) | Bound::Excluded(s), Bound::Included(e) | Bound::Excluded(e)) =
            (start, end)
        {
            if compare(s, e).is_gt() {
                return Err(ArtError::InvertedRange);
            }
        }

        let front = match start {
            Bound::Included(k) => self.seek_ceiling(k),
            Bound::Excluded(k) => self.seek_higher(k),
            Bound::Unbounded => self.first_leaf(),
        };
        let back = match end {
            Bound::Included(k) => self.seek_floor(k),
            Bound::Excluded(k) => self.seek_lower(k),
            Bound::Unbounded => self.last_leaf(),
        };
        let ends = front
            .zip(back)
            .filter(|&(f, b)| compare(self.key_of(f), self.key_of(b)).is_le());
        Ok(Range::new(self, ends))
    }

    // =========================================================================
    // Descent
    // =========================================================================

    fn find_leaf(&self, key: &[u8]) -> Option<NodeId> {
        let mut id = self.root?;
        let mut depth = 0;
        loop {
            match &self.arena.get(id).kind {
                Kind::Leaf(leaf) => return (leaf.key.as_slice() == key).then_some(id),
                Kind::Inner(inner) => {
                    id = inner.child(edge_at(key, depth))?;
                    depth += 1;
                }
            }
        }
    }

    fn entry(&self, id: NodeId) -> (&[u8], &V) {
        let leaf = self.arena.leaf(id);
        (&leaf.key, &leaf.value)
    }

    fn key_of(&self, id: NodeId) -> &[u8] {
        &self.arena.leaf(id).key
    }

    fn first_leaf(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost(root))
    }

    fn last_leaf(&self) -> Option<NodeId> {
        self.root.map(|root| self.rightmost(root))
    }

    /// Smallest leaf in the subtree rooted at `id`.
    fn leftmost(&self, mut id: NodeId) -> NodeId {
        loop {
            let inner = match &self.arena.get(id).kind {
                Kind::Leaf(_) => return id,
                Kind::Inner(inner) => inner,
            };
            id = match (inner.terminal, inner.children.first()) {
                (Some(leaf), _) => leaf,
                (None, Some((_, child))) => child,
                (None, None) => panic!("inner node {id:?} is empty"),
            };
        }
    }

    /// Largest leaf in the subtree rooted at `id`.
    fn rightmost(&self, mut id: NodeId) -> NodeId {
        loop {
            let inner = match &self.arena.get(id).kind {
                Kind::Leaf(_) => return id,
                Kind::Inner(inner) => inner,
            };
            id = match (inner.children.last(), inner.terminal) {
                (Some((_, child)), _) => child,
                (None, Some(leaf)) => leaf,
                (None, None) => panic!("inner node {id:?} is empty"),
            };
        }
    }

    /// First leaf ordered after everything in the subtree rooted at `id`.
    ///
    /// Climbs uplinks until an ancestor has a later edge than the one just
    /// left, then descends to that edge's smallest leaf.
    pub(crate) fn next_after(&self, mut id: NodeId) -> Option<NodeId> {
        while let Some(Uplink { parent, edge }) = self.arena.uplink(id) {
            let children = &self.arena.inner(parent).children;
            let next = match edge {
                Edge::Terminal => children.first(),
                Edge::Byte(byte) => children.greater(byte),
            };
            if let Some((_, sibling)) = next {
                return Some(self.leftmost(sibling));
            }
            id = parent;
        }
        None
    }

    /// Last leaf ordered before everything in the subtree rooted at `id`.
    pub(crate) fn prev_before(&self, mut id: NodeId) -> Option<NodeId> {
        while let Some(Uplink { parent, edge }) = self.arena.uplink(id) {
            if let Edge::Byte(byte) = edge {
                let inner = self.arena.inner(parent);
                if let Some((_, sibling)) = inner.children.lesser(byte) {
                    return Some(self.rightmost(sibling));
                }
                if inner.terminal.is_some() {
                    return inner.terminal;
                }
            }
            id = parent;
        }
        None
    }

    fn seek_ceiling(&self, key: &[u8]) -> Option<NodeId> {
        let mut id = self.root?;
        let mut depth = 0;
        loop {
            let inner = match &self.arena.get(id).kind {
                Kind::Leaf(leaf) => {
                    return if compare(&leaf.key, key).is_ge() {
                        Some(id)
                    } else {
                        self.next_after(id)
                    };
                }
                Kind::Inner(inner) => inner,
            };
            // every key below here extends `key`
            let Some(&byte) = key.get(depth) else {
                return Some(self.leftmost(id));
            };
            match inner.children.ceil(byte) {
                Some((b, child)) if b == byte => {
                    id = child;
                    depth += 1;
                }
                Some((_, child)) => return Some(self.leftmost(child)),
                None => return self.next_after(id),
            }
        }
    }

    fn seek_floor(&self, key: &[u8]) -> Option<NodeId> {
        let mut id = self.root?;
        let mut depth = 0;
        loop {
            let inner = match &self.arena.get(id).kind {
                Kind::Leaf(leaf) => {
                    return if compare(&leaf.key, key).is_le() {
                        Some(id)
                    } else {
                        self.prev_before(id)
                    };
                }
                Kind::Inner(inner) => inner,
            };
            let Some(&byte) = key.get(depth) else {
                return inner.terminal.or_else(|| self.prev_before(id));
            };
            match inner.children.floor(byte) {
                Some((b, child)) if b == byte => {
                    id = child;
                    depth += 1;
                }
                Some((_, child)) => return Some(self.rightmost(child)),
                None => return inner.terminal.or_else(|| self.prev_before(id)),
            }
        }
    }

    fn seek_higher(&self, key: &[u8]) -> Option<NodeId> {
        let id = self.seek_ceiling(key)?;
        if self.key_of(id) == key {
            self.next_after(id)
        } else {
            Some(id)
        }
    }

    fn seek_lower(&self, key: &[u8]) -> Option<NodeId> {
        let id = self.seek_floor(key)?;
        if self.key_of(id) == key {
            self.prev_before(id)
        } else {
            Some(id)
        }
    }

    // =========================================================================
    // Structural changes
    // =========================================================================

    /// Puts `id` where `at` points, or makes it the root.
    fn install(&mut self, at: Option<Uplink>, id: NodeId) {
        match at {
            Some(Uplink { parent, edge }) => {
                self.arena.replace_child(parent, edge, id);
            }
            None => self.root = Some(id),
        }
    }

    /// Links a new child at a vacant edge, growing the parent first if full.
    fn link(&mut self, parent: NodeId, edge: Edge, child: NodeId) {
        let parent = match edge {
            Edge::Byte(_) if self.arena.inner(parent).children.is_full() => self.grow(parent),
            _ => parent,
        };
        self.arena.attach(parent, edge, child);
    }

    fn grow(&mut self, id: NodeId) -> NodeId {
        let from = self.arena.get(id).node_type();
        let grown = self.arena.grow(id);
        self.install(self.arena.uplink(grown), grown);
        trace!(?from, to = ?self.arena.get(grown).node_type(), "grew node");
        grown
    }

    fn shrink(&mut self, id: NodeId) -> NodeId {
        let from = self.arena.get(id).node_type();
        let shrunk = self.arena.shrink(id);
        self.install(self.arena.uplink(shrunk), shrunk);
        trace!(?from, to = ?self.arena.get(shrunk).node_type(), "shrank node");
        shrunk
    }

    /// Splits the leaf `leaf` found at `depth` so it can sit beside `key`.
    ///
    /// Bytes both keys share past `depth` become a chain of single-edge
    /// Node4s, ending in a Node4 that forks on the first differing byte. A
    /// key that ends at the fork goes in its terminal slot.
    fn branch(&mut self, leaf: NodeId, depth: usize, key: &[u8], value: V) {
        let existing = self.key_of(leaf);
        let split = common_prefix_len(existing, key);
        debug_assert!(split >= depth);
        let existing_edge = edge_at(existing, split);
        let uplink = self.arena.uplink(leaf);

        let fork = self.arena.alloc(Node::node4());
        let new_leaf = self.arena.alloc(Node::leaf(key, value));
        self.arena.attach(fork, existing_edge, leaf);
        self.arena.attach(fork, edge_at(key, split), new_leaf);

        let mut top = fork;
        for &byte in key[depth..split].iter().rev() {
            let link = self.arena.alloc(Node::node4());
            self.arena.add_child(link, byte, top);
            top = link;
        }
        self.install(uplink, top);
        trace!(depth, split, "branched leaf");
    }

    fn remove_leaf(&mut self, id: NodeId) -> (Vec<u8>, V) {
        let parent = self.arena.uplink(id).map(|Uplink { parent, edge }| {
            self.arena.detach(parent, edge);
            parent
        });
        let leaf = self.arena.free_leaf(id);
        self.len -= 1;
        match parent {
            Some(parent) => self.rebalance(parent),
            None => self.root = None,
        }
        (leaf.key.into_vec(), leaf.value)
    }

    /// Restores occupancy bands from `id` upwards after one of its edges went.
    fn rebalance(&mut self, mut id: NodeId) {
        loop {
            let uplink = self.arena.uplink(id);
            let inner = self.arena.inner(id);
            if inner.children.should_shrink() {
                self.shrink(id);
                return;
            }
            let count = inner.children.count();

            let sole_leaf = match (inner.terminal, inner.children.first()) {
                (None, None) => match uplink {
                    Some(Uplink { parent, edge }) => {
                        self.arena.detach(parent, edge);
                        self.arena.free(id);
                        trace!("unlinked empty node");
                        id = parent;
                        continue;
                    }
                    None => {
                        self.arena.free(id);
                        self.root = None;
                        return;
                    }
                },
                (Some(leaf), None) => Some((Edge::Terminal, leaf)),
                (None, Some((byte, child))) if count == 1 && self.arena.is_leaf(child) => {
                    Some((Edge::Byte(byte), child))
                }
                _ => None,
            };

            match sole_leaf {
                Some((edge, leaf)) if self.config.collapse_single_child => {
                    self.arena.detach(id, edge);
                    self.arena.free(id);
                    self.install(uplink, leaf);
                    trace!("collapsed single-leaf node");
                    match uplink {
                        Some(Uplink { parent, .. }) => id = parent,
                        None => return,
                    }
                }
                _ => return,
            }
        }
    }
}

fn as_bytes<K: AsRef<[u8]> + ?Sized>(bound: Bound<&K>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_ref()),
        Bound::Excluded(k) => Bound::Excluded(k.as_ref()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl<V> Default for AdaptiveRadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for AdaptiveRadixTree<V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            len: self.len,
            config: self.config.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for AdaptiveRadixTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: AsRef<[u8]>, V> FromIterator<(K, V)> for AdaptiveRadixTree<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: AsRef<[u8]>, V> Extend<(K, V)> for AdaptiveRadixTree<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.as_ref(), value);
        }
    }
}

impl<'a, V> IntoIterator for &'a AdaptiveRadixTree<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
