//! ART node types with adaptive sizing.
//!
//! An inner node maps partial-key bytes to children with one of four
//! layouts, picked by how many children it currently holds:
//!
//! - Node4: up to 4 children, keys kept sorted, linear scan
//! - Node16: 5-16 children, keys kept sorted, linear scan
//! - Node48: 17-48 children (256-byte index + 48 compact slots)
//! - Node256: 49-256 children (direct array indexing)
//!
//! The layouts here only know about edges. The arena owns the children the
//! edges point at, so it is the arena that keeps uplinks in step.

use std::mem;

use smallvec::SmallVec;

use super::arena::NodeId;

/// Keys up to this length are stored inline in their leaf.
pub(crate) const INLINE_KEY_LEN: usize = 16;

pub(crate) type KeyBuf = SmallVec<[u8; INLINE_KEY_LEN]>;

/// Node48 index entry for a byte with no child.
pub(crate) const ABSENT: u8 = u8::MAX;

/// The type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A leaf node containing a key and value.
    Leaf,
    /// A node with up to 4 children.
    Node4,
    /// A node with 5-16 children.
    Node16,
    /// A node with 17-48 children.
    Node48,
    /// A node with 49-256 children.
    Node256,
}

impl NodeType {
    /// Maximum number of children, `0` for leaves.
    pub const fn capacity(self) -> usize {
        match self {
            NodeType::Leaf => 0,
            NodeType::Node4 => 4,
            NodeType::Node16 => 16,
            NodeType::Node48 => 48,
            NodeType::Node256 => 256,
        }
    }
}

/// Position of a child below its parent.
///
/// The terminal slot holds the key that ends exactly at the parent's depth,
/// which sorts before every extension of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Edge {
    Terminal,
    Byte(u8),
}

/// Back-reference from a child to the edge that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Uplink {
    pub(crate) parent: NodeId,
    pub(crate) edge: Edge,
}

#[derive(Clone)]
pub(crate) struct Leaf<V> {
    pub(crate) key: KeyBuf,
    pub(crate) value: V,
}

#[derive(Clone)]
pub(crate) struct Inner {
    /// Leaf whose key ends at this node's depth.
    pub(crate) terminal: Option<NodeId>,
    pub(crate) children: Children,
}

impl Inner {
    /// Child owned by `edge`, if any.
    #[inline]
    pub(crate) fn child(&self, edge: Edge) -> Option<NodeId> {
        match edge {
            Edge::Terminal => self.terminal,
            Edge::Byte(byte) => self.children.find_child(byte),
        }
    }

    /// Edges plus the terminal slot, if occupied.
    pub(crate) fn fanout(&self) -> usize {
        self.children.count() + usize::from(self.terminal.is_some())
    }
}

/// Edge taken out of a node at `depth` while descending towards `key`.
#[inline]
pub(crate) fn edge_at(key: &[u8], depth: usize) -> Edge {
    key.get(depth).map_or(Edge::Terminal, |&byte| Edge::Byte(byte))
}

#[derive(Clone)]
pub(crate) enum Kind<V> {
    Leaf(Leaf<V>),
    Inner(Inner),
}

/// A node in the Adaptive Radix Tree.
#[derive(Clone)]
pub(crate) struct Node<V> {
    /// `None` only for the root.
    pub(crate) uplink: Option<Uplink>,
    pub(crate) kind: Kind<V>,
}

impl<V> Node<V> {
    pub(crate) fn leaf(key: &[u8], value: V) -> Self {
        Node {
            uplink: None,
            kind: Kind::Leaf(Leaf {
                key: KeyBuf::from_slice(key),
                value,
            }),
        }
    }

    pub(crate) fn node4() -> Self {
        Node {
            uplink: None,
            kind: Kind::Inner(Inner {
                terminal: None,
                children: Children::Node4(Node4::new()),
            }),
        }
    }

    pub(crate) fn node_type(&self) -> NodeType {
        match &self.kind {
            Kind::Leaf(_) => NodeType::Leaf,
            Kind::Inner(inner) => inner.children.node_type(),
        }
    }
}

// =============================================================================
// Node4 / Node16
// =============================================================================

/// Sorted key array with parallel child array; backs Node4 and Node16.
#[derive(Clone)]
pub(crate) struct SortedNode<const N: usize> {
    count: u8,
    keys: [u8; N],
    children: [NodeId; N],
}

pub(crate) type Node4 = SortedNode<4>;
pub(crate) type Node16 = SortedNode<16>;

impl<const N: usize> SortedNode<N> {
    pub(crate) fn new() -> Self {
        Self {
            count: 0,
            keys: [0; N],
            children: [NodeId::NULL; N],
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    fn entry(&self, i: usize) -> (u8, NodeId) {
        (self.keys[i], self.children[i])
    }

    /// Slot holding `byte`, or the slot it would be inserted at.
    ///
    /// Linear: at these capacities a scan beats a binary search.
    fn search(&self, byte: u8) -> Result<usize, usize> {
        for (i, &k) in self.keys[..self.len()].iter().enumerate() {
            if k == byte {
                return Ok(i);
            }
            if k > byte {
                return Err(i);
            }
        }
        Err(self.len())
    }

    fn slot_of(&self, byte: u8) -> usize {
        match self.search(byte) {
            Ok(i) => i,
            Err(_) => panic!("Node{N} has no child at {byte:#04x}"),
        }
    }

    fn find(&self, byte: u8) -> Option<NodeId> {
        self.search(byte).ok().map(|i| self.children[i])
    }

    fn add(&mut self, byte: u8, child: NodeId) {
        let n = self.len();
        assert!(n < N, "Node{N} is full, should grow first");
        let pos = match self.search(byte) {
            Ok(_) => panic!("Node{N} already has a child at {byte:#04x}"),
            Err(pos) => pos,
        };
        self.keys.copy_within(pos..n, pos + 1);
        self.children.copy_within(pos..n, pos + 1);
        self.keys[pos] = byte;
        self.children[pos] = child;
        self.count += 1;
    }

    fn replace(&mut self, byte: u8, child: NodeId) -> NodeId {
        let i = self.slot_of(byte);
        mem::replace(&mut self.children[i], child)
    }

    fn remove(&mut self, byte: u8) -> NodeId {
        let i = self.slot_of(byte);
        let n = self.len();
        let old = self.children[i];
        self.keys.copy_within(i + 1..n, i);
        self.children.copy_within(i + 1..n, i);
        self.children[n - 1] = NodeId::NULL;
        self.count -= 1;
        old
    }

    fn first(&self) -> Option<(u8, NodeId)> {
        (self.count > 0).then(|| self.entry(0))
    }

    fn last(&self) -> Option<(u8, NodeId)> {
        self.len().checked_sub(1).map(|i| self.entry(i))
    }

    fn ceil(&self, byte: u8) -> Option<(u8, NodeId)> {
        let i = match self.search(byte) {
            Ok(i) | Err(i) => i,
        };
        (i < self.len()).then(|| self.entry(i))
    }

    fn greater(&self, byte: u8) -> Option<(u8, NodeId)> {
        let i = match self.search(byte) {
            Ok(i) => i + 1,
            Err(i) => i,
        };
        (i < self.len()).then(|| self.entry(i))
    }

    fn floor(&self, byte: u8) -> Option<(u8, NodeId)> {
        match self.search(byte) {
            Ok(i) => Some(self.entry(i)),
            Err(i) => i.checked_sub(1).map(|i| self.entry(i)),
        }
    }

    fn lesser(&self, byte: u8) -> Option<(u8, NodeId)> {
        let i = match self.search(byte) {
            Ok(i) | Err(i) => i,
        };
        i.checked_sub(1).map(|i| self.entry(i))
    }

    fn iter(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        (0..self.len()).map(move |i| self.entry(i))
    }

    /// Appends in ascending order during a transition.
    fn push_sorted(&mut self, byte: u8, child: NodeId) {
        let n = self.len();
        debug_assert!(n == 0 || self.keys[n - 1] < byte);
        self.keys[n] = byte;
        self.children[n] = child;
        self.count += 1;
    }

    fn keys(&self) -> &[u8] {
        &self.keys[..self.len()]
    }
}

// =============================================================================
// Node48
// =============================================================================

#[derive(Clone)]
pub(crate) struct Node48 {
    count: u8,
    /// Maps byte value to slot (`ABSENT` = empty). Boxed to reduce enum size.
    index: Box<[u8; 256]>,
    /// Occupied slots are always `[0, count)`.
    slots: Box<[NodeId; 48]>,
}

impl Node48 {
    pub(crate) fn new() -> Self {
        Self {
            count: 0,
            index: Box::new([ABSENT; 256]),
            slots: Box::new([NodeId::NULL; 48]),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    fn entry(&self, byte: usize) -> Option<(u8, NodeId)> {
        match self.index[byte] {
            ABSENT => None,
            slot => Some((byte as u8, self.slots[slot as usize])),
        }
    }

    fn slot_of(&self, byte: u8) -> usize {
        match self.index[byte as usize] {
            ABSENT => panic!("Node48 has no child at {byte:#04x}"),
            slot => slot as usize,
        }
    }

    fn find(&self, byte: u8) -> Option<NodeId> {
        self.entry(byte as usize).map(|(_, child)| child)
    }

    fn add(&mut self, byte: u8, child: NodeId) {
        assert!(self.len() < 48, "Node48 is full, should grow first");
        assert!(
            self.index[byte as usize] == ABSENT,
            "Node48 already has a child at {byte:#04x}"
        );
        self.slots[self.len()] = child;
        self.index[byte as usize] = self.count;
        self.count += 1;
    }

    fn replace(&mut self, byte: u8, child: NodeId) -> NodeId {
        let slot = self.slot_of(byte);
        mem::replace(&mut self.slots[slot], child)
    }

    fn remove(&mut self, byte: u8) -> NodeId {
        let slot = self.slot_of(byte);
        let last = self.len() - 1;
        let old = self.slots[slot];
        self.index[byte as usize] = ABSENT;
        if slot != last {
            // Move the last slot into the hole and re-point its byte.
            self.slots[slot] = self.slots[last];
            if let Some(moved) = self.index.iter().position(|&s| s as usize == last) {
                self.index[moved] = slot as u8;
            }
        }
        self.slots[last] = NodeId::NULL;
        self.count -= 1;
        old
    }

    fn ceil(&self, byte: u8) -> Option<(u8, NodeId)> {
        (byte as usize..256).find_map(|b| self.entry(b))
    }

    fn greater(&self, byte: u8) -> Option<(u8, NodeId)> {
        (byte as usize + 1..256).find_map(|b| self.entry(b))
    }

    fn floor(&self, byte: u8) -> Option<(u8, NodeId)> {
        (0..=byte as usize).rev().find_map(|b| self.entry(b))
    }

    fn lesser(&self, byte: u8) -> Option<(u8, NodeId)> {
        (0..byte as usize).rev().find_map(|b| self.entry(b))
    }

    fn iter(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        (0..256).filter_map(move |b| self.entry(b))
    }
}

// =============================================================================
// Node256
// =============================================================================

#[derive(Clone)]
pub(crate) struct Node256 {
    count: u16,
    /// Indexed directly by byte. Boxed to reduce enum size.
    slots: Box<[NodeId; 256]>,
}

impl Node256 {
    pub(crate) fn new() -> Self {
        Self {
            count: 0,
            slots: Box::new([NodeId::NULL; 256]),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    fn entry(&self, byte: usize) -> Option<(u8, NodeId)> {
        let child = self.slots[byte];
        (!child.is_null()).then_some((byte as u8, child))
    }

    fn find(&self, byte: u8) -> Option<NodeId> {
        self.entry(byte as usize).map(|(_, child)| child)
    }

    fn add(&mut self, byte: u8, child: NodeId) {
        let slot = &mut self.slots[byte as usize];
        assert!(slot.is_null(), "Node256 already has a child at {byte:#04x}");
        *slot = child;
        self.count += 1;
    }

    fn replace(&mut self, byte: u8, child: NodeId) -> NodeId {
        let slot = &mut self.slots[byte as usize];
        assert!(!slot.is_null(), "Node256 has no child at {byte:#04x}");
        mem::replace(slot, child)
    }

    fn remove(&mut self, byte: u8) -> NodeId {
        let old = mem::replace(&mut self.slots[byte as usize], NodeId::NULL);
        assert!(!old.is_null(), "Node256 has no child at {byte:#04x}");
        self.count -= 1;
        old
    }

    fn ceil(&self, byte: u8) -> Option<(u8, NodeId)> {
        (byte as usize..256).find_map(|b| self.entry(b))
    }

    fn greater(&self, byte: u8) -> Option<(u8, NodeId)> {
        (byte as usize + 1..256).find_map(|b| self.entry(b))
    }

    fn floor(&self, byte: u8) -> Option<(u8, NodeId)> {
        (0..=byte as usize).rev().find_map(|b| self.entry(b))
    }

    fn lesser(&self, byte: u8) -> Option<(u8, NodeId)> {
        (0..byte as usize).rev().find_map(|b| self.entry(b))
    }

    fn iter(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        (0..256).filter_map(move |b| self.entry(b))
    }
}

// =============================================================================
// Dispatch over the four layouts
// =============================================================================

#[derive(Clone)]
pub(crate) enum Children {
    Node4(Node4),
    Node16(Node16),
    Node48(Node48),
    Node256(Node256),
}

macro_rules! dispatch {
    ($children:expr, $node:ident => $body:expr) => {
        match $children {
            Children::Node4($node) => $body,
            Children::Node16($node) => $body,
            Children::Node48($node) => $body,
            Children::Node256($node) => $body,
        }
    };
}

impl Children {
    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            Children::Node4(_) => NodeType::Node4,
            Children::Node16(_) => NodeType::Node16,
            Children::Node48(_) => NodeType::Node48,
            Children::Node256(_) => NodeType::Node256,
        }
    }

    /// Number of occupied edges.
    pub(crate) fn count(&self) -> usize {
        dispatch!(self, n => n.len())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.node_type().capacity()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.count() == self.capacity()
    }

    /// True once occupancy has fallen to the next smaller layout's capacity.
    pub(crate) fn should_shrink(&self) -> bool {
        match self {
            Children::Node4(_) => false,
            Children::Node16(n) => n.len() <= NodeType::Node4.capacity(),
            Children::Node48(n) => n.len() <= NodeType::Node16.capacity(),
            Children::Node256(n) => n.len() <= NodeType::Node48.capacity(),
        }
    }

    pub(crate) fn find_child(&self, byte: u8) -> Option<NodeId> {
        dispatch!(self, n => n.find(byte))
    }

    /// Panics if the node is full or `byte` is already present.
    pub(crate) fn add_child(&mut self, byte: u8, child: NodeId) {
        dispatch!(self, n => n.add(byte, child))
    }

    /// Swaps the child at `byte`, returning the previous one.
    pub(crate) fn replace_child(&mut self, byte: u8, child: NodeId) -> NodeId {
        dispatch!(self, n => n.replace(byte, child))
    }

    pub(crate) fn remove_child(&mut self, byte: u8) -> NodeId {
        dispatch!(self, n => n.remove(byte))
    }

    pub(crate) fn first(&self) -> Option<(u8, NodeId)> {
        match self {
            Children::Node4(n) => n.first(),
            Children::Node16(n) => n.first(),
            Children::Node48(n) => n.ceil(0),
            Children::Node256(n) => n.ceil(0),
        }
    }

    pub(crate) fn last(&self) -> Option<(u8, NodeId)> {
        match self {
            Children::Node4(n) => n.last(),
            Children::Node16(n) => n.last(),
            Children::Node48(n) => n.floor(u8::MAX),
            Children::Node256(n) => n.floor(u8::MAX),
        }
    }

    /// Child at the smallest occupied byte `>= byte`.
    pub(crate) fn ceil(&self, byte: u8) -> Option<(u8, NodeId)> {
        dispatch!(self, n => n.ceil(byte))
    }

    /// Child at the largest occupied byte `<= byte`.
    pub(crate) fn floor(&self, byte: u8) -> Option<(u8, NodeId)> {
        dispatch!(self, n => n.floor(byte))
    }

    /// Child at the smallest occupied byte `> byte`.
    pub(crate) fn greater(&self, byte: u8) -> Option<(u8, NodeId)> {
        dispatch!(self, n => n.greater(byte))
    }

    /// Child at the largest occupied byte `< byte`.
    pub(crate) fn lesser(&self, byte: u8) -> Option<(u8, NodeId)> {
        dispatch!(self, n => n.lesser(byte))
    }

    /// Occupied edges in ascending byte order.
    pub(crate) fn edges(&self) -> Box<dyn Iterator<Item = (u8, NodeId)> + '_> {
        dispatch!(self, n => Box::new(n.iter()))
    }

    /// Sorted key bytes of a Node4/Node16, `None` for the indexed layouts.
    pub(crate) fn sorted_keys(&self) -> Option<&[u8]> {
        match self {
            Children::Node4(n) => Some(n.keys()),
            Children::Node16(n) => Some(n.keys()),
            Children::Node48(_) | Children::Node256(_) => None,
        }
    }

    /// Node48 `(index table, slots)` for integrity checks.
    pub(crate) fn node48_parts(&self) -> Option<(&[u8; 256], &[NodeId; 48])> {
        match self {
            Children::Node48(n) => Some((&n.index, &n.slots)),
            _ => None,
        }
    }

    /// Moves every edge into the next larger layout.
    pub(crate) fn grow(self) -> Children {
        assert!(self.is_full(), "only a full node may grow");
        match self {
            Children::Node4(n) => {
                let mut grown = Node16::new();
                grown.keys[..4].copy_from_slice(&n.keys);
                grown.children[..4].copy_from_slice(&n.children);
                grown.count = n.count;
                Children::Node16(grown)
            }
            Children::Node16(n) => {
                let mut grown = Node48::new();
                for (byte, child) in n.iter() {
                    grown.add(byte, child);
                }
                Children::Node48(grown)
            }
            Children::Node48(n) => {
                let mut grown = Node256::new();
                for (byte, child) in n.iter() {
                    grown.add(byte, child);
                }
                Children::Node256(grown)
            }
            Children::Node256(_) => panic!("Node256 cannot grow"),
        }
    }

    /// Moves every edge into the next smaller layout.
    pub(crate) fn shrink(self) -> Children {
        assert!(self.should_shrink(), "node is above its shrink threshold");
        match self {
            Children::Node4(_) => panic!("Node4 cannot shrink"),
            Children::Node16(n) => {
                let mut shrunk = Node4::new();
                for (byte, child) in n.iter() {
                    shrunk.push_sorted(byte, child);
                }
                Children::Node4(shrunk)
            }
            Children::Node48(n) => {
                let mut shrunk = Node16::new();
                for (byte, child) in n.iter() {
                    shrunk.push_sorted(byte, child);
                }
                Children::Node16(shrunk)
            }
            Children::Node256(n) => {
                let mut shrunk = Node48::new();
                for (byte, child) in n.iter() {
                    shrunk.add(byte, child);
                }
                Children::Node48(shrunk)
            }
        }
    }
}
