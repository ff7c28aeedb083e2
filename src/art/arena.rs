//! Slot arena owning every node of a tree.
//!
//! Nodes refer to each other through [`NodeId`], a 32-bit index into the
//! arena, instead of pointers. Child edges and uplinks are both plain ids, so
//! the parent/child cycle never holds a reference that could dangle: a freed
//! id is only ever reachable through a bug, and then it panics on access.

use std::fmt;

use super::node::{Children, Edge, Inner, Kind, Leaf, Node, Uplink};

/// A 32-bit reference to a node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) const NULL: NodeId = NodeId(u32::MAX);

    #[inline]
    pub(crate) fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        NodeId(idx as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("#null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[derive(Clone)]
pub(crate) struct Arena<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
    live: usize,
}

impl<V> Arena<V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn alloc(&mut self, node: Node<V>) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId::new(self.slots.len());
                self.slots.push(Some(node));
                id
            }
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Node<V> {
        let node = self.take(id);
        self.free.push(id);
        node
    }

    /// Empties a slot without making it reusable yet.
    fn take(&mut self, id: NodeId) -> Node<V> {
        match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.live -= 1;
                node
            }
            None => panic!("dangling node id {id:?}"),
        }
    }

    /// Frees a leaf, handing back its key and value.
    pub(crate) fn free_leaf(&mut self, id: NodeId) -> Leaf<V> {
        match self.free(id).kind {
            Kind::Leaf(leaf) => leaf,
            Kind::Inner(_) => panic!("node {id:?} is not a leaf"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    /// Number of allocated nodes.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<V>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId::new(i), node)))
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<V> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling node id {id:?}"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling node id {id:?}"),
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, Kind::Leaf(_))
    }

    #[inline]
    pub(crate) fn uplink(&self, id: NodeId) -> Option<Uplink> {
        self.get(id).uplink
    }

    pub(crate) fn leaf(&self, id: NodeId) -> &Leaf<V> {
        match &self.get(id).kind {
            Kind::Leaf(leaf) => leaf,
            Kind::Inner(_) => panic!("node {id:?} is not a leaf"),
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut Leaf<V> {
        match &mut self.get_mut(id).kind {
            Kind::Leaf(leaf) => leaf,
            Kind::Inner(_) => panic!("node {id:?} is not a leaf"),
        }
    }

    pub(crate) fn inner(&self, id: NodeId) -> &Inner {
        match &self.get(id).kind {
            Kind::Inner(inner) => inner,
            Kind::Leaf(_) => panic!("node {id:?} is not an inner node"),
        }
    }

    fn inner_mut(&mut self, id: NodeId) -> &mut Inner {
        match &mut self.get_mut(id).kind {
            Kind::Inner(inner) => inner,
            Kind::Leaf(_) => panic!("node {id:?} is not an inner node"),
        }
    }

    #[inline]
    fn set_uplink(&mut self, child: NodeId, uplink: Option<Uplink>) {
        self.get_mut(child).uplink = uplink;
    }

    // =========================================================================
    // Structural primitives. Each one updates the uplink of every child whose
    // owning edge it creates, moves or removes.
    // =========================================================================

    /// Links `child` under `parent` at `byte`.
    pub(crate) fn add_child(&mut self, parent: NodeId, byte: u8, child: NodeId) {
        self.inner_mut(parent).children.add_child(byte, child);
        self.set_uplink(
            child,
            Some(Uplink {
                parent,
                edge: Edge::Byte(byte),
            }),
        );
    }

    /// Links `leaf` as the key ending at `parent`.
    pub(crate) fn set_terminal(&mut self, parent: NodeId, leaf: NodeId) {
        let inner = self.inner_mut(parent);
        assert!(inner.terminal.is_none(), "node {parent:?} already has a terminal leaf");
        inner.terminal = Some(leaf);
        self.set_uplink(
            leaf,
            Some(Uplink {
                parent,
                edge: Edge::Terminal,
            }),
        );
    }

    /// Links `child` at a vacant `edge` of `parent`.
    pub(crate) fn attach(&mut self, parent: NodeId, edge: Edge, child: NodeId) {
        match edge {
            Edge::Terminal => self.set_terminal(parent, child),
            Edge::Byte(byte) => self.add_child(parent, byte, child),
        }
    }

    /// Puts `child` where `edge` points, returning the previous occupant.
    ///
    /// The previous occupant's uplink is left alone: it has usually just been
    /// linked somewhere else, or is about to be freed.
    pub(crate) fn replace_child(&mut self, parent: NodeId, edge: Edge, child: NodeId) -> NodeId {
        let inner = self.inner_mut(parent);
        let old = match edge {
            Edge::Terminal => inner.terminal.replace(child),
            Edge::Byte(byte) => Some(inner.children.replace_child(byte, child)),
        };
        self.set_uplink(child, Some(Uplink { parent, edge }));
        match old {
            Some(old) => old,
            None => panic!("node {parent:?} has no terminal leaf to replace"),
        }
    }

    /// Unlinks whatever `edge` points at and clears its uplink.
    pub(crate) fn detach(&mut self, parent: NodeId, edge: Edge) -> NodeId {
        let inner = self.inner_mut(parent);
        let child = match edge {
            Edge::Terminal => match inner.terminal.take() {
                Some(leaf) => leaf,
                None => panic!("node {parent:?} has no terminal leaf"),
            },
            Edge::Byte(byte) => inner.children.remove_child(byte),
        };
        self.set_uplink(child, None);
        child
    }

    /// Replaces a full inner node by the next larger layout.
    ///
    /// The returned node carries the old uplink, and every child points back
    /// at it; the caller still has to install it at the parent's edge.
    pub(crate) fn grow(&mut self, id: NodeId) -> NodeId {
        self.transition(id, Children::grow)
    }

    /// Replaces an underfull inner node by the next smaller layout.
    pub(crate) fn shrink(&mut self, id: NodeId) -> NodeId {
        self.transition(id, Children::shrink)
    }

    fn transition(&mut self, id: NodeId, f: impl FnOnce(Children) -> Children) -> NodeId {
        let Node { uplink, kind } = self.take(id);
        let Kind::Inner(Inner { terminal, children }) = kind else {
            panic!("node {id:?} is not an inner node");
        };
        let replacement = self.alloc(Node {
            uplink,
            kind: Kind::Inner(Inner {
                terminal,
                children: f(children),
            }),
        });
        // Only now is the old slot reusable, so the new node never aliases it.
        self.free.push(id);

        let edges: Vec<(u8, NodeId)> = self.inner(replacement).children.edges().collect();
        for (byte, child) in edges {
            self.set_uplink(
                child,
                Some(Uplink {
                    parent: replacement,
                    edge: Edge::Byte(byte),
                }),
            );
        }
        if let Some(leaf) = terminal {
            self.set_uplink(
                leaf,
                Some(Uplink {
                    parent: replacement,
                    edge: Edge::Terminal,
                }),
            );
        }
        replacement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::art::node::NodeType;

    fn leaf(arena: &mut Arena<u32>, byte: u8) -> NodeId {
        arena.alloc(Node::leaf(&[byte], byte as u32))
    }

    #[test]
    fn test_free_slots_are_reused() {
        let mut arena = Arena::with_capacity(4);
        let a = leaf(&mut arena, 1);
        let b = leaf(&mut arena, 2);
        assert_eq!(arena.live(), 2);
        arena.free(a);
        assert!(!arena.contains(a));
        let c = leaf(&mut arena, 3);
        assert_eq!(c, a);
        assert!(arena.contains(b));
        assert_eq!(arena.live(), 2);
    }

    #[test]
    #[should_panic(expected = "dangling node id")]
    fn test_freed_id_panics() {
        let mut arena = Arena::with_capacity(1);
        let a = leaf(&mut arena, 1);
        arena.free(a);
        arena.get(a);
    }

    #[test]
    fn test_add_and_detach_maintain_uplinks() {
        let mut arena = Arena::with_capacity(4);
        let parent = arena.alloc(Node::node4());
        let child = leaf(&mut arena, 7);
        arena.add_child(parent, 7, child);
        assert_eq!(
            arena.uplink(child),
            Some(Uplink {
                parent,
                edge: Edge::Byte(7)
            })
        );

        let terminal = leaf(&mut arena, 0);
        arena.set_terminal(parent, terminal);
        assert_eq!(arena.uplink(terminal).map(|u| u.edge), Some(Edge::Terminal));

        assert_eq!(arena.detach(parent, Edge::Byte(7)), child);
        assert_eq!(arena.uplink(child), None);
        assert_eq!(arena.detach(parent, Edge::Terminal), terminal);
        assert_eq!(arena.uplink(terminal), None);
        assert_eq!(arena.inner(parent).children.count(), 0);
    }

    #[test]
    fn test_replace_child_links_new_child() {
        let mut arena = Arena::with_capacity(4);
        let parent = arena.alloc(Node::node4());
        let old = leaf(&mut arena, 9);
        arena.add_child(parent, 9, old);
        let new = leaf(&mut arena, 9);
        assert_eq!(arena.replace_child(parent, Edge::Byte(9), new), old);
        assert_eq!(arena.inner(parent).children.find_child(9), Some(new));
        assert_eq!(arena.uplink(new).map(|u| u.parent), Some(parent));
        // the old child keeps its stale uplink until it is relinked or freed
        assert_eq!(arena.uplink(old).map(|u| u.parent), Some(parent));
    }

    #[test]
    fn test_grow_repoints_every_child() {
        let mut arena = Arena::with_capacity(8);
        let grandparent = arena.alloc(Node::node4());
        let node = arena.alloc(Node::node4());
        arena.add_child(grandparent, 0xaa, node);
        let terminal = leaf(&mut arena, 0);
        arena.set_terminal(node, terminal);
        let kids: Vec<NodeId> = [0x01, 0x80, 0xff, 0x10]
            .into_iter()
            .map(|b| {
                let child = leaf(&mut arena, b);
                arena.add_child(node, b, child);
                child
            })
            .collect();

        let grown = arena.grow(node);
        assert_ne!(grown, node);
        assert!(!arena.contains(node));
        assert_eq!(arena.get(grown).node_type(), NodeType::Node16);
        assert_eq!(
            arena.uplink(grown),
            Some(Uplink {
                parent: grandparent,
                edge: Edge::Byte(0xaa),
            })
        );
        for child in kids {
            assert_eq!(arena.uplink(child).map(|u| u.parent), Some(grown));
        }
        assert_eq!(arena.uplink(terminal).map(|u| u.parent), Some(grown));
        assert_eq!(arena.inner(grown).terminal, Some(terminal));

        arena.replace_child(grandparent, Edge::Byte(0xaa), grown);
        assert_eq!(arena.inner(grandparent).children.find_child(0xaa), Some(grown));
    }
}
