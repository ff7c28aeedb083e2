//! Structure inspection for tests and troubleshooting.

use super::arena::NodeId;
use super::node::{Edge, Kind, NodeType, Uplink, ABSENT};
use super::AdaptiveRadixTree;
use crate::error::{ArtError, Result};

/// Node counts by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub leaves: usize,
    pub node4: usize,
    pub node16: usize,
    pub node48: usize,
    pub node256: usize,
}

impl NodeStats {
    /// Number of inner nodes of any size.
    pub fn inner_nodes(&self) -> usize {
        self.node4 + self.node16 + self.node48 + self.node256
    }
}

fn violation(id: NodeId, reason: impl Into<String>) -> ArtError {
    ArtError::Integrity {
        node: id.index(),
        reason: reason.into(),
    }
}

impl<V> AdaptiveRadixTree<V> {
    /// Count allocated nodes by type.
    pub fn node_stats(&self) -> NodeStats {
        let mut stats = NodeStats::default();
        for (_, node) in self.arena.iter() {
            match node.node_type() {
                NodeType::Leaf => stats.leaves += 1,
                NodeType::Node4 => stats.node4 += 1,
                NodeType::Node16 => stats.node16 += 1,
                NodeType::Node48 => stats.node48 += 1,
                NodeType::Node256 => stats.node256 += 1,
            }
        }
        stats
    }

    /// Walk the whole tree and verify its structural invariants.
    ///
    /// Checks that every uplink names the edge that owns the node, that each
    /// inner node's occupancy lies inside its capacity band, that Node4/Node16
    /// keys are strictly ascending, that Node48 index and slots agree, that
    /// every leaf key matches the path to it, and that the key count and live
    /// node count match what is reachable.
    pub fn check_integrity(&self) -> Result<()> {
        let Some(root) = self.root else {
            if self.len != 0 || self.arena.live() != 0 {
                return Err(ArtError::Integrity {
                    node: usize::MAX,
                    reason: format!(
                        "empty tree reports {} keys and {} live nodes",
                        self.len,
                        self.arena.live()
                    ),
                });
            }
            return Ok(());
        };

        let mut leaves = 0;
        let mut reachable = 0;
        // (node, expected uplink, path bytes, reached through terminal slot)
        let mut stack: Vec<(NodeId, Option<Uplink>, Vec<u8>, bool)> =
            vec![(root, None, Vec::new(), false)];
        while let Some((id, expected, path, terminal)) = stack.pop() {
            if !self.arena.contains(id) {
                return Err(violation(id, "edge points at a freed slot"));
            }
            reachable += 1;
            let node = self.arena.get(id);
            if node.uplink != expected {
                return Err(violation(
                    id,
                    format!("uplink is {:?}, owning edge is {:?}", node.uplink, expected),
                ));
            }

            let inner = match &node.kind {
                Kind::Leaf(leaf) => {
                    leaves += 1;
                    if !leaf.key.starts_with(&path) {
                        return Err(violation(id, "leaf key does not extend its path"));
                    }
                    if terminal && leaf.key.len() != path.len() {
                        return Err(violation(id, "terminal leaf key is longer than its depth"));
                    }
                    continue;
                }
                Kind::Inner(inner) => inner,
            };
            if terminal {
                return Err(violation(id, "terminal slot holds an inner node"));
            }

            let children = &inner.children;
            let count = children.count();
            let node_type = children.node_type();
            if children.edges().count() != count {
                return Err(violation(id, "count disagrees with occupied edges"));
            }
            if count > node_type.capacity() {
                return Err(violation(id, format!("{node_type:?} holds {count} children")));
            }
            if children.should_shrink() {
                return Err(violation(id, format!("{node_type:?} underfull at {count}")));
            }
            if inner.fanout() == 0 {
                return Err(violation(id, "inner node is empty"));
            }
            if let Some(keys) = children.sorted_keys() {
                if !keys.windows(2).all(|w| w[0] < w[1]) {
                    return Err(violation(id, format!("keys out of order: {keys:?}")));
                }
            }
            if let Some((index, slots)) = children.node48_parts() {
                let mut referenced = [false; 48];
                for &slot in index.iter().filter(|&&s| s != ABSENT) {
                    let slot = slot as usize;
                    if slot >= count || referenced[slot] {
                        return Err(violation(id, format!("bad Node48 index entry {slot}")));
                    }
                    referenced[slot] = true;
                }
                if slots[count..].iter().any(|s| !s.is_null()) {
                    return Err(violation(id, "Node48 slot past count is occupied"));
                }
            }

            if self.config.collapse_single_child && inner.fanout() == 1 {
                let sole = inner.terminal.or_else(|| children.first().map(|(_, c)| c));
                if sole.is_some_and(|c| self.arena.contains(c) && self.arena.is_leaf(c)) {
                    return Err(violation(id, "inner node holds a single leaf"));
                }
            }

            if let Some(leaf) = inner.terminal {
                let uplink = Uplink {
                    parent: id,
                    edge: Edge::Terminal,
                };
                stack.push((leaf, Some(uplink), path.clone(), true));
            }
            for (byte, child) in children.edges() {
                let uplink = Uplink {
                    parent: id,
                    edge: Edge::Byte(byte),
                };
                let mut child_path = path.clone();
                child_path.push(byte);
                stack.push((child, Some(uplink), child_path, false));
            }
        }

        if leaves != self.len {
            return Err(violation(root, format!("{leaves} leaves reachable, len is {}", self.len)));
        }
        if reachable != self.arena.live() {
            return Err(violation(
                root,
                format!("{reachable} nodes reachable, {} allocated", self.arena.live()),
            ));
        }
        Ok(())
    }
}
