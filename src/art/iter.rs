//! Iterators over tree entries.
//!
//! Iterator state is just the next leaf at each end. Advancing climbs uplinks
//! from the current leaf and descends into the neighbouring edge, so no stack
//! is kept and an iterator can be cloned to restart from where it is.

use std::iter::FusedIterator;

use super::arena::NodeId;
use super::AdaptiveRadixTree;

/// Entries between two leaves, in ascending key order.
pub struct Range<'a, V> {
    tree: &'a AdaptiveRadixTree<V>,
    /// Next leaves to yield from the front and the back; `None` once the two
    /// ends have crossed.
    ends: Option<(NodeId, NodeId)>,
}

impl<'a, V> Range<'a, V> {
    /// `ends` must be ordered, front key `<=` back key.
    pub(crate) fn new(tree: &'a AdaptiveRadixTree<V>, ends: Option<(NodeId, NodeId)>) -> Self {
        Self { tree, ends }
    }
}

impl<'a, V> Iterator for Range<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (front, back) = self.ends?;
        self.ends = if front == back {
            None
        } else {
            self.tree.next_after(front).map(|next| (next, back))
        };
        Some(self.tree.entry(front))
    }
}

impl<V> DoubleEndedIterator for Range<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (front, back) = self.ends?;
        self.ends = if front == back {
            None
        } else {
            self.tree.prev_before(back).map(|prev| (front, prev))
        };
        Some(self.tree.entry(back))
    }
}

impl<V> FusedIterator for Range<'_, V> {}

impl<V> Clone for Range<'_, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            ends: self.ends,
        }
    }
}

/// Iterator over all entries, created by [`AdaptiveRadixTree::iter`].
pub struct Iter<'a, V> {
    range: Range<'a, V>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(range: Range<'a, V>, remaining: usize) -> Self {
        Self { range, remaining }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.range.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.range.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            range: self.range.clone(),
            remaining: self.remaining,
        }
    }
}

/// Keys in ascending order, created by [`AdaptiveRadixTree::keys`].
pub struct Keys<'a, V>(Iter<'a, V>);

impl<'a, V> Keys<'a, V> {
    pub(crate) fn new(iter: Iter<'a, V>) -> Self {
        Self(iter)
    }
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<V> DoubleEndedIterator for Keys<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(k, _)| k)
    }
}

impl<V> ExactSizeIterator for Keys<'_, V> {}
impl<V> FusedIterator for Keys<'_, V> {}

impl<V> Clone for Keys<'_, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Values in ascending key order, created by [`AdaptiveRadixTree::values`].
pub struct Values<'a, V>(Iter<'a, V>);

impl<'a, V> Values<'a, V> {
    pub(crate) fn new(iter: Iter<'a, V>) -> Self {
        Self(iter)
    }
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<V> DoubleEndedIterator for Values<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(_, v)| v)
    }
}

impl<V> ExactSizeIterator for Values<'_, V> {}
impl<V> FusedIterator for Values<'_, V> {}

impl<V> Clone for Values<'_, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
