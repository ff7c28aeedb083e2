//! A tree behind a read/write lock.
//!
//! The tree itself is single-writer. [`SharedArt`] lets any number of readers
//! run at once and serialises writers, handing values out by clone so no
//! borrow outlives the lock.

use std::ops::RangeBounds;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::error::Result;
use crate::{AdaptiveRadixTree, Config};

pub struct SharedArt<V> {
    inner: RwLock<AdaptiveRadixTree<V>>,
    /// Mirrors the tree's length so `len` never takes the lock.
    len: AtomicUsize,
}

impl<V> SharedArt<V>
where
    V: Clone,
{
    /// Create a new empty shared tree with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(AdaptiveRadixTree::with_config(config)),
            len: AtomicUsize::new(0),
        }
    }

    /// Insert a key-value pair, returning the previous value.
    pub fn insert(&self, key: impl AsRef<[u8]>, value: V) -> Option<V> {
        let mut inner = self.inner.write();
        let old = inner.insert(key.as_ref(), value);
        if old.is_none() {
            self.len.fetch_add(1, Ordering::Relaxed);
        }
        old
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<V> {
        self.inner.read().get(key.as_ref()).cloned()
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.inner.read().contains_key(key.as_ref())
    }

    pub fn remove(&self, key: impl AsRef<[u8]>) -> Option<V> {
        let mut inner = self.inner.write();
        let old = inner.remove(key.as_ref());
        if old.is_some() {
            self.len.fetch_sub(1, Ordering::Relaxed);
        }
        old
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.clear();
        self.len.store(0, Ordering::Relaxed);
    }

    pub fn first_key_value(&self) -> Option<(Vec<u8>, V)> {
        self.inner.read().first_key_value().map(owned)
    }

    pub fn last_key_value(&self) -> Option<(Vec<u8>, V)> {
        self.inner.read().last_key_value().map(owned)
    }

    pub fn ceiling_key_value(&self, key: impl AsRef<[u8]>) -> Option<(Vec<u8>, V)> {
        self.inner.read().ceiling_key_value(key.as_ref()).map(owned)
    }

    pub fn floor_key_value(&self, key: impl AsRef<[u8]>) -> Option<(Vec<u8>, V)> {
        self.inner.read().floor_key_value(key.as_ref()).map(owned)
    }

    /// Copy out every entry within `range`.
    pub fn range<K, R>(&self, range: R) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: AsRef<[u8]> + ?Sized,
        R: RangeBounds<K>,
    {
        let inner = self.inner.read();
        let entries = inner.range(range)?.map(owned).collect();
        Ok(entries)
    }

    /// Run `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&AdaptiveRadixTree<V>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the tree.
    pub fn write<R>(&self, f: impl FnOnce(&mut AdaptiveRadixTree<V>) -> R) -> R {
        let mut inner = self.inner.write();
        let result = f(&mut inner);
        self.len.store(inner.len(), Ordering::Relaxed);
        result
    }

    pub fn into_inner(self) -> AdaptiveRadixTree<V> {
        self.inner.into_inner()
    }
}

fn owned<V: Clone>((key, value): (&[u8], &V)) -> (Vec<u8>, V) {
    (key.to_vec(), value.clone())
}

impl<V: Clone> Default for SharedArt<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> From<AdaptiveRadixTree<V>> for SharedArt<V> {
    fn from(tree: AdaptiveRadixTree<V>) -> Self {
        Self {
            len: AtomicUsize::new(tree.len()),
            inner: RwLock::new(tree),
        }
    }
}
