//! Typed keys over the byte-keyed tree.
//!
//! A [`BinaryComparable`] type encodes to bytes whose unsigned lexicographic
//! order is the type's own order, so the tree's navigation and range queries
//! work unchanged on the typed view.

use std::marker::PhantomData;
use std::ops::{Bound, RangeBounds};

use crate::error::{ArtError, Result};
use crate::{AdaptiveRadixTree, Config};

/// Order-preserving conversion between a key type and bytes.
///
/// For any `a` and `b`, `a.cmp(&b)` must equal the unsigned byte comparison of
/// `a.to_bytes()` and `b.to_bytes()`, and `from_bytes(&a.to_bytes())` must
/// give back `a`.
pub trait BinaryComparable: Sized {
    fn to_bytes(&self) -> Vec<u8>;

    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

impl BinaryComparable for Vec<u8> {
    fn to_bytes(&self) -> Vec<u8> {
        self.clone()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl BinaryComparable for String {
    fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| ArtError::KeyLength {
        expected: N,
        actual: bytes.len(),
    })
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl BinaryComparable for $t {
            fn to_bytes(&self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }

            fn from_bytes(bytes: &[u8]) -> Result<Self> {
                Ok(<$t>::from_be_bytes(fixed(bytes)?))
            }
        }
    )*};
}

// Flipping the sign bit moves negatives below zero in unsigned order.
macro_rules! impl_signed {
    ($($t:ty => $u:ty),*) => {$(
        impl BinaryComparable for $t {
            fn to_bytes(&self) -> Vec<u8> {
                ((*self as $u) ^ (1 << (<$u>::BITS - 1))).to_be_bytes().to_vec()
            }

            fn from_bytes(bytes: &[u8]) -> Result<Self> {
                let raw = <$u>::from_be_bytes(fixed(bytes)?);
                Ok((raw ^ (1 << (<$u>::BITS - 1))) as $t)
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64, u128);
impl_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128);

/// An ordered map keyed by a [`BinaryComparable`] type.
///
/// ```
/// use art_index::KeyedArt;
///
/// let mut map = KeyedArt::new();
/// map.insert(&-5i32, "neg");
/// map.insert(&3i32, "pos");
/// map.insert(&0i32, "zero");
/// let keys: Vec<i32> = map.iter().map(|e| e.unwrap().0).collect();
/// assert_eq!(keys, [-5, 0, 3]);
/// ```
pub struct KeyedArt<K, V> {
    tree: AdaptiveRadixTree<V>,
    _key: PhantomData<fn() -> K>,
}

impl<K: BinaryComparable, V> KeyedArt<K, V> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            tree: AdaptiveRadixTree::with_config(config),
            _key: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn insert(&mut self, key: &K, value: V) -> Option<V> {
        self.tree.insert(&key.to_bytes(), value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get(&key.to_bytes())
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.tree.get_mut(&key.to_bytes())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.contains_key(&key.to_bytes())
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.tree.remove(&key.to_bytes())
    }

    pub fn first(&self) -> Result<Option<(K, &V)>> {
        decode(self.tree.first_key_value())
    }

    pub fn last(&self) -> Result<Option<(K, &V)>> {
        decode(self.tree.last_key_value())
    }

    pub fn ceiling(&self, key: &K) -> Result<Option<(K, &V)>> {
        decode(self.tree.ceiling_key_value(&key.to_bytes()))
    }

    pub fn floor(&self, key: &K) -> Result<Option<(K, &V)>> {
        decode(self.tree.floor_key_value(&key.to_bytes()))
    }

    pub fn higher(&self, key: &K) -> Result<Option<(K, &V)>> {
        decode(self.tree.higher_key_value(&key.to_bytes()))
    }

    pub fn lower(&self, key: &K) -> Result<Option<(K, &V)>> {
        decode(self.tree.lower_key_value(&key.to_bytes()))
    }

    /// Entries in ascending key order; a key that fails to decode yields an
    /// error in its place.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Result<(K, &V)>> + '_ {
        self.tree.iter().map(|(k, v)| Ok((K::from_bytes(k)?, v)))
    }

    /// Entries whose keys fall within `range`.
    pub fn range<R: RangeBounds<K>>(
        &self,
        range: R,
    ) -> Result<impl DoubleEndedIterator<Item = Result<(K, &V)>> + '_> {
        let encode = |bound: Bound<&K>| match bound {
            Bound::Included(k) => Bound::Included(k.to_bytes()),
            Bound::Excluded(k) => Bound::Excluded(k.to_bytes()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let bounds = (encode(range.start_bound()), encode(range.end_bound()));
        let entries = self.tree.range::<Vec<u8>, _>(bounds)?;
        Ok(entries.map(|(k, v)| Ok((K::from_bytes(k)?, v))))
    }

    /// The underlying byte-keyed tree.
    pub fn as_tree(&self) -> &AdaptiveRadixTree<V> {
        &self.tree
    }

    pub fn into_tree(self) -> AdaptiveRadixTree<V> {
        self.tree
    }
}

fn decode<K: BinaryComparable, V>(entry: Option<(&[u8], V)>) -> Result<Option<(K, V)>> {
    entry.map(|(k, v)| Ok((K::from_bytes(k)?, v))).transpose()
}

impl<K: BinaryComparable, V> Default for KeyedArt<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
