//! Unsigned byte ordering.
//!
//! Keys are compared byte by byte, most significant byte first, with every
//! byte read as an unsigned value in `0..=255`. A key that is a strict prefix
//! of another sorts first. Node layouts, the tree's descent and the range
//! checks all go through these helpers so partial-key order at every level
//! agrees with whole-key order.

use std::cmp::Ordering;

/// Reinterprets a signed byte as its unsigned value.
///
/// `0x00..=0x7f` keep their value and `-128..=-1` map to `0x80..=0xff`, so
/// negative bytes order after all non-negative ones.
#[inline]
pub const fn unsigned(byte: i8) -> u8 {
    byte as u8
}

/// Inverse of [`unsigned`].
#[inline]
pub const fn signed(byte: u8) -> i8 {
    byte as i8
}

/// Converts a signed byte sequence to an unsigned key.
pub fn from_signed(bytes: &[i8]) -> Vec<u8> {
    bytes.iter().map(|&b| unsigned(b)).collect()
}

/// Compares two keys in unsigned lexicographic order.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    let shared = common_prefix_len(a, b);
    match (a.get(shared), b.get(shared)) {
        (Some(x), Some(y)) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Length of the longest common prefix of `a` and `b`.
#[inline]
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
