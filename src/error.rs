//! Error type for the recoverable conditions of the index.
//!
//! Absent keys are not errors: lookups and navigation return `Option`.
//! Broken node invariants are not errors either: the node primitives panic,
//! since a tree in that state can no longer answer queries correctly.

use std::string::FromUtf8Error;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtError {
    #[error("range start is greater than range end")]
    InvertedRange,
    #[error("cannot decode a {expected}-byte key from {actual} bytes")]
    KeyLength { expected: usize, actual: usize },
    #[error("key is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
    #[error("integrity violation at node {node}: {reason}")]
    Integrity { node: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, ArtError>;
