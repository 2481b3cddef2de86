//! I/O errors

use std::path::PathBuf;

use thiserror::Error;

/// I/O result type
pub type Result<T> = std::result::Result<T, Error>;

/// I/O errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad tree-file header in {path}: {message}")]
    BadHeader { path: PathBuf, message: String },

    #[error("tree {treenr} truncated: expected {expected} nodes, file ended after {got}")]
    TruncatedTree {
        treenr: usize,
        expected: usize,
        got: usize,
    },

    #[error("tree {treenr} out of range: file holds {count} trees")]
    TreeOutOfRange { treenr: usize, count: usize },

    #[error("node {node} of tree {treenr} has no FOF group link")]
    MissingFofLink { treenr: usize, node: usize },

    #[error("snapshot list {path}: {message}")]
    BadSnapList { path: PathBuf, message: String },

    #[error("output snapshot {snap} is not in the epoch table")]
    UnknownSnapshot { snap: i32 },
}
