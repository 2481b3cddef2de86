//! Global halo-id codec
//!
//! Packs (file index, tree index, local halo index) into a single i64 and
//! back, losslessly. Every encode verifies its own round-trip at emission
//! time; a mismatch is fatal.

use crate::error::{Error, Result};

/// Multiplier separating tree indices in a global id
pub const TREE_FACTOR: i64 = 1_000_000_000;
/// Default multiplier separating file indices in a global id
pub const FILE_FACTOR: i64 = 1_000_000_000_000_000;

/// Encoder/decoder for global halo ids.
///
/// Runs with more than 10000 input files trade one decimal digit of file
/// headroom for tree headroom, so the id still fits an i64.
#[derive(Debug, Clone, Copy)]
pub struct IndexCodec {
    file_factor: i64,
}

impl IndexCodec {
    /// `last_file` is the highest configured file index of the run.
    pub fn new(last_file: i32) -> Self {
        let file_factor = if last_file >= 10_000 {
            FILE_FACTOR / 10
        } else {
            FILE_FACTOR
        };
        Self { file_factor }
    }

    pub fn file_factor(&self) -> i64 {
        self.file_factor
    }

    /// Pack the triple into one id, verifying the round-trip.
    pub fn encode(&self, file: i32, tree: i32, halo: i64) -> Result<i64> {
        if halo < 0 || halo >= TREE_FACTOR {
            return Err(Error::IndexOverflow {
                halo,
                factor: TREE_FACTOR,
            });
        }
        if (tree as i64) >= self.file_factor / TREE_FACTOR {
            return Err(Error::IndexOverflow {
                halo: tree as i64,
                factor: self.file_factor / TREE_FACTOR,
            });
        }
        let id = halo + TREE_FACTOR * tree as i64 + self.file_factor * file as i64;
        if self.decode(id) != (file, tree, halo) {
            return Err(Error::IndexRoundTrip {
                id,
                file,
                tree,
                halo,
            });
        }
        Ok(id)
    }

    /// Recover (file, tree, halo) from a packed id.
    pub fn decode(&self, id: i64) -> (i32, i32, i64) {
        let file = id / self.file_factor;
        let rest = id % self.file_factor;
        let tree = rest / TREE_FACTOR;
        let halo = rest % TREE_FACTOR;
        (file as i32, tree as i32, halo)
    }
}
