//! Lineage I/O
//!
//! External collaborators at their boundary: merger-tree suppliers and
//! output sinks. The engine itself never touches a file; the driver wires
//! a supplier and a sink around it.

pub mod error;
pub mod lhalo;
pub mod sink;
pub mod snaplist;

use lineage_engine::TreeYield;
use lineage_foundation::TreeNode;

pub use error::{Error, Result};
pub use lhalo::LHaloTreeFile;
pub use sink::BinaryOutputSink;

/// Source of merger trees for one input file.
pub trait TreeSupplier {
    fn tree_count(&self) -> usize;

    /// Node counts per tree, as the file header declares them
    fn tree_sizes(&self) -> &[usize];

    /// The full, immutable node array of one tree
    fn load_tree(&mut self, treenr: usize) -> Result<Vec<TreeNode>>;
}

/// Consumer of finished trees.
pub trait OutputSink {
    fn write_tree(&mut self, treenr: usize, tree: &TreeYield) -> Result<()>;

    /// Back-fill headers and close; must be called exactly once, after
    /// the last tree
    fn finalize(&mut self) -> Result<()>;
}
