//! Engine errors
//!
//! Every variant is fatal for the run: either the input tree violates a
//! structural invariant, a configured resource cap was hit, or the
//! physics pipeline failed. Nothing here is retried.

use thiserror::Error;

use lineage_foundation::{HaloType, NodeId};

/// Engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("workspace cap of {cap} records reached while assembling a group")]
    WorkspaceExhausted { cap: usize },

    #[error("output buffer full: capacity {cap} reached while committing node {node}")]
    OutputExhausted { node: NodeId, cap: usize },

    #[error("node {node} has central candidates at records {first} and {second}")]
    MultipleCentrals {
        node: NodeId,
        first: usize,
        second: usize,
    },

    #[error("no central candidate among the {count} records of node {node}")]
    MissingCentral { node: NodeId, count: usize },

    #[error("group root {root}: central record is {found:?} owned by node {owner}")]
    CentralMismatch {
        root: NodeId,
        owner: NodeId,
        found: HaloType,
    },

    #[error("no earlier-snapshot record with lineage id {unique_id} below node {node}")]
    MergeTargetNotFound { node: NodeId, unique_id: u64 },

    #[error("group of node {node} reached evolution without being built")]
    GroupNotBuilt { node: NodeId },

    #[error("no committed central for group root {root} at emission")]
    CentralNotCommitted { root: NodeId },

    #[error("traversal depth {depth} at node {node} exceeds the configured maximum {max}")]
    DepthExceeded {
        node: NodeId,
        depth: usize,
        max: usize,
    },

    #[error("snapshot {snap} outside the epoch table ({len} entries)")]
    SnapshotOutOfRange { snap: i32, len: usize },

    #[error("halo index {halo} does not fit under the tree multiplier {factor}")]
    IndexOverflow { halo: i64, factor: i64 },

    #[error("global id {id} fails round-trip for (file {file}, tree {tree}, halo {halo})")]
    IndexRoundTrip {
        id: i64,
        file: i32,
        tree: i32,
        halo: i64,
    },

    #[error(transparent)]
    Pipeline(#[from] lineage_physics::Error),
}
