//! Lineage Foundation
//!
//! Shared data model for the halo-lineage tracker: merger-tree input
//! nodes, tracked halo records, simulation parameters, and the
//! cosmological epoch table. No I/O lives here.

pub mod epochs;
pub mod halo;
pub mod params;
pub mod tree;
pub mod types;

pub use epochs::EpochTable;
pub use halo::{merge_clock_unset, GalaxyData, HaloRecord, HaloType, MERGE_CLOCK_NONE};
pub use params::{EngineConfig, SimParams};
pub use tree::TreeNode;
pub use types::NodeId;
