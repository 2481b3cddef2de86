//! Merger-tree input nodes
//!
//! One `TreeNode` per structure-finder halo per snapshot. The node array
//! for a tree is loaded once, never mutated, and dropped when the tree is
//! done.

use crate::types::NodeId;

/// A single halo in the input merger tree.
///
/// The four link fields encode the tree graph: the progenitor chain walks
/// back in time, the FOF chain walks across the halos sharing one
/// friends-of-friends host at the same snapshot. `first_in_fof_group`
/// always resolves (a FOF root points at itself).
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Particle count
    pub len: i32,
    /// Catalog spherical-overdensity mass estimate; negative when absent
    pub mvir: f64,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    pub vmax: f64,
    pub spin: [f64; 3],
    /// Most-bound particle id, or a finder-assigned unique halo id
    pub most_bound_id: i64,
    pub snap: i32,
    pub first_progenitor: Option<NodeId>,
    pub next_progenitor: Option<NodeId>,
    pub first_in_fof_group: NodeId,
    pub next_in_fof_group: Option<NodeId>,
}

impl TreeNode {
    /// Whether the node with id `me` is the root of its own FOF group
    pub fn is_fof_root(&self, me: NodeId) -> bool {
        self.first_in_fof_group == me
    }
}
