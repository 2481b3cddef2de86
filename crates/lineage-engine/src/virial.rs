//! Virial property rules
//!
//! Masses, radii, and velocities derived from the catalog halo at its
//! snapshot's redshift.

use lineage_foundation::{EpochTable, NodeId, SimParams, TreeNode};

use crate::error::{Error, Result};

/// Virial mass of a node: the catalog spherical-overdensity estimate for
/// a FOF root carrying a valid value, otherwise particle count times
/// particle mass.
pub fn virial_mass(tree: &[TreeNode], node: NodeId, params: &SimParams) -> f64 {
    let n = &tree[node.index()];
    if n.is_fof_root(node) && n.mvir >= 0.0 {
        n.mvir
    } else {
        n.len as f64 * params.part_mass
    }
}

/// Radius enclosing 200 times the critical density at the node's
/// snapshot.
pub fn virial_radius(
    tree: &[TreeNode],
    node: NodeId,
    params: &SimParams,
    epochs: &EpochTable,
) -> Result<f64> {
    let snap = tree[node.index()].snap;
    let z = epochs.redshift(snap).ok_or(Error::SnapshotOutOfRange {
        snap,
        len: epochs.len(),
    })?;
    let hubble_of_z_sq = params.hubble_sq_at(z);
    let rhocrit = 3.0 * hubble_of_z_sq / (8.0 * std::f64::consts::PI * params.g);
    let fac = 1.0 / (200.0 * 4.0 * std::f64::consts::PI / 3.0 * rhocrit);
    Ok((virial_mass(tree, node, params) * fac).cbrt())
}

/// Circular velocity at the virial radius; zero for a vanishing radius.
pub fn virial_velocity(
    tree: &[TreeNode],
    node: NodeId,
    params: &SimParams,
    epochs: &EpochTable,
) -> Result<f64> {
    let rvir = virial_radius(tree, node, params, epochs)?;
    if rvir > 0.0 {
        Ok((params.g * virial_mass(tree, node, params) / rvir).sqrt())
    } else {
        Ok(0.0)
    }
}
