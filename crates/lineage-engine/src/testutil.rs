//! Shared fixtures for the engine's unit tests.

use lineage_foundation::{
    params::Units, EngineConfig, EpochTable, HaloRecord, HaloType, NodeId, SimParams, TreeNode,
    MERGE_CLOCK_NONE,
};

pub(crate) fn params() -> SimParams {
    SimParams::new(0.25, 0.75, 0.73, 0.06, Units::default())
}

/// Epoch table with `n` snapshots, evenly spaced in expansion factor and
/// ending at the present.
pub(crate) fn epochs(n: usize) -> EpochTable {
    let factors: Vec<f64> = (1..=n).map(|i| i as f64 / n as f64).collect();
    EpochTable::from_expansion_factors(&factors, &params())
}

/// Small buffers so growth paths actually run in tests.
pub(crate) fn simple_cfg() -> EngineConfig {
    EngineConfig {
        initial_workspace: 4,
        growth_factor: 1.5,
        min_growth: 4,
        max_workspace: 10_000,
        output_scale: 10.0,
        max_depth: 100,
    }
}

/// A tree node that is its own FOF root until linked otherwise.
pub(crate) fn node(snap: i32, len: i32, mvir: f64) -> TreeNode {
    TreeNode {
        len,
        mvir,
        pos: [1.0, 2.0, 3.0],
        vel: [-10.0, 20.0, -30.0],
        vmax: 150.0,
        spin: [0.01, 0.02, 0.03],
        most_bound_id: 1000 + snap as i64,
        snap,
        first_progenitor: None,
        next_progenitor: None,
        first_in_fof_group: NodeId(0),
        next_in_fof_group: None,
    }
}

/// A committed record as a prior evolution would have left it.
pub(crate) fn committed(
    halo_nr: NodeId,
    snap: i32,
    halo_type: HaloType,
    mvir: f64,
    unique_id: u64,
) -> HaloRecord {
    HaloRecord {
        halo_nr,
        snap,
        halo_type,
        len: 100,
        mvir,
        rvir: 0.2,
        vvir: 120.0,
        vmax: 140.0,
        pos: [0.0; 3],
        vel: [0.0; 3],
        delta_mvir: 0.0,
        most_bound_id: 42,
        central_halo: 0,
        merge_status: 0,
        merge_into_id: -1,
        merge_into_snap: -1,
        merge_clock: MERGE_CLOCK_NONE,
        infall_mvir: 0.0,
        infall_vvir: 0.0,
        infall_vmax: 0.0,
        dt: -1.0,
        unique_id,
        galaxy: Some(Box::default()),
    }
}
