//! Test harness for end-to-end lineage tracking.
//!
//! Builds small in-memory merger trees, runs the full engine over them,
//! and hands back owned results for assertion.

use lineage_engine::{IndexCodec, Result, TreeContext, TreeYield};
use lineage_foundation::{
    params::Units, EngineConfig, EpochTable, HaloRecord, NodeId, SimParams, TreeNode,
};
use lineage_physics::Pipeline;

/// Shared fixtures for one synthetic simulation.
pub struct TestHarness {
    pub params: SimParams,
    pub epochs: EpochTable,
    pub cfg: EngineConfig,
}

/// Owned results of processing one tree.
pub struct ProcessedTree {
    /// Committed records in buffer order
    pub records: Vec<HaloRecord>,
    /// Committed (first, count) range per tree node
    pub ranges: Vec<(usize, usize)>,
}

impl TestHarness {
    /// A simulation with `snapshots` snapshots, evenly spaced in
    /// expansion factor and ending at the present.
    pub fn new(snapshots: usize) -> Self {
        let params = SimParams::new(0.25, 0.75, 0.73, 0.06, Units::default());
        let factors: Vec<f64> = (1..=snapshots)
            .map(|i| i as f64 / snapshots as f64)
            .collect();
        let epochs = EpochTable::from_expansion_factors(&factors, &params);
        let cfg = EngineConfig {
            initial_workspace: 4,
            growth_factor: 1.5,
            min_growth: 4,
            max_workspace: 10_000,
            output_scale: 10.0,
            max_depth: 100,
        };
        Self {
            params,
            epochs,
            cfg,
        }
    }

    /// Process a tree and keep the committed state for inspection.
    pub fn run(&self, tree: &[TreeNode], pipeline: &Pipeline) -> Result<ProcessedTree> {
        let mut ctx = TreeContext::new(tree, &self.params, &self.epochs, &self.cfg, pipeline);
        ctx.process()?;
        let ranges = (0..tree.len())
            .map(|n| ctx.committed_range(NodeId(n as u32)))
            .collect();
        let records = ctx.committed().to_vec();
        Ok(ProcessedTree { records, ranges })
    }

    /// Process a tree through to emission.
    pub fn run_to_yield(
        &self,
        tree: &[TreeNode],
        pipeline: &Pipeline,
        file: i32,
        treenr: i32,
        output_snaps: &[i32],
    ) -> Result<TreeYield> {
        let mut ctx = TreeContext::new(tree, &self.params, &self.epochs, &self.cfg, pipeline);
        ctx.process()?;
        let codec = IndexCodec::new(8);
        ctx.finish(&codec, file, treenr, output_snaps)
    }
}

/// A tree node that is its own FOF root until linked otherwise.
pub fn node(snap: i32, len: i32, mvir: f64) -> TreeNode {
    TreeNode {
        len,
        mvir,
        pos: [5.0, 6.0, 7.0],
        vel: [1.0, -2.0, 3.0],
        vmax: 180.0,
        spin: [0.04, 0.05, 0.06],
        most_bound_id: 5000 + snap as i64,
        snap,
        first_progenitor: None,
        next_progenitor: None,
        first_in_fof_group: NodeId(0),
        next_in_fof_group: None,
    }
}

/// Wire every node to be its own FOF root.
pub fn own_fof_roots(tree: &mut [TreeNode]) {
    for (i, n) in tree.iter_mut().enumerate() {
        n.first_in_fof_group = NodeId(i as u32);
    }
}
