//! Per-tree processing context
//!
//! Owns the workspace, output buffer, and per-node state for one tree.
//! Independent trees can be processed concurrently by giving each its own
//! context; nothing is shared.

use indexmap::IndexMap;
use tracing::instrument;

use lineage_foundation::{
    params::SEC_PER_MEGAYEAR, EngineConfig, EpochTable, HaloRecord, NodeId, SimParams, TreeNode,
};
use lineage_physics::Pipeline;

use crate::aux::AuxState;
use crate::codec::IndexCodec;
use crate::error::{Error, Result};
use crate::output::OutputBuffer;
use crate::workspace::GroupWorkspace;

/// Working state for one merger tree.
pub struct TreeContext<'t> {
    pub(crate) tree: &'t [TreeNode],
    pub(crate) params: &'t SimParams,
    pub(crate) epochs: &'t EpochTable,
    pub(crate) cfg: &'t EngineConfig,
    pub(crate) pipeline: &'t Pipeline,
    pub(crate) aux: Vec<AuxState>,
    pub(crate) workspace: GroupWorkspace,
    pub(crate) output: OutputBuffer,
    pub(crate) unique_counter: u64,
}

impl<'t> TreeContext<'t> {
    pub fn new(
        tree: &'t [TreeNode],
        params: &'t SimParams,
        epochs: &'t EpochTable,
        cfg: &'t EngineConfig,
        pipeline: &'t Pipeline,
    ) -> Self {
        let output_cap = ((cfg.output_scale * tree.len() as f64) as usize).max(cfg.min_growth);
        let initial_ws = cfg.initial_workspace.max(output_cap / 10);
        Self {
            tree,
            params,
            epochs,
            cfg,
            pipeline,
            aux: vec![AuxState::default(); tree.len()],
            workspace: GroupWorkspace::with_policy(
                initial_ws,
                cfg.growth_factor,
                cfg.min_growth,
                cfg.max_workspace,
            ),
            output: OutputBuffer::with_capacity(output_cap),
            unique_counter: 0,
        }
    }

    /// Walk the whole tree, evolving every FOF group exactly once in
    /// progenitors-first order.
    #[instrument(skip_all, fields(nodes = self.tree.len()))]
    pub fn process(&mut self) -> Result<()> {
        for n in 0..self.tree.len() {
            if !self.aux[n].done {
                self.build_lineages(NodeId(n as u32))?;
            }
        }
        Ok(())
    }

    /// Committed records so far, in buffer order
    pub fn committed(&self) -> &[HaloRecord] {
        self.output.records()
    }

    /// Committed-record range of `node` from its last evolution
    pub fn committed_range(&self, node: NodeId) -> (usize, usize) {
        let aux = &self.aux[node.index()];
        (aux.first_record, aux.record_count)
    }

    /// Run the pre-write pass and annotate every retained record with its
    /// global ids. Consumes the context; the tree is done.
    pub fn finish(
        mut self,
        codec: &IndexCodec,
        file: i32,
        treenr: i32,
        output_snaps: &[i32],
    ) -> Result<TreeYield> {
        let per_snap = self.output.prepare_for_output(output_snaps);

        let mut halos = Vec::with_capacity(self.output.len());
        for rec in self.output.records() {
            let fof_root = self.tree[rec.halo_nr.index()].first_in_fof_group;
            let root_aux = &self.aux[fof_root.index()];
            if root_aux.record_count == 0 {
                return Err(Error::CentralNotCommitted { root: fof_root });
            }
            let central_nr = self.output.get(root_aux.first_record).halo_nr;

            let global_id = codec.encode(file, treenr, rec.halo_nr.index() as i64)?;
            let central_global_id = codec.encode(file, treenr, central_nr.index() as i64)?;

            // -1.0 marks a record with no progenitor; preserve it
            let dt_myr = if rec.dt == -1.0 {
                -1.0
            } else {
                rec.dt * self.params.unit_time_s / SEC_PER_MEGAYEAR
            };

            halos.push(EmittedHalo {
                global_id,
                central_global_id,
                dt_myr,
                record: rec.clone(),
            });
        }

        Ok(TreeYield { halos, per_snap })
    }
}

/// One record ready for the output sink.
#[derive(Debug, Clone)]
pub struct EmittedHalo {
    pub global_id: i64,
    pub central_global_id: i64,
    /// Time step in megayears; -1.0 for records with no progenitor
    pub dt_myr: f64,
    pub record: HaloRecord,
}

/// Everything the sink needs for one finished tree.
#[derive(Debug, Clone)]
pub struct TreeYield {
    /// Retained records in buffer order, global ids attached
    pub halos: Vec<EmittedHalo>,
    /// Record count per output snapshot, in configured snapshot order
    pub per_snap: IndexMap<i32, usize>,
}
