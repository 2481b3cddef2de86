//! Group evolution
//!
//! Joins the surviving records of all progenitors of a FOF group into the
//! workspace, runs the type-transition rules, assigns the group central,
//! invokes the physics pipeline, and flushes survivors to the output
//! buffer with merger back-patching.

use tracing::trace;

use lineage_foundation::{
    merge_clock_unset, GalaxyData, HaloRecord, HaloType, NodeId, MERGE_CLOCK_NONE,
};
use lineage_physics::{GroupHalos, StageContext};

use crate::context::TreeContext;
use crate::error::{Error, Result};
use crate::virial::{virial_mass, virial_radius, virial_velocity};

impl TreeContext<'_> {
    /// Evolve the FOF group rooted at `root`. The traversal guarantees
    /// every progenitor of every member has already been built.
    pub(crate) fn evolve_group(&mut self, root: NodeId) -> Result<()> {
        let tree = self.tree;
        self.workspace.clear();

        let mut member = Some(root);
        while let Some(node) = member {
            self.join_progenitors(node)?;
            member = tree[node.index()].next_in_fof_group;
        }

        self.process_group(root)
    }

    /// Join one member's progenitor records into the workspace and wire
    /// up its central reference.
    fn join_progenitors(&mut self, node: NodeId) -> Result<()> {
        let start = self.workspace.len();
        let occupied = self.find_occupied_progenitor(node);
        self.copy_progenitor_records(node, occupied)?;
        self.assign_node_central(node, start, self.workspace.len())
    }

    /// The progenitor whose surviving subhalo carries the object identity
    /// forward: the largest-`len` progenitor that committed records last
    /// snapshot. Strict greater-than, so a later equal-`len` progenitor
    /// never displaces the current best. Falls back to the first
    /// progenitor when none is occupied.
    fn find_occupied_progenitor(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.tree;
        let first = tree[node.index()].first_progenitor;

        let mut best: Option<(NodeId, i32)> = None;
        let mut prog = first;
        while let Some(p) = prog {
            let n = &tree[p.index()];
            if self.aux[p.index()].record_count > 0
                && best.map_or(true, |(_, len)| n.len > len)
            {
                best = Some((p, n.len));
            }
            prog = n.next_progenitor;
        }

        best.map(|(p, _)| p).or(first)
    }

    /// Deep-copy every committed record of every progenitor of `node`
    /// into the workspace, applying the type transitions. A FOF root that
    /// inherits nothing gets exactly one freshly seeded central.
    fn copy_progenitor_records(&mut self, node: NodeId, occupied: Option<NodeId>) -> Result<()> {
        let tree = self.tree;
        let node_data = &tree[node.index()];
        let current_lookback = self.lookback(node_data.snap)?;
        let is_fof_root = node_data.is_fof_root(node);
        let start = self.workspace.len();

        let mut prog = node_data.first_progenitor;
        while let Some(p) = prog {
            let first = self.aux[p.index()].first_record;
            let count = self.aux[p.index()].record_count;

            for i in first..first + count {
                let mut rec = self.output.get(i).clone();
                rec.halo_nr = node;
                // lookback decreases toward the present, so this is >= 0
                rec.dt = self.lookback(rec.snap)? - current_lookback;

                if rec.halo_type.is_tracked() {
                    if rec.merge_status != 0 {
                        // already merged away; drop the payload and keep
                        // the husk only for the flush back-patch
                        rec.galaxy = None;
                        rec.halo_type = HaloType::Discarded;
                        self.workspace.push(rec)?;
                        continue;
                    }

                    let previous_mvir = rec.mvir;
                    let previous_vvir = rec.vvir;
                    let previous_vmax = rec.vmax;

                    if Some(p) == occupied {
                        rec.most_bound_id = node_data.most_bound_id;
                        rec.pos = node_data.pos;
                        rec.vel = node_data.vel;
                        rec.len = node_data.len;
                        rec.vmax = node_data.vmax;

                        let new_mvir = virial_mass(tree, node, self.params);
                        rec.delta_mvir = new_mvir - rec.mvir;
                        if new_mvir > rec.mvir {
                            // the model keeps the maximum virial extent
                            rec.rvir = virial_radius(tree, node, self.params, self.epochs)?;
                            rec.vvir = virial_velocity(tree, node, self.params, self.epochs)?;
                        }
                        rec.mvir = new_mvir;

                        if is_fof_root {
                            rec.merge_status = 0;
                            rec.merge_into_id = -1;
                            rec.merge_clock = MERGE_CLOCK_NONE;
                            rec.halo_type = HaloType::Central;
                        } else {
                            rec.merge_status = 0;
                            rec.merge_into_id = -1;

                            if rec.halo_type == HaloType::Central {
                                // infall properties the moment it becomes
                                // a subhalo
                                rec.infall_mvir = previous_mvir;
                                rec.infall_vvir = previous_vvir;
                                rec.infall_vmax = previous_vmax;
                            }

                            if rec.halo_type == HaloType::Central
                                || merge_clock_unset(rec.merge_clock)
                            {
                                rec.merge_clock = MERGE_CLOCK_NONE;
                            }

                            rec.halo_type = HaloType::Satellite;
                        }
                    } else {
                        // its subhalo was not the surviving one; tracked
                        // on as an orphan from here
                        rec.delta_mvir = -rec.mvir;
                        rec.mvir = 0.0;

                        if merge_clock_unset(rec.merge_clock)
                            || rec.halo_type == HaloType::Central
                        {
                            rec.merge_clock = 0.0;
                            rec.infall_mvir = previous_mvir;
                            rec.infall_vvir = previous_vvir;
                            rec.infall_vmax = previous_vmax;
                        }

                        rec.halo_type = HaloType::Orphan;
                    }
                }

                self.workspace.push(rec)?;
            }

            prog = tree[p.index()].next_progenitor;
        }

        if self.workspace.len() == start && is_fof_root {
            let rec = self.fresh_record(node)?;
            self.workspace.push(rec)?;
        }

        Ok(())
    }

    /// A brand-new central seeded from the node's catalog properties.
    fn fresh_record(&mut self, node: NodeId) -> Result<HaloRecord> {
        let tree = self.tree;
        let n = &tree[node.index()];
        debug_assert!(n.is_fof_root(node));

        let mvir = virial_mass(tree, node, self.params);
        let rvir = virial_radius(tree, node, self.params, self.epochs)?;
        let vvir = virial_velocity(tree, node, self.params, self.epochs)?;

        let unique_id = self.unique_counter;
        self.unique_counter += 1;

        Ok(HaloRecord {
            halo_nr: node,
            // stamped with the node's snapshot at flush
            snap: n.snap - 1,
            halo_type: HaloType::Central,
            len: n.len,
            mvir,
            rvir,
            vvir,
            vmax: n.vmax,
            pos: n.pos,
            vel: n.vel,
            delta_mvir: 0.0,
            most_bound_id: n.most_bound_id,
            central_halo: 0,
            merge_status: 0,
            merge_into_id: -1,
            merge_into_snap: -1,
            merge_clock: MERGE_CLOCK_NONE,
            infall_mvir: mvir,
            infall_vvir: vvir,
            infall_vmax: n.vmax,
            dt: -1.0,
            unique_id,
            galaxy: Some(Box::new(GalaxyData::default())),
        })
    }

    /// Exactly one record in a member's range may be a central or a
    /// satellite; every record in the range points at it.
    fn assign_node_central(&mut self, node: NodeId, start: usize, end: usize) -> Result<()> {
        let mut central = None;
        for i in start..end {
            if self.workspace.get(i).halo_type.is_tracked() {
                if let Some(first) = central {
                    return Err(Error::MultipleCentrals {
                        node,
                        first,
                        second: i,
                    });
                }
                central = Some(i);
            }
        }

        let Some(central) = central else {
            if start == end {
                return Ok(());
            }
            return Err(Error::MissingCentral {
                node,
                count: end - start,
            });
        };

        for i in start..end {
            self.workspace.get_mut(i).central_halo = central;
        }
        Ok(())
    }

    /// Verify the group central, run the physics pipeline, flush.
    fn process_group(&mut self, root: NodeId) -> Result<()> {
        if self.workspace.is_empty() {
            return Ok(());
        }

        let central = self.workspace.get(0).central_halo;
        let central_rec = self.workspace.get(central);
        if central_rec.halo_type != HaloType::Central || central_rec.halo_nr != root {
            return Err(Error::CentralMismatch {
                root,
                owner: central_rec.halo_nr,
                found: central_rec.halo_type,
            });
        }

        let snap = self.tree[root.index()].snap;
        let redshift = self.epochs.redshift(snap).ok_or(Error::SnapshotOutOfRange {
            snap,
            len: self.epochs.len(),
        })?;

        let ctx = StageContext {
            root,
            snap,
            redshift,
            central,
        };
        let pipeline = self.pipeline;
        let mut group = GroupHalos::new(self.workspace.records_mut(), self.output.len());
        pipeline.execute(&ctx, &mut group)?;

        self.flush_group()
    }

    /// Migrate the workspace into the output buffer. Survivors are
    /// appended in order; merging records are dropped and their
    /// earlier-snapshot counterparts back-patched.
    fn flush_group(&mut self) -> Result<()> {
        let tree = self.tree;
        let records = self.workspace.drain();
        let merge_keys: Vec<(i32, i64)> = records
            .iter()
            .map(|r| (r.merge_status, r.merge_into_id))
            .collect();

        let mut current: Option<NodeId> = None;
        for (p, mut rec) in records.into_iter().enumerate() {
            let node = rec.halo_nr;
            if current != Some(node) {
                current = Some(node);
                self.aux[node.index()].first_record = self.output.len();
                self.aux[node.index()].record_count = 0;
            }

            if rec.merge_status > 0 {
                // earlier records merging away this pass will not be
                // retained, so smaller targets shift down beneath this one
                let offset = merge_keys[..p]
                    .iter()
                    .filter(|(status, into)| *status > 0 && rec.merge_into_id > *into)
                    .count() as i64;

                let first = self.aux[node.index()].first_record;
                let target = (0..first)
                    .rev()
                    .find(|&i| self.output.get(i).unique_id == rec.unique_id)
                    .ok_or(Error::MergeTargetNotFound {
                        node,
                        unique_id: rec.unique_id,
                    })?;

                let snap = tree[node.index()].snap;
                let earlier = self.output.get_mut(target);
                earlier.merge_status = rec.merge_status;
                earlier.merge_into_id = rec.merge_into_id - offset;
                earlier.merge_into_snap = snap;
                trace!(node = %node, target, "merger back-patched");
            } else {
                rec.snap = tree[node.index()].snap;
                self.output.push(rec, node)?;
                self.aux[node.index()].record_count += 1;
            }
        }

        Ok(())
    }

    fn lookback(&self, snap: i32) -> Result<f64> {
        self.epochs.lookback(snap).ok_or(Error::SnapshotOutOfRange {
            snap,
            len: self.epochs.len(),
        })
    }
}
