//! Tree traversal
//!
//! Sequences group evolution so that (a) every progenitor of a node is
//! fully built before the node's group evolves, (b) every progenitor of
//! every member of the node's FOF group is built as well, and (c) each
//! group evolves exactly once. The walk uses an explicit work stack
//! rather than native recursion, so deep trees cannot overflow the call
//! stack; the two-phase ordering is preserved exactly because the
//! inheritance logic depends on it.

use tracing::trace;

use lineage_foundation::NodeId;

use crate::aux::GroupFlag;
use crate::context::TreeContext;
use crate::error::{Error, Result};

enum Frame {
    /// Build a node: its own progenitors first, then its group
    Visit { node: NodeId, depth: usize },
    /// Own progenitors done; stage the rest of the FOF group
    GroupScan { node: NodeId, depth: usize },
    /// Both waves done; evolve the group if still pending
    Evolve { node: NodeId },
}

impl TreeContext<'_> {
    /// Build every lineage reachable from `start`.
    ///
    /// A node can be reached as a progenitor along multiple paths; the
    /// done flag guards re-entry, checked at the moment a frame pops,
    /// matching the recursive formulation's check-before-call.
    pub(crate) fn build_lineages(&mut self, start: NodeId) -> Result<()> {
        let tree = self.tree;
        let mut stack = vec![Frame::Visit {
            node: start,
            depth: 0,
        }];
        let mut chain: Vec<NodeId> = Vec::new();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit { node, depth } => {
                    if self.aux[node.index()].done {
                        continue;
                    }
                    if depth > self.cfg.max_depth {
                        return Err(Error::DepthExceeded {
                            node,
                            depth,
                            max: self.cfg.max_depth,
                        });
                    }
                    self.aux[node.index()].done = true;

                    stack.push(Frame::GroupScan { node, depth });

                    chain.clear();
                    let mut prog = tree[node.index()].first_progenitor;
                    while let Some(p) = prog {
                        chain.push(p);
                        prog = tree[p.index()].next_progenitor;
                    }
                    // reversed, so the first progenitor pops first
                    for p in chain.drain(..).rev() {
                        stack.push(Frame::Visit {
                            node: p,
                            depth: depth + 1,
                        });
                    }
                }

                Frame::GroupScan { node, depth } => {
                    let fof = tree[node.index()].first_in_fof_group;
                    stack.push(Frame::Evolve { node });

                    if self.aux[fof.index()].flag == GroupFlag::Unvisited {
                        self.aux[fof.index()].flag = GroupFlag::Building;

                        // progenitors of every member, member-chain order
                        chain.clear();
                        let mut member = Some(fof);
                        while let Some(m) = member {
                            let mut prog = tree[m.index()].first_progenitor;
                            while let Some(p) = prog {
                                chain.push(p);
                                prog = tree[p.index()].next_progenitor;
                            }
                            member = tree[m.index()].next_in_fof_group;
                        }
                        for p in chain.drain(..).rev() {
                            stack.push(Frame::Visit {
                                node: p,
                                depth: depth + 1,
                            });
                        }
                    }
                }

                Frame::Evolve { node } => {
                    let fof = tree[node.index()].first_in_fof_group;
                    match self.aux[fof.index()].flag {
                        GroupFlag::Building => {
                            self.aux[fof.index()].flag = GroupFlag::Evolved;
                            trace!(root = %fof, "evolving group");
                            self.evolve_group(fof)?;
                        }
                        // another member of the group got there first
                        GroupFlag::Evolved => {}
                        GroupFlag::Unvisited => {
                            return Err(Error::GroupNotBuilt { node });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
