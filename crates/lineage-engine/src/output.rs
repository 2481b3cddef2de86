//! Per-tree output buffer
//!
//! Append-only storage for committed halo records. Indices are stable for
//! the lifetime of the tree and never reused; the merger back-patch
//! mutates earlier entries in place but never removes them.

use indexmap::IndexMap;

use lineage_foundation::{HaloRecord, NodeId};

use crate::error::{Error, Result};

/// Committed records for one tree.
#[derive(Debug)]
pub struct OutputBuffer {
    records: Vec<HaloRecord>,
    capacity: usize,
}

impl OutputBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a committed record for `node`. Exceeding the configured
    /// capacity is fatal.
    pub fn push(&mut self, record: HaloRecord, node: NodeId) -> Result<usize> {
        if self.records.len() >= self.capacity {
            return Err(Error::OutputExhausted {
                node,
                cap: self.capacity,
            });
        }
        self.records.push(record);
        Ok(self.records.len() - 1)
    }

    pub fn get(&self, index: usize) -> &HaloRecord {
        &self.records[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut HaloRecord {
        &mut self.records[index]
    }

    pub fn records(&self) -> &[HaloRecord] {
        &self.records
    }

    /// Assign every retained record its 0-based write position within its
    /// own output snapshot, then rewrite each non-negative `merge_into_id`
    /// from a buffer index to that per-snapshot position, so a reader can
    /// follow merger chains with indices local to one snapshot file.
    ///
    /// Returns the record count per output snapshot, in `output_snaps`
    /// order.
    pub fn prepare_for_output(&mut self, output_snaps: &[i32]) -> IndexMap<i32, usize> {
        let mut order: Vec<i64> = vec![-1; self.records.len()];
        let mut counts: IndexMap<i32, usize> = IndexMap::new();

        for &snap in output_snaps {
            let mut next = 0i64;
            for (i, rec) in self.records.iter().enumerate() {
                if rec.snap == snap {
                    order[i] = next;
                    next += 1;
                }
            }
            counts.insert(snap, next as usize);
        }

        for rec in &mut self.records {
            if rec.merge_into_id > -1 {
                rec.merge_into_id = order[rec.merge_into_id as usize];
            }
        }

        counts
    }
}
