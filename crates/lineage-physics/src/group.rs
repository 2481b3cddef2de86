//! Restricted group view for physics stages
//!
//! Wraps the workspace slice of one assembled FOF group. Halo tracking
//! fields are read-only from here; only the payload and the merger
//! verdict surface are writable.

use lineage_foundation::{GalaxyData, HaloRecord};

/// Mutable view of one FOF group during pipeline execution.
pub struct GroupHalos<'a> {
    records: &'a mut [HaloRecord],
    /// Output-buffer length at the time the group was assembled; merge
    /// targets are recorded as the buffer index they will occupy
    committed_base: usize,
}

impl<'a> GroupHalos<'a> {
    pub fn new(records: &'a mut [HaloRecord], committed_base: usize) -> Self {
        Self {
            records,
            committed_base,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tracked halo properties, read-only
    pub fn halo(&self, i: usize) -> &HaloRecord {
        &self.records[i]
    }

    /// Payload of record `i`; `None` once discarded
    pub fn galaxy(&self, i: usize) -> Option<&GalaxyData> {
        self.records[i].galaxy.as_deref()
    }

    /// Mutable payload of record `i`; `None` once discarded
    pub fn galaxy_mut(&mut self, i: usize) -> Option<&mut GalaxyData> {
        self.records[i].galaxy.as_deref_mut()
    }

    /// Record a merger verdict: record `halo` merges into record `target`
    /// (both workspace indices within this group). The flush consumes the
    /// flags: the merging record is dropped from the output and its
    /// earlier-snapshot counterpart back-patched.
    pub fn mark_merged(&mut self, halo: usize, target: usize) {
        let id = (self.committed_base + target) as i64;
        let rec = &mut self.records[halo];
        rec.merge_status = 1;
        rec.merge_into_id = id;
    }

    /// Update the countdown until a pending merger completes.
    pub fn set_merge_clock(&mut self, halo: usize, value: f64) {
        self.records[halo].merge_clock = value;
    }
}
