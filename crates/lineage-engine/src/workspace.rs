//! Group workspace
//!
//! Growable scratch storage for the records of one FOF group under
//! construction. Growth is geometric with a minimum increment and a hard
//! cap; growth can relocate the backing storage, so only indices are ever
//! handed out, never references that outlive a push.

use tracing::debug;

use lineage_foundation::HaloRecord;

use crate::error::{Error, Result};

/// Scratch array for one FOF group.
#[derive(Debug)]
pub struct GroupWorkspace {
    records: Vec<HaloRecord>,
    capacity: usize,
    growth_factor: f64,
    min_growth: usize,
    max_size: usize,
}

impl GroupWorkspace {
    pub fn with_policy(
        initial: usize,
        growth_factor: f64,
        min_growth: usize,
        max_size: usize,
    ) -> Self {
        let capacity = initial.min(max_size).max(1);
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            growth_factor,
            min_growth,
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record, growing if needed. Returns the record's stable
    /// index within this group.
    pub fn push(&mut self, record: HaloRecord) -> Result<usize> {
        if self.records.len() == self.capacity {
            self.grow()?;
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

    pub fn records_mut(&mut self) -> &mut [HaloRecord] {
        &mut self.records
    }

    /// Move every record out, leaving the workspace empty for the next
    /// group. Record payloads transfer by ownership, not copy.
    pub fn drain(&mut self) -> Vec<HaloRecord> {
        self.records.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn grow(&mut self) -> Result<()> {
        if self.capacity >= self.max_size {
            return Err(Error::WorkspaceExhausted { cap: self.max_size });
        }
        let mut new_size = (self.capacity as f64 * self.growth_factor) as usize;
        if new_size - self.capacity < self.min_growth {
            new_size = self.capacity + self.min_growth;
        }
        if new_size > self.max_size {
            new_size = self.max_size;
        }
        debug!(from = self.capacity, to = new_size, "growing group workspace");
        self.records.reserve_exact(new_size - self.records.len());
        self.capacity = new_size;
        Ok(())
    }
}
