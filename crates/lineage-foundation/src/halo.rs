//! Tracked halo records
//!
//! A `HaloRecord` follows one object through cosmic time. Records move
//! through a per-group scratch workspace before being committed to the
//! per-tree output buffer; inheritance across snapshots is always a deep
//! value copy, payload included.

use crate::types::NodeId;

/// Merge-clock value meaning "no merger pending".
pub const MERGE_CLOCK_NONE: f64 = 999.9;

/// Whether a merge clock carries the "no merger pending" sentinel.
///
/// The sentinel is written as 999.9 and tested with a threshold so that
/// inherited values survive float round-trips.
pub fn merge_clock_unset(clock: f64) -> bool {
    clock > 999.0
}

/// Tracked object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaloType {
    /// Main halo of its FOF group
    Central = 0,
    /// Satellite still hosted by its own surviving subhalo
    Satellite = 1,
    /// Subhalo lost; tracked without one
    Orphan = 2,
    /// Merging away this step; never committed
    Discarded = 3,
}

impl HaloType {
    /// Centrals and satellites carry their group's central role
    pub fn is_tracked(self) -> bool {
        matches!(self, HaloType::Central | HaloType::Satellite)
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Opaque per-record physics payload.
///
/// Owned exclusively by its record; the only way ownership moves between
/// records is `Clone`, so a pipeline mutation on an inherited copy can
/// never reach an already-committed earlier-snapshot record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalaxyData {
    pub cold_gas: f64,
    pub hot_gas: f64,
    pub ejected_gas: f64,
    pub stellar_mass: f64,
    pub bulge_mass: f64,
    pub black_hole_mass: f64,
    pub metals_cold: f64,
    pub metals_stellar: f64,
    pub sfr: f64,
}

/// One tracked halo at one snapshot.
#[derive(Debug, Clone)]
pub struct HaloRecord {
    /// Tree node currently hosting this record
    pub halo_nr: NodeId,
    pub snap: i32,
    pub halo_type: HaloType,
    /// Particle count inherited from the hosting node
    pub len: i32,
    pub mvir: f64,
    pub rvir: f64,
    pub vvir: f64,
    pub vmax: f64,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    /// Mass change over the step that produced this record
    pub delta_mvir: f64,
    pub most_bound_id: i64,
    /// Workspace index of this group's central record
    pub central_halo: usize,
    /// 0 = alive; positive codes mark a merger verdict for this step
    pub merge_status: i32,
    /// Output-buffer index the merge target will occupy; -1 when none.
    /// Rewritten to a snapshot-local write position before emission.
    pub merge_into_id: i64,
    /// Snapshot at which the merger lands; -1 until back-patched
    pub merge_into_snap: i32,
    /// Remaining time until the pending merger; 999.9 = none pending
    pub merge_clock: f64,
    pub infall_mvir: f64,
    pub infall_vvir: f64,
    pub infall_vmax: f64,
    /// Time step from the progenitor snapshot, internal units; -1.0 for a
    /// freshly created record
    pub dt: f64,
    /// Tree-local lineage id, fixed at creation and inherited by every
    /// copy; the merger back-patch matches on it
    pub unique_id: u64,
    /// Physics payload; `None` once discarded
    pub galaxy: Option<Box<GalaxyData>>,
}
