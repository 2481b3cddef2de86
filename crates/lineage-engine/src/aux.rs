//! Per-node traversal and bookkeeping state
//!
//! One `AuxState` per tree node, reset for every tree. The committed
//! range (`first_record`, `record_count`) always reflects the node's most
//! recent evolution; descendants read it to inherit, the back-patch scans
//! below it to find earlier-snapshot counterparts.

/// Build state of a node's FOF group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupFlag {
    #[default]
    Unvisited,
    /// Progenitors of every member are being built
    Building,
    /// Group evolved; touching it again is input corruption
    Evolved,
}

/// Ephemeral per-node state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuxState {
    /// Visited-once guard for the traversal
    pub done: bool,
    pub flag: GroupFlag,
    /// First committed record of this node's last evolution
    pub first_record: usize,
    /// Committed record count of this node's last evolution; a node with
    /// a non-zero count is an "occupied" progenitor
    pub record_count: usize,
}
