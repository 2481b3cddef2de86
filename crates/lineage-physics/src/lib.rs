//! Physics Stage Registry.
//!
//! The tracking engine is physics-agnostic: after a FOF group is
//! assembled it hands the group to an ordered pipeline of stages, each of
//! which may update the opaque per-record payload. Stage execution order
//! is the configured order, preserved exactly; later stages may depend on
//! earlier stages' payload mutations.
//!
//! # Architecture
//!
//! The registry uses [`linkme::distributed_slice`] for compile-time
//! registration:
//!
//! 1. Stages register a [`StageDescriptor`] into [`STAGES`]
//! 2. At link time all registrations are collected
//! 3. [`Pipeline::from_names`] resolves the configured stage list against
//!    the registry, failing on unknown names
//!
//! Stages never touch the tracking fields of a record directly: the
//! [`GroupHalos`] view hands out halo properties read-only and payloads
//! mutably, plus a narrow surface for merger verdicts.

pub mod group;
pub mod stages;

use indexmap::IndexMap;
use linkme::distributed_slice;
use thiserror::Error;
use tracing::debug;

use lineage_foundation::NodeId;

pub use group::GroupHalos;

/// Pipeline result type
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown physics stage: {0}")]
    UnknownStage(String),

    #[error("stage {stage} failed on group {root}: {message}")]
    StageFailed {
        stage: &'static str,
        root: NodeId,
        message: String,
    },
}

/// Context handed to every stage for one evolved FOF group.
#[derive(Debug, Clone, Copy)]
pub struct StageContext {
    /// FOF root node of the group
    pub root: NodeId,
    /// Snapshot being evolved to
    pub snap: i32,
    /// Redshift of that snapshot
    pub redshift: f64,
    /// Workspace index of the group's central record
    pub central: usize,
}

/// One galaxy-physics stage.
///
/// `process_group` is invoked exactly once per evolved FOF group, after
/// assembly and before the flush. It must not resize, reorder, or retain
/// the group past the call.
pub trait PhysicsStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn process_group(&self, ctx: &StageContext, group: &mut GroupHalos<'_>) -> Result<()>;
}

/// Per-stage tuning values from the run configuration.
#[derive(Debug, Clone, Default)]
pub struct StageParams(IndexMap<String, f64>);

impl StageParams {
    pub fn new(values: IndexMap<String, f64>) -> Self {
        Self(values)
    }

    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.0.get(key).copied().unwrap_or(default)
    }
}

/// Descriptor for a registered physics stage
pub struct StageDescriptor {
    /// Configuration name (e.g. "cooling")
    pub name: &'static str,
    /// One-line description
    pub doc: &'static str,
    /// Stage constructor
    pub build: fn(&StageParams) -> Box<dyn PhysicsStage>,
}

/// Distributed slice collecting all stage registrations.
#[distributed_slice]
pub static STAGES: [StageDescriptor];

/// Get all registered stage names
pub fn all_names() -> impl Iterator<Item = &'static str> {
    STAGES.iter().map(|s| s.name)
}

/// Look up a stage by name
pub fn get(name: &str) -> Option<&'static StageDescriptor> {
    STAGES.iter().find(|s| s.name == name)
}

/// An ordered pipeline of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn PhysicsStage>>,
}

impl Pipeline {
    /// A pipeline that does nothing; halo tracking still runs in full.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Build from explicit stage instances, preserving the given order.
    pub fn from_stages(stages: Vec<Box<dyn PhysicsStage>>) -> Self {
        Self { stages }
    }

    /// Resolve configured stage names against the registry, in order.
    pub fn from_names(names: &[String], params: &StageParams) -> Result<Self> {
        let mut stages = Vec::with_capacity(names.len());
        for name in names {
            let desc = get(name).ok_or_else(|| Error::UnknownStage(name.clone()))?;
            debug!(stage = desc.name, "stage registered");
            stages.push((desc.build)(params));
        }
        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over the group, in registration order.
    pub fn execute(&self, ctx: &StageContext, group: &mut GroupHalos<'_>) -> Result<()> {
        for stage in &self.stages {
            stage.process_group(ctx, group)?;
        }
        Ok(())
    }
}
