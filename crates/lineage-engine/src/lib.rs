//! Lineage Engine
//!
//! Turns one merger tree into a time-ordered sequence of tracked halo
//! records. The traversal orders group evolution so every progenitor is
//! built first; the evolver joins progenitor records, runs the type
//! transitions, invokes the physics pipeline, and flushes survivors to
//! the per-tree output buffer with merger back-patching; the codec packs
//! file/tree/halo indices into the global ids the output carries.

pub mod aux;
pub mod codec;
pub mod context;
pub mod error;
pub mod output;
pub mod virial;
pub mod workspace;

mod evolver;
mod traversal;

#[cfg(test)]
mod testutil;

pub use aux::{AuxState, GroupFlag};
pub use codec::IndexCodec;
pub use context::{EmittedHalo, TreeContext, TreeYield};
pub use error::{Error, Result};
pub use output::OutputBuffer;
pub use workspace::GroupWorkspace;
