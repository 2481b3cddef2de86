//! Built-in demonstration stages
//!
//! Minimal baryonic prescriptions exercising the pipeline contract.

pub mod cooling;
pub mod mergers;
pub mod starformation;
