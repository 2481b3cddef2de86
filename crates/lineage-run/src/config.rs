//! Run configuration
//!
//! One TOML file describes a run: where the tree files live, which file
//! range to process, the cosmology, the output snapshots, engine tuning,
//! and the ordered physics stage list.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use lineage_foundation::{params::Units, EngineConfig, SimParams};

use crate::RunError;

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub paths: Paths,
    pub files: FileRange,
    pub cosmology: Cosmology,
    #[serde(default)]
    pub units: Units,
    pub output: Output,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub physics: Physics,
}

#[derive(Debug, Deserialize)]
pub struct Paths {
    /// Directory holding the tree files
    pub tree_dir: PathBuf,
    /// Tree file stem; files are `{tree_name}.{filenr}{tree_extension}`
    pub tree_name: String,
    #[serde(default)]
    pub tree_extension: String,
    pub output_dir: PathBuf,
    pub output_base: String,
    /// Expansion-factor list, one entry per snapshot
    pub snap_list: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct FileRange {
    pub first: i32,
    pub last: i32,
}

#[derive(Debug, Deserialize)]
pub struct Cosmology {
    pub omega: f64,
    pub omega_lambda: f64,
    pub hubble_h: f64,
    /// Particle mass, internal mass units
    pub particle_mass: f64,
}

#[derive(Debug, Deserialize)]
pub struct Output {
    /// Snapshots to write, in output order
    pub snapshots: Vec<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Physics {
    /// Stage names in execution order; empty disables the pipeline
    #[serde(default)]
    pub stages: Vec<String>,
    #[serde(default)]
    pub params: IndexMap<String, f64>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, RunError> {
        let text = fs::read_to_string(path).map_err(|e| RunError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: RunConfig = toml::from_str(&text).map_err(|e| RunError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if config.files.first < 0 || config.files.last < config.files.first {
            return Err(RunError::Config {
                path: path.to_path_buf(),
                message: format!(
                    "bad file range {}..{}",
                    config.files.first, config.files.last
                ),
            });
        }
        if config.output.snapshots.is_empty() {
            return Err(RunError::Config {
                path: path.to_path_buf(),
                message: "no output snapshots configured".to_string(),
            });
        }
        Ok(config)
    }

    pub fn sim_params(&self) -> SimParams {
        SimParams::new(
            self.cosmology.omega,
            self.cosmology.omega_lambda,
            self.cosmology.hubble_h,
            self.cosmology.particle_mass,
            self.units,
        )
    }

    /// Tree-file path for one file number
    pub fn tree_path(&self, filenr: i32) -> PathBuf {
        self.paths.tree_dir.join(format!(
            "{}.{}{}",
            self.paths.tree_name, filenr, self.paths.tree_extension
        ))
    }
}
