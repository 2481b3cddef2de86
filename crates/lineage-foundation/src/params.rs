//! Simulation parameters and engine tuning
//!
//! Plain values handed in from the outside; nothing here is derived from
//! tree data.

use serde::Deserialize;

/// Gravitational constant, cgs
pub const GRAVITY_CGS: f64 = 6.672e-8;
/// Hubble constant in units of h/sec
pub const HUBBLE_CGS: f64 = 3.2407789e-18;
/// Seconds per megayear
pub const SEC_PER_MEGAYEAR: f64 = 3.155e13;

/// Internal unit system.
///
/// Defaults correspond to Mpc/h, 10^10 Msun/h, km/s.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Units {
    #[serde(default = "Units::default_length")]
    pub unit_length_cm: f64,
    #[serde(default = "Units::default_mass")]
    pub unit_mass_g: f64,
    #[serde(default = "Units::default_velocity")]
    pub unit_velocity_cm_s: f64,
}

impl Units {
    fn default_length() -> f64 {
        3.08568e24
    }
    fn default_mass() -> f64 {
        1.989e43
    }
    fn default_velocity() -> f64 {
        100000.0
    }
}

impl Default for Units {
    fn default() -> Self {
        Self {
            unit_length_cm: Self::default_length(),
            unit_mass_g: Self::default_mass(),
            unit_velocity_cm_s: Self::default_velocity(),
        }
    }
}

/// Cosmology plus the derived internal-unit constants the tracker needs.
#[derive(Debug, Clone, Copy)]
pub struct SimParams {
    pub omega: f64,
    pub omega_lambda: f64,
    pub hubble_h: f64,
    /// Dark-matter particle mass, internal mass units
    pub part_mass: f64,
    /// Gravitational constant, internal units
    pub g: f64,
    /// Hubble constant, internal units
    pub hubble: f64,
    /// Seconds per internal time unit
    pub unit_time_s: f64,
}

impl SimParams {
    pub fn new(omega: f64, omega_lambda: f64, hubble_h: f64, part_mass: f64, units: Units) -> Self {
        let unit_time_s = units.unit_length_cm / units.unit_velocity_cm_s;
        let g = GRAVITY_CGS / units.unit_length_cm.powi(3) * units.unit_mass_g * unit_time_s.powi(2);
        let hubble = HUBBLE_CGS * unit_time_s;
        Self {
            omega,
            omega_lambda,
            hubble_h,
            part_mass,
            g,
            hubble,
            unit_time_s,
        }
    }

    /// Hubble rate squared at redshift `z`, internal units
    pub fn hubble_sq_at(&self, z: f64) -> f64 {
        let zplus1 = 1.0 + z;
        self.hubble
            * self.hubble
            * (self.omega * zplus1 * zplus1 * zplus1
                + (1.0 - self.omega - self.omega_lambda) * zplus1 * zplus1
                + self.omega_lambda)
    }
}

/// Buffer sizing and traversal limits for the tracking engine.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting workspace capacity, records
    pub initial_workspace: usize,
    /// Geometric growth factor applied when the workspace fills
    pub growth_factor: f64,
    /// Minimum records added per growth step
    pub min_growth: usize,
    /// Hard cap on workspace size; reaching it while full is fatal
    pub max_workspace: usize,
    /// Output-buffer capacity as a multiple of the tree's node count
    pub output_scale: f64,
    /// Maximum progenitor-chain depth before the traversal aborts
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_workspace: 10_000,
            growth_factor: 1.5,
            min_growth: 1_000,
            max_workspace: 2_000_000,
            output_scale: 2.0,
            max_depth: 500,
        }
    }
}
