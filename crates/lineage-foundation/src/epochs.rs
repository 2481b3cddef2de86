//! Cosmological epoch table
//!
//! Maps snapshot numbers to redshifts and lookback times. Built once per
//! run from the simulation's expansion-factor list; the engine only ever
//! reads it.

use crate::params::SimParams;

/// Per-snapshot redshifts and lookback times, internal time units.
#[derive(Debug, Clone)]
pub struct EpochTable {
    redshift: Vec<f64>,
    lookback: Vec<f64>,
}

impl EpochTable {
    /// Build the table from the expansion factors of the simulation
    /// snapshots, in snapshot order.
    ///
    /// Lookback times come from integrating `da / sqrt(Omega/a +
    /// (1-Omega-OmegaLambda) + OmegaLambda a^2)` between the snapshot's
    /// expansion factor and 1, divided by the Hubble constant.
    pub fn from_expansion_factors(factors: &[f64], params: &SimParams) -> Self {
        let redshift: Vec<f64> = factors.iter().map(|a| 1.0 / a - 1.0).collect();
        let lookback = redshift
            .iter()
            .map(|&z| time_to_present(z, params))
            .collect();
        Self { redshift, lookback }
    }

    pub fn len(&self) -> usize {
        self.redshift.len()
    }

    pub fn is_empty(&self) -> bool {
        self.redshift.is_empty()
    }

    pub fn redshift(&self, snap: i32) -> Option<f64> {
        usize::try_from(snap).ok().and_then(|s| self.redshift.get(s)).copied()
    }

    /// Lookback time to the given snapshot, internal time units
    pub fn lookback(&self, snap: i32) -> Option<f64> {
        usize::try_from(snap).ok().and_then(|s| self.lookback.get(s)).copied()
    }
}

/// Lookback time from z=0 to redshift `z`, internal time units.
fn time_to_present(z: f64, params: &SimParams) -> f64 {
    let lower = 1.0 / (1.0 + z);
    let integrand = |a: f64| {
        1.0 / (params.omega / a
            + (1.0 - params.omega - params.omega_lambda)
            + params.omega_lambda * a * a)
            .sqrt()
    };
    simpson(integrand, lower, 1.0, 1000) / params.hubble
}

/// Composite Simpson's rule with `n` subintervals (rounded up to even).
fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, n: usize) -> f64 {
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + h * i as f64;
        sum += if i % 2 == 0 { 2.0 * f(x) } else { 4.0 * f(x) };
    }
    sum * h / 3.0
}
