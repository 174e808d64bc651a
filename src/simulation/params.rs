//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - integration step size and end time,
//! - default particle mass and charge,
//! - gravitational acceleration and soft-core radius,
//! - energy drift thresholds used by the monitor
//!
//! The thresholds below are shared by the force model, the integrator and
//! the collision handler.

use crate::error::{Result, SimError};

/// Numerical equality threshold (overlap, zero mass, zero reference energy)
pub const EPSILON: f64 = 1e-10;

/// Threshold for crossing tests and collision sub-steps
pub const COLLISION_EPSILON: f64 = 1e-10;

/// Time steps below this are treated as zero
pub const DT_EPSILON: f64 = 1e-15;

/// Fraction of `dt` used for the linear look-ahead after a reflection
pub const LOOKAHEAD_FRACTION: f64 = 0.1;

/// Default bound on nested corner-collision corrections
pub const MAX_COLLISION_DEPTH: usize = 10;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub t_end: f64, // total simulated time
    pub dt: f64, // fixed step size
    pub mass: f64, // default particle mass
    pub charge: f64, // default particle charge
    pub gravity: f64, // signed gravitational acceleration along y
    pub core_radius: f64, // soft-core radius of the Coulomb law
    pub energy_tolerance: f64, // target relative energy drift
    pub drift_warning: f64, // relative drift that triggers a warning
    pub drift_fatal: f64, // relative drift reported as an error (integration continues)
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            t_end: 10.0,
            dt: 0.001,
            mass: 1.0,
            charge: 50.0,
            gravity: -10.0,
            core_radius: 1e-6,
            energy_tolerance: 1e-6,
            drift_warning: 0.01,
            drift_fatal: 0.1,
        }
    }
}

impl Parameters {
    /// Reject values no run can start from
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt.abs() < EPSILON {
            return Err(SimError::Configuration(format!(
                "time step must be finite and non-zero, got {}",
                self.dt
            )));
        }
        if !self.t_end.is_finite() {
            return Err(SimError::Configuration(format!("t_end must be finite, got {}", self.t_end)));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimError::Configuration(format!("default mass must be positive, got {}", self.mass)));
        }
        if !self.charge.is_finite() || !self.gravity.is_finite() {
            return Err(SimError::Configuration("charge and gravity must be finite".into()));
        }
        if !(self.core_radius.is_finite() && self.core_radius > 0.0) {
            return Err(SimError::Configuration(format!(
                "core radius must be positive, got {}",
                self.core_radius
            )));
        }
        Ok(())
    }

    /// Number of fixed steps covering `t_end`
    pub fn step_count(&self) -> usize {
        (self.t_end / self.dt).abs() as usize
    }
}
