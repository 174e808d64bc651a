//! Conserved-quantity diagnostics
//!
//! Total energy is kinetic + gravitational + Coulomb potential. The monitor
//! tracks drift against the initial energy and reports it through `log`;
//! drift never stops integration.

use log::{error, warn};

use crate::simulation::forces::ForceSet;
use crate::simulation::params::{Parameters, EPSILON};
use crate::simulation::states::{NVec2, Particle};

/// Kinetic energy plus every potential in `forces`
pub fn total_energy(forces: &ForceSet, particles: &[Particle]) -> f64 {
    let kinetic: f64 = particles.iter().map(Particle::kinetic_energy).sum();
    kinetic + forces.potential_energy(particles)
}

/// Σ m v
pub fn total_momentum(particles: &[Particle]) -> NVec2 {
    particles.iter().fold(NVec2::zeros(), |acc, p| acc + p.mass() * p.velocity())
}

/// |E - E0| / |E0|, or |E - E0| when E0 is (numerically) zero
pub fn relative_drift(initial: f64, current: f64) -> f64 {
    signed_relative_drift(initial, current).abs()
}

/// (E - E0) / |E0|, or E - E0 when E0 is (numerically) zero
pub fn signed_relative_drift(initial: f64, current: f64) -> f64 {
    let diff = current - initial;
    if initial.abs() > EPSILON {
        diff / initial.abs()
    } else {
        diff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DriftLevel {
    Within,
    AboveTolerance,
    Warning,
    Fatal,
}

#[derive(Debug, Clone)]
pub struct EnergyMonitor {
    initial: f64,
    history: Vec<(f64, f64)>, // (t, E)
    tolerance: f64,
    warning: f64,
    fatal: f64,
}

impl EnergyMonitor {
    pub fn new(initial: f64, params: &Parameters) -> Self {
        Self {
            initial,
            history: vec![(0.0, initial)],
            tolerance: params.energy_tolerance,
            warning: params.drift_warning,
            fatal: params.drift_fatal,
        }
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn latest(&self) -> f64 {
        self.history.last().map_or(self.initial, |&(_, e)| e)
    }

    pub fn history(&self) -> &[(f64, f64)] {
        &self.history
    }

    pub fn relative_drift(&self) -> f64 {
        relative_drift(self.initial, self.latest())
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn classify(&self, drift: f64) -> DriftLevel {
        if drift > self.fatal {
            DriftLevel::Fatal
        } else if drift > self.warning {
            DriftLevel::Warning
        } else if drift > self.tolerance {
            DriftLevel::AboveTolerance
        } else {
            DriftLevel::Within
        }
    }

    /// Store `(t, energy)` and report excessive drift
    pub fn record(&mut self, t: f64, energy: f64) -> DriftLevel {
        self.history.push((t, energy));

        let drift = self.relative_drift();
        let level = self.classify(drift);
        match level {
            DriftLevel::Fatal => error!(
                "excessive energy drift {:.2}% at t={:.3}, check time step or collision handling",
                drift * 100.0,
                t
            ),
            DriftLevel::Warning => warn!("energy drift {:.2}% at t={:.3}", drift * 100.0, t),
            _ => {}
        }
        level
    }
}
