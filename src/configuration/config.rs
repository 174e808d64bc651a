//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – stepping mode, collision recursion bound, progress interval
//! - [`ParametersConfig`] – numerical parameters and physical constants
//! - [`EnclosureConfig`]  – bounds of the reflecting box
//! - [`ParticleConfig`]   – initial state for each particle
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! Every field except the particle positions and velocities is optional:
//!
//! ```yaml
//! engine:
//!   step_mode: "sequential"   # or "batch"
//!   max_collision_depth: 10
//!   progress_interval: 1000
//!
//! parameters:
//!   t_end: 10.0               # total simulation time
//!   dt: 0.001                 # fixed step size
//!   mass: 1.0                 # default particle mass
//!   charge: 50.0              # default particle charge
//!   gravity: -10.0            # signed acceleration along y
//!   core_radius: 1.0e-6       # Coulomb soft-core radius
//!   energy_tolerance: 1.0e-6
//!   drift_warning: 0.01
//!   drift_fatal: 0.1
//!
//! enclosure:
//!   x_min: 0.0
//!   x_max: 100.0
//!   y_min: 0.0
//!   y_max: 100.0
//!
//! particles:
//!   - x: [ 1.0, 45.0 ]
//!     v: [ 10.0, 0.0 ]
//!   - x: [ 99.0, 55.0 ]
//!     v: [ -10.0, 0.0 ]
//!     q: -50.0                # per-particle override
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::simulation::params::{Parameters, MAX_COLLISION_DEPTH};

/// How one tick is assembled
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
    #[serde(rename = "sequential")] // every particle through the collision handler, in order
    #[default]
    Sequential,

    #[serde(rename = "batch")] // one system RK4 step, collision handler only for particles that leave the box
    Batch,
}

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub step_mode: StepMode, // how a tick is assembled
    pub max_collision_depth: usize, // bound on nested corner corrections
    pub progress_interval: usize, // steps between progress log lines
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_mode: StepMode::Sequential,
            max_collision_depth: MAX_COLLISION_DEPTH,
            progress_interval: 1000,
        }
    }
}

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub t_end: f64,            // time end
    pub dt: f64,               // time step size
    pub mass: f64,             // default mass
    pub charge: f64,           // default charge
    pub gravity: f64,          // gravitational acceleration (negative = down)
    pub core_radius: f64,      // soft-core radius, bounds the Coulomb force at small separations
    pub energy_tolerance: f64, // target relative energy drift
    pub drift_warning: f64,    // warn above this relative drift
    pub drift_fatal: f64,      // report as error above this relative drift
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let p = Parameters::default();
        Self {
            t_end: p.t_end,
            dt: p.dt,
            mass: p.mass,
            charge: p.charge,
            gravity: p.gravity,
            core_radius: p.core_radius,
            energy_tolerance: p.energy_tolerance,
            drift_warning: p.drift_warning,
            drift_fatal: p.drift_fatal,
        }
    }
}

impl From<&ParametersConfig> for Parameters {
    fn from(c: &ParametersConfig) -> Self {
        Parameters {
            t_end: c.t_end,
            dt: c.dt,
            mass: c.mass,
            charge: c.charge,
            gravity: c.gravity,
            core_radius: c.core_radius,
            energy_tolerance: c.energy_tolerance,
            drift_warning: c.drift_warning,
            drift_fatal: c.drift_fatal,
        }
    }
}

/// Bounds of the reflecting box
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EnclosureConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for EnclosureConfig {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 100.0,
            y_min: 0.0,
            y_max: 100.0,
        }
    }
}

/// Configuration for a single particle's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub x: Vec<f64>,       // initial position [x, y]
    pub v: Vec<f64>,       // initial velocity [vx, vy]
    pub m: Option<f64>,    // mass, defaults to `parameters.mass`
    pub q: Option<f64>,    // charge, defaults to `parameters.charge`
}

impl ParticleConfig {
    pub fn at(x: f64, y: f64, vx: f64, vy: f64) -> Self {
        Self {
            x: vec![x, y],
            v: vec![vx, vy],
            m: None,
            q: None,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig, // stepping configuration
    #[serde(default)]
    pub parameters: ParametersConfig, // global numerical and physical parameters
    #[serde(default)]
    pub enclosure: EnclosureConfig, // box bounds
    pub particles: Vec<ParticleConfig>, // initial state of every particle
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Default engine, parameters and box with the given initial states
    pub fn with_states(states: &[[f64; 4]]) -> Self {
        Self {
            engine: EngineConfig::default(),
            parameters: ParametersConfig::default(),
            enclosure: EnclosureConfig::default(),
            particles: states
                .iter()
                .map(|s| ParticleConfig::at(s[0], s[1], s[2], s[3]))
                .collect(),
        }
    }

    /// The seven-particle reference configuration
    pub fn reference() -> Self {
        Self::with_states(&REFERENCE_STATES)
    }
}

/// Initial `[x, y, vx, vy]` of the reference configuration
pub const REFERENCE_STATES: [[f64; 4]; 7] = [
    [1.0, 45.0, 10.0, 0.0],     // moving right from the left wall
    [99.0, 55.0, -10.0, 0.0],   // moving left from the right wall
    [10.0, 50.0, 15.0, -15.0],
    [20.0, 30.0, -15.0, -15.0],
    [80.0, 70.0, 15.0, 15.0],
    [80.0, 60.0, 15.0, 15.0],   // same velocity as the one above, lower
    [80.0, 50.0, 15.0, 15.0],
];
