//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - system state (`System` with particles at t = 0)
//! - the reflecting box (`Enclosure`)
//! - the active force set (`ForceSet`)
//! - the energy drift monitor (`EnergyMonitor`)
//!
//! `Scenario::step` is the tick: collision-corrected end states for every
//! particle are computed against the pre-tick states and committed together.

use log::info;

use crate::configuration::config::{ParticleConfig, ScenarioConfig, StepMode};
use crate::error::{Result, SimError};
use crate::simulation::boundary::Enclosure;
use crate::simulation::energy::{total_energy, total_momentum, DriftLevel, EnergyMonitor};
use crate::simulation::engine::Engine;
use crate::simulation::forces::ForceSet;
use crate::simulation::integrator::rk4_system_step;
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, Particle, State, System};

pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: System,
    pub enclosure: Enclosure,
    pub forces: ForceSet,
    pub monitor: EnergyMonitor,
    pub step_count: usize,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        let parameters = Parameters::from(&cfg.parameters);
        parameters.validate()?;

        let engine = Engine::from(&cfg.engine);

        let e = &cfg.enclosure;
        let enclosure = Enclosure::new(e.x_min, e.x_max, e.y_min, e.y_max)?
            .with_max_depth(engine.max_collision_depth);

        // Particles: map `ParticleConfig` -> runtime `Particle`, defaults from parameters
        let particles = cfg
            .particles
            .iter()
            .enumerate()
            .map(|(i, pc)| build_particle(i, pc, &parameters, &enclosure))
            .collect::<Result<Vec<_>>>()?;

        let forces = ForceSet::from_parameters(&parameters);

        Ok(Self::assemble(engine, parameters, particles, enclosure, forces))
    }

    /// Bundle already-built parts; the initial energy is taken from `particles`
    pub fn assemble(
        engine: Engine,
        parameters: Parameters,
        particles: Vec<Particle>,
        enclosure: Enclosure,
        forces: ForceSet,
    ) -> Self {
        let initial_energy = total_energy(&forces, &particles);
        let monitor = EnergyMonitor::new(initial_energy, &parameters);

        info!(
            "scenario with {} particles, initial energy {:.6}, dt {}, {}",
            particles.len(),
            initial_energy,
            parameters.dt,
            enclosure
        );

        Self {
            engine,
            parameters,
            system: System { particles, t: 0.0 },
            enclosure,
            forces,
            monitor,
            step_count: 0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.system.particles
    }

    pub fn time(&self) -> f64 {
        self.system.t
    }

    pub fn total_energy(&self) -> f64 {
        total_energy(&self.forces, &self.system.particles)
    }

    pub fn total_momentum(&self) -> NVec2 {
        total_momentum(&self.system.particles)
    }

    pub fn relative_energy_drift(&self) -> f64 {
        self.monitor.relative_drift()
    }

    /// Sum of the per-particle collision counters
    pub fn particle_collisions(&self) -> u64 {
        self.system.particles.iter().map(|p| u64::from(p.collision_count)).sum()
    }

    /// Advance one tick of `parameters.dt` and return the drift classification
    pub fn step(&mut self) -> DriftLevel {
        let finals = match self.engine.step_mode {
            StepMode::Sequential => self.resolve_sequential(),
            StepMode::Batch => self.resolve_batch(),
        };
        self.commit(finals)
    }

    /// Every particle through the collision handler, in collection order
    fn resolve_sequential(&mut self) -> Vec<State> {
        let Scenario {
            system,
            parameters,
            enclosure,
            forces,
            ..
        } = self;

        let n = system.particles.len();
        let mut finals = Vec::with_capacity(n);
        for i in 0..n {
            finals.push(enclosure.resolve(forces, &mut system.particles, i, parameters.dt, system.t));
        }
        finals
    }

    /// One system RK4 step; only particles leaving the box go through the collision handler
    fn resolve_batch(&mut self) -> Vec<State> {
        let Scenario {
            system,
            parameters,
            enclosure,
            forces,
            ..
        } = self;

        let increments = rk4_system_step(forces, &mut system.particles, parameters.dt);

        let mut finals = Vec::with_capacity(increments.len());
        for (i, inc) in increments.iter().enumerate() {
            let candidate = system.particles[i].state() + inc;
            if enclosure.contains(NVec2::new(candidate[0], candidate[1])) {
                finals.push(candidate);
            } else {
                finals.push(enclosure.resolve(forces, &mut system.particles, i, parameters.dt, system.t));
            }
        }
        finals
    }

    /// Batch commit, bounds clamp, time advance, energy bookkeeping
    fn commit(&mut self, finals: Vec<State>) -> DriftLevel {
        for (p, s) in self.system.particles.iter_mut().zip(finals) {
            p.replace_state(s);
        }
        for p in self.system.particles.iter_mut() {
            self.enclosure.enforce_bounds(p);
        }

        self.system.t += self.parameters.dt;
        self.step_count += 1;

        let energy = self.total_energy();
        self.monitor.record(self.system.t, energy)
    }
}

fn build_particle(i: usize, pc: &ParticleConfig, params: &Parameters, enclosure: &Enclosure) -> Result<Particle> {
    if pc.x.len() != 2 || pc.v.len() != 2 {
        return Err(SimError::Configuration(format!(
            "particle {i}: position and velocity need 2 components, got {} and {}",
            pc.x.len(),
            pc.v.len()
        )));
    }
    // Crossing detection needs a start point inside the box
    if !enclosure.contains(NVec2::new(pc.x[0], pc.x[1])) {
        return Err(SimError::Configuration(format!(
            "particle {i}: initial position ({}, {}) lies outside the box",
            pc.x[0], pc.x[1]
        )));
    }
    Particle::new(
        pc.x[0],
        pc.x[1],
        pc.v[0],
        pc.v[1],
        pc.m.unwrap_or(params.mass),
        pc.q.unwrap_or(params.charge),
    )
}
