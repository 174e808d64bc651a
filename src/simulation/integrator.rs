//! Fixed-step RK4 integrator for the coupled particle system
//!
//! The state derivative of particle `i` is `[vx, vy, ax, ay]`, with the
//! accelerations coming from the whole particle collection, so every stage
//! evaluates the force law against all particles at once.
//!
//! Stage states are placed on the particles through a `StateGuard`; every
//! function here leaves the particles exactly as it found them and returns
//! increments, never applying them.

use crate::simulation::forces::ForceSet;
use crate::simulation::params::{DT_EPSILON, EPSILON};
use crate::simulation::states::{Particle, State, StateGuard};

/// d/dt [x, y, vx, vy] = [vx, vy, ax, ay] for every particle
pub fn derivatives(forces: &ForceSet, particles: &[Particle]) -> Vec<State> {
    let accels = forces.accelerations(particles);

    particles
        .iter()
        .zip(accels.iter())
        .map(|(p, a)| State::new(p.vx(), p.vy(), a.x, a.y))
        .collect()
}

/// The four RK4 slopes (already scaled by `dt`) for every particle
///
/// k1 at the current states, k2 at `s + k1/2`, k3 at `s + k2/2`, k4 at
/// `s + k3`, each stage advancing all particles simultaneously.
fn rk4_slopes(forces: &ForceSet, particles: &mut [Particle], dt: f64) -> [Vec<State>; 4] {
    let mut guard = StateGuard::new(particles);
    let scaled = |d: Vec<State>| -> Vec<State> { d.into_iter().map(|s| s * dt).collect() };

    let k1 = scaled(derivatives(forces, guard.particles()));

    guard.advance(&k1, 0.5);
    let k2 = scaled(derivatives(forces, guard.particles()));

    guard.advance(&k2, 0.5);
    let k3 = scaled(derivatives(forces, guard.particles()));

    guard.advance(&k3, 1.0);
    let k4 = scaled(derivatives(forces, guard.particles()));

    [k1, k2, k3, k4]
    // guard drops here and restores the pre-call states
}

fn combine(k: &[Vec<State>; 4], i: usize) -> State {
    (k[0][i] + 2.0 * k[1][i] + 2.0 * k[2][i] + k[3][i]) / 6.0
}

/// One classical RK4 step for the whole system
/// Returns `dt/6 * (k1 + 2k2 + 2k3 + k4)` per particle; `dt = 0` returns zeros
/// without evaluating any derivative
pub fn rk4_system_step(forces: &ForceSet, particles: &mut [Particle], dt: f64) -> Vec<State> {
    let n = particles.len();
    if n == 0 {
        return Vec::new();
    }
    if dt.abs() < DT_EPSILON {
        return vec![State::zeros(); n];
    }

    let k = rk4_slopes(forces, particles, dt);
    (0..n).map(|i| combine(&k, i)).collect()
}

/// RK4 increment for particle `index` alone
///
/// The other particles are carried through the intermediate stages along
/// their own slopes, so the target sees its peers where they would be at
/// each stage. Nothing is committed: peers whose increments were finalized
/// earlier in the tick are untouched.
pub fn rk4_particle_step(forces: &ForceSet, particles: &mut [Particle], index: usize, dt: f64) -> State {
    if dt.abs() < DT_EPSILON {
        return State::zeros();
    }

    let k = rk4_slopes(forces, particles, dt);
    combine(&k, index)
}

/// Collision-free RK4 driver with step and time bookkeeping
#[derive(Debug, Clone)]
pub struct Rk4Integrator {
    pub dt: f64,
    pub step_count: usize,
    pub elapsed: f64,
}

impl Rk4Integrator {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            step_count: 0,
            elapsed: 0.0,
        }
    }

    /// Increments for one step of size `self.dt`, counters advanced
    pub fn step(&mut self, forces: &ForceSet, particles: &mut [Particle]) -> Vec<State> {
        let increments = rk4_system_step(forces, particles, self.dt);
        self.step_count += 1;
        self.elapsed += self.dt;
        increments
    }

    /// Apply system steps until `target` is reached, the last step shortened to land on it
    /// `callback(t, particles)` runs after each applied step
    pub fn integrate_until<F>(&mut self, forces: &ForceSet, particles: &mut [Particle], target: f64, mut callback: F)
    where
        F: FnMut(f64, &[Particle]),
    {
        if self.dt.abs() < DT_EPSILON {
            return;
        }

        while (target - self.elapsed).abs() > EPSILON {
            let remaining = target - self.elapsed;
            let h = self.dt.abs().min(remaining.abs()).copysign(remaining);

            let increments = rk4_system_step(forces, particles, h);
            for (p, inc) in particles.iter_mut().zip(increments.iter()) {
                let next = p.state() + inc;
                p.replace_state(next);
            }

            self.elapsed += h;
            self.step_count += 1;
            callback(self.elapsed, particles);
        }
    }

    pub fn reset(&mut self) {
        self.step_count = 0;
        self.elapsed = 0.0;
    }
}
