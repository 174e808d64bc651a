//! Core state types for the charged-particle simulation.
//!
//! - `Particle` packs its kinematics into one `State` vector `[x, y, vx, vy]`;
//!   position and velocity are views over that vector, never separate storage
//! - `System` holds the ordered particle collection and the current time `t`
//! - `StateGuard` snapshots every particle state and restores it on drop, so
//!   intermediate RK4 stage states never outlive the call that placed them

use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{Vector2, Vector4};

use crate::error::{Result, SimError};

pub type NVec2 = Vector2<f64>;
pub type State = Vector4<f64>;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone)]
pub struct Particle {
    id: usize, // diagnostics only
    mass: f64,
    charge: f64,
    state: State, // [x, y, vx, vy]
    initial_state: State, // state at construction
    pub collision_count: u32,
    pub last_collision_time: Option<f64>,
}

impl Particle {
    /// Create a particle at `(x, y)` moving with `(vx, vy)`
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, mass: f64, charge: f64) -> Result<Self> {
        Self::from_state(State::new(x, y, vx, vy), mass, charge)
    }

    pub fn from_state(state: State, mass: f64, charge: f64) -> Result<Self> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::Configuration(format!("particle mass must be positive, got {mass}")));
        }
        if !charge.is_finite() {
            return Err(SimError::Configuration(format!("particle charge must be finite, got {charge}")));
        }
        check_finite(&state)?;

        Ok(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            mass,
            charge,
            state,
            initial_state: state,
            collision_count: 0,
            last_collision_time: None,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn initial_state(&self) -> State {
        self.initial_state
    }

    pub fn position(&self) -> NVec2 {
        NVec2::new(self.state[0], self.state[1])
    }

    pub fn velocity(&self) -> NVec2 {
        NVec2::new(self.state[2], self.state[3])
    }

    pub fn x(&self) -> f64 {
        self.state[0]
    }

    pub fn y(&self) -> f64 {
        self.state[1]
    }

    pub fn vx(&self) -> f64 {
        self.state[2]
    }

    pub fn vy(&self) -> f64 {
        self.state[3]
    }

    /// Replace the whole state vector at once
    /// Fails with `InvalidState` unless `new_state` has exactly 4 finite components
    pub fn set_state(&mut self, new_state: &[f64]) -> Result<()> {
        if new_state.len() != 4 {
            return Err(SimError::InvalidState(format!(
                "expected 4 components, got {}",
                new_state.len()
            )));
        }
        let state = State::from_column_slice(new_state);
        check_finite(&state)?;
        self.state = state;
        Ok(())
    }

    /// Infallible replacement used by the integrator and collision handler
    pub(crate) fn replace_state(&mut self, state: State) {
        self.state = state;
    }

    pub(crate) fn replace_position(&mut self, x: f64, y: f64) {
        self.state[0] = x;
        self.state[1] = y;
    }

    /// 0.5 * m * |v|^2
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity().norm_squared()
    }

    /// -m * g * y, with `g` the signed gravitational acceleration
    pub fn gravitational_energy(&self, g: f64) -> f64 {
        -self.mass * g * self.y()
    }

    pub fn distance_to(&self, other: &Particle) -> f64 {
        self.displacement_from(other).norm()
    }

    /// Displacement pointing from `other` toward `self`
    pub fn displacement_from(&self, other: &Particle) -> NVec2 {
        self.position() - other.position()
    }
}

fn check_finite(state: &State) -> Result<()> {
    if state.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(SimError::InvalidState(format!("non-finite component in {:?}", state.as_slice())))
    }
}

#[derive(Debug, Clone)]
pub struct System {
    pub particles: Vec<Particle>, // fixed population, order fixes iteration order
    pub t: f64, // time
}

/// Scoped borrow of a particle collection for multi-stage evaluation
///
/// Every particle state is copied on construction; dropping the guard writes
/// the copies back, on normal return and on unwinding alike. Counters are not
/// part of the snapshot and survive.
pub struct StateGuard<'a> {
    particles: &'a mut [Particle],
    saved: Vec<State>,
}

impl<'a> StateGuard<'a> {
    pub fn new(particles: &'a mut [Particle]) -> Self {
        let saved = particles.iter().map(|p| p.state).collect();
        Self { particles, saved }
    }

    /// States as they were when the guard was taken
    pub fn saved(&self) -> &[State] {
        &self.saved
    }

    pub fn particles(&self) -> &[Particle] {
        &*self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut *self.particles
    }

    /// Transiently place particle `index` at `state`
    pub fn place(&mut self, index: usize, state: State) {
        self.particles[index].state = state;
    }

    /// Move every particle to `saved[i] + scale * k[i]`
    pub fn advance(&mut self, k: &[State], scale: f64) {
        for ((p, s0), ki) in self.particles.iter_mut().zip(self.saved.iter()).zip(k.iter()) {
            p.state = *s0 + *ki * scale;
        }
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        for (p, s0) in self.particles.iter_mut().zip(self.saved.iter()) {
            p.state = *s0;
        }
    }
}

/// Run `f` with particle `index` transiently at `state`, restoring everything afterwards
pub fn with_transient_state<R>(
    particles: &mut [Particle],
    index: usize,
    state: State,
    f: impl FnOnce(&mut [Particle]) -> R,
) -> R {
    let mut guard = StateGuard::new(particles);
    guard.place(index, state);
    f(guard.particles_mut())
}
