//! Axis-aligned reflecting enclosure and exact wall-collision handling
//!
//! A collision is resolved by splitting the step at the wall:
//! 1. integrate the full step as if there were no walls,
//! 2. if the end point lies outside, locate the crossing by linear
//!    interpolation between start and end position,
//! 3. integrate up to the crossing, reflect the normal velocity component,
//! 4. integrate the remainder from the reflected state,
//! 5. clamp residual drift and, for corners, resolve again from the
//!    reflected state with a bounded depth.

use log::{debug, trace};

use crate::error::{Result, SimError};
use crate::simulation::forces::ForceSet;
use crate::simulation::integrator::rk4_particle_step;
use crate::simulation::params::{COLLISION_EPSILON, LOOKAHEAD_FRACTION, MAX_COLLISION_DEPTH};
use crate::simulation::states::{with_transient_state, NVec2, Particle, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Bottom,
    Top,
}

impl Wall {
    /// Negate the velocity component normal to this wall
    pub fn reflect(self, state: &mut State) {
        match self {
            Wall::Left | Wall::Right => state[2] = -state[2],
            Wall::Bottom | Wall::Top => state[3] = -state[3],
        }
    }
}

/// First wall hit along a straight segment, at `fraction` of the segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub fraction: f64,
    pub wall: Wall,
}

#[derive(Debug, Clone)]
pub struct Enclosure {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    max_depth: usize, // bound on nested corner corrections
    total_collisions: u64, // diagnostics
}

impl Enclosure {
    /// Fails unless `x_min < x_max` and `y_min < y_max`
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        let finite = [x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite());
        if !finite || x_max - x_min <= 0.0 || y_max - y_min <= 0.0 {
            return Err(SimError::Configuration(format!(
                "box dimensions must be positive: [{x_min}, {x_max}] x [{y_min}, {y_max}]"
            )));
        }

        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
            max_depth: MAX_COLLISION_DEPTH,
            total_collisions: 0,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.x_min, self.x_max, self.y_min, self.y_max)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn total_collisions(&self) -> u64 {
        self.total_collisions
    }

    /// Bounds inclusive
    pub fn contains(&self, pos: NVec2) -> bool {
        self.x_min <= pos.x && pos.x <= self.x_max && self.y_min <= pos.y && pos.y <= self.y_max
    }

    /// Clamp the position part of `state` onto the box
    pub fn clamp(&self, state: &mut State) {
        state[0] = state[0].clamp(self.x_min, self.x_max);
        state[1] = state[1].clamp(self.y_min, self.y_max);
    }

    /// Final safety net applied by the driver after committing a tick
    pub fn enforce_bounds(&self, particle: &mut Particle) {
        let x = particle.x().clamp(self.x_min, self.x_max);
        let y = particle.y().clamp(self.y_min, self.y_max);
        particle.replace_position(x, y);
    }

    /// Smallest fraction `t` in `[0, 1)` at which the segment `start -> end` crosses a wall
    ///
    /// Left is checked before right and bottom before top (if / else-if);
    /// across the two axes the strictly smaller fraction wins.
    pub fn first_crossing(&self, start: NVec2, end: NVec2) -> Option<Crossing> {
        let (x0, y0) = (start.x, start.y);
        let (x1, y1) = (end.x, end.y);

        let mut best: Option<Crossing> = None;
        let mut consider = |wall: Wall, bound: f64, c0: f64, c1: f64| {
            if (c1 - c0).abs() <= COLLISION_EPSILON {
                return;
            }
            let t = (bound - c0) / (c1 - c0);
            let limit = best.map_or(1.0, |b| b.fraction);
            if (0.0..limit).contains(&t) {
                best = Some(Crossing { fraction: t, wall });
            }
        };

        if x1 < self.x_min && x0 >= self.x_min {
            consider(Wall::Left, self.x_min, x0, x1);
        } else if x1 > self.x_max && x0 <= self.x_max {
            consider(Wall::Right, self.x_max, x0, x1);
        }

        if y1 < self.y_min && y0 >= self.y_min {
            consider(Wall::Bottom, self.y_min, y0, y1);
        } else if y1 > self.y_max && y0 <= self.y_max {
            consider(Wall::Top, self.y_max, y0, y1);
        }

        best
    }

    /// Linear look-ahead: would `state` leave the box within `horizon`?
    pub fn would_exit(&self, state: &State, horizon: f64) -> bool {
        let next = NVec2::new(state[0] + state[2] * horizon, state[1] + state[3] * horizon);
        !self.contains(next)
    }

    /// Collision-corrected end-of-step state for particle `index`
    ///
    /// `t` is the time at the start of the step and only feeds
    /// `last_collision_time`. Particle states are left as they were;
    /// collision counters on the particle and the enclosure are updated.
    pub fn resolve(&mut self, forces: &ForceSet, particles: &mut [Particle], index: usize, dt: f64, t: f64) -> State {
        self.resolve_at_depth(forces, particles, index, dt, t, 0)
    }

    fn resolve_at_depth(
        &mut self,
        forces: &ForceSet,
        particles: &mut [Particle],
        index: usize,
        dt: f64,
        t: f64,
        depth: usize,
    ) -> State {
        let start = particles[index].state();

        // Full step as if there were no walls
        let candidate = start + rk4_particle_step(forces, particles, index, dt);
        if self.contains(position(&candidate)) {
            return candidate;
        }

        // Where along the step does the straight segment leave the box
        let crossing = self.first_crossing(position(&start), position(&candidate));
        let fraction = crossing.map_or(1.0, |c| c.fraction);

        // Up to the wall
        let dt_before = fraction * dt;
        let at_wall = if dt_before > COLLISION_EPSILON {
            start + rk4_particle_step(forces, particles, index, dt_before)
        } else {
            start
        };

        let mut reflected = at_wall;
        if let Some(Crossing { wall, .. }) = crossing {
            wall.reflect(&mut reflected);

            // A zero normal velocity (resting on or pushed against the wall) is no collision
            if reflected != at_wall {
                self.total_collisions += 1;

                let p = &mut particles[index];
                p.collision_count += 1;
                p.last_collision_time = Some(t + dt_before);
                trace!("particle {} hit {:?} wall at t={:.6}", p.id(), wall, t + dt_before);
            }
        }

        // Remainder of the step from the reflected state
        let dt_after = dt - dt_before;
        let mut end = if dt_after > COLLISION_EPSILON {
            let step = with_transient_state(particles, index, reflected, |ps| {
                rk4_particle_step(forces, ps, index, dt_after)
            });
            reflected + step
        } else {
            reflected
        };

        if !self.contains(position(&end)) {
            self.clamp(&mut end);
        }

        // Corner or secondary collision. Recursing from an unchanged start state
        // would repeat this exact call, so the clamped state is final then.
        let exits_again = !self.contains(position(&end)) || self.would_exit(&end, dt * LOOKAHEAD_FRACTION);
        let stalled = dt_before <= COLLISION_EPSILON && reflected == start;
        if exits_again && dt_after > COLLISION_EPSILON && !stalled {
            if depth < self.max_depth {
                end = with_transient_state(particles, index, reflected, |ps| {
                    self.resolve_at_depth(forces, ps, index, dt_after, t + dt_before, depth + 1)
                });
            } else {
                debug!(
                    "particle {}: collision depth {} reached, keeping clamped state",
                    particles[index].id(),
                    depth
                );
            }
        }

        end
    }

    /// Mirror-image fallback: reflect position and normal velocity across
    /// any violated wall; one collision is counted per call that changed something
    pub fn reflect_simple(&mut self, particle: &mut Particle, t: f64) -> bool {
        let mut s = particle.state();
        let mut hit = false;

        if s[0] < self.x_min {
            s[0] = 2.0 * self.x_min - s[0];
            s[2] = -s[2];
            hit = true;
        } else if s[0] > self.x_max {
            s[0] = 2.0 * self.x_max - s[0];
            s[2] = -s[2];
            hit = true;
        }

        if s[1] < self.y_min {
            s[1] = 2.0 * self.y_min - s[1];
            s[3] = -s[3];
            hit = true;
        } else if s[1] > self.y_max {
            s[1] = 2.0 * self.y_max - s[1];
            s[3] = -s[3];
            hit = true;
        }

        if hit {
            particle.replace_state(s);
            particle.collision_count += 1;
            particle.last_collision_time = Some(t);
            self.total_collisions += 1;
        }
        hit
    }
}

fn position(state: &State) -> NVec2 {
    NVec2::new(state[0], state[1])
}

impl std::fmt::Display for Enclosure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Box: [{}, {}] x [{}, {}], collisions: {}",
            self.x_min, self.x_max, self.y_min, self.y_max, self.total_collisions
        )
    }
}
