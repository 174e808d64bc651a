//! Force contributors for the charged-particle engine
//!
//! Defines the `Force` trait and the two terms of the model: uniform
//! gravity along y and the soft-core regularized Coulomb interaction.
//! `ForceSet` sums its terms in registration order, which keeps the
//! pairwise summation order (and therefore the result) bit-for-bit stable.

use crate::simulation::params::{Parameters, EPSILON};
use crate::simulation::states::{NVec2, Particle};

/// Collection of force terms (gravity, Coulomb, ...)
/// Each term implements [`Force`] and their contributions are summed
/// into a single net force per particle
pub struct ForceSet {
    terms: Vec<Box<dyn Force + Send + Sync>>,
}

impl ForceSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Add a force term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Force + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Gravity followed by soft-core Coulomb, as configured by `params`
    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new()
            .with(UniformGravity { g: params.gravity })
            .with(SoftCoulomb { core_radius: params.core_radius })
    }

    /// Compute net forces for all particles
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_forces(&self, particles: &[Particle], out: &mut [NVec2]) {
        // Zero buffer
        for f in out.iter_mut() {
            *f = NVec2::zeros();
        }
        for term in &self.terms {
            term.accumulate(particles, out);
        }
    }

    /// Net force per particle with exact action = reaction for every pair
    pub fn system_forces(&self, particles: &[Particle]) -> Vec<NVec2> {
        let mut out = vec![NVec2::zeros(); particles.len()];
        self.accumulate_forces(particles, &mut out);
        out
    }

    /// a = F / m per particle; a (numerically) massless particle gets zero
    pub fn accelerations(&self, particles: &[Particle]) -> Vec<NVec2> {
        let mut out = self.system_forces(particles);
        for (a, p) in out.iter_mut().zip(particles.iter()) {
            if p.mass().abs() < EPSILON {
                *a = NVec2::zeros();
            } else {
                *a /= p.mass();
            }
        }
        out
    }

    /// Potential energy summed over all terms
    pub fn potential_energy(&self, particles: &[Particle]) -> f64 {
        self.terms.iter().map(|t| t.potential_energy(particles)).sum()
    }
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::from_parameters(&Parameters::default())
    }
}

/// Trait for force sources operating on the whole particle collection
/// Implementations add their contribution into `out[i]` for each particle
pub trait Force {
    fn accumulate(&self, particles: &[Particle], out: &mut [NVec2]);

    /// Potential whose negative gradient is this force
    fn potential_energy(&self, particles: &[Particle]) -> f64;
}

/// Uniform gravitational field along y
/// `g` is signed, negative pulls toward `y_min`
pub struct UniformGravity {
    pub g: f64,
}

impl Force for UniformGravity {
    fn accumulate(&self, particles: &[Particle], out: &mut [NVec2]) {
        for (f, p) in out.iter_mut().zip(particles.iter()) {
            *f += gravity_force(p, self.g);
        }
    }

    fn potential_energy(&self, particles: &[Particle]) -> f64 {
        particles.iter().map(|p| p.gravitational_energy(self.g)).sum()
    }
}

/// Coulomb interaction with soft-core regularization below `core_radius`
pub struct SoftCoulomb {
    pub core_radius: f64,
}

impl Force for SoftCoulomb {
    fn accumulate(&self, particles: &[Particle], out: &mut [NVec2]) {
        let n = particles.len();

        // Each unordered pair (i, j) with i < j exactly once
        for i in 0..n {
            for j in (i + 1)..n {
                // Force on i due to j, applied with opposite sign to j
                let f = coulomb_pair(&particles[i], &particles[j], self.core_radius);
                out[i] += f;
                out[j] -= f;
            }
        }
    }

    fn potential_energy(&self, particles: &[Particle]) -> f64 {
        coulomb_potential_energy(particles, self.core_radius)
    }
}

/// (0, m * g)
pub fn gravity_force(p: &Particle, g: f64) -> NVec2 {
    NVec2::new(0.0, p.mass() * g)
}

/// Coulomb force on `a` due to `b`
///
/// With `d = a.position - b.position` and `r = |d|`:
/// - `r < EPSILON`: exact overlap, no direction, zero force
/// - `r < core_radius`: magnitude `qa * qb * r / (r^2 + core^2)^1.5`
/// - otherwise: magnitude `qa * qb / r^2`
///
/// The direction is always `d / r`, so like charges repel.
pub fn coulomb_pair(a: &Particle, b: &Particle, core_radius: f64) -> NVec2 {
    let d = a.displacement_from(b);
    let r = d.norm();

    if r < EPSILON {
        return NVec2::zeros();
    }

    let qq = a.charge() * b.charge();
    let magnitude = if r < core_radius {
        let denom = (r * r + core_radius * core_radius).powf(1.5);
        qq * r / denom
    } else {
        qq / (r * r)
    };

    magnitude * (d / r)
}

/// Gravity plus the sum of `coulomb_pair(i, j)` over all `j != i`
/// Evaluates every pair from i's side, unlike [`ForceSet::system_forces`]
pub fn net_force_on(index: usize, particles: &[Particle], g: f64, core_radius: f64) -> NVec2 {
    let pi = &particles[index];
    let mut f = gravity_force(pi, g);
    for (j, pj) in particles.iter().enumerate() {
        if j == index {
            continue;
        }
        f += coulomb_pair(pi, pj, core_radius);
    }
    f
}

/// Sum over i < j of `qi * qj / r_ij`, with `sqrt(r^2 + core^2)` replacing
/// `r` inside the core so that the potential matches the force law
pub fn coulomb_potential_energy(particles: &[Particle], core_radius: f64) -> f64 {
    let n = particles.len();
    let mut total = 0.0;

    for i in 0..n {
        for j in (i + 1)..n {
            let r = particles[i].distance_to(&particles[j]);
            let qq = particles[i].charge() * particles[j].charge();

            let r_eff = if r < core_radius {
                (r * r + core_radius * core_radius).sqrt()
            } else {
                r
            };
            total += qq / r_eff;
        }
    }
    total
}
