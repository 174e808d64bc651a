use std::time::Instant;

use crate::simulation::boundary::Enclosure;
use crate::simulation::engine::Engine;
use crate::simulation::forces::ForceSet;
use crate::simulation::params::Parameters;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::Particle;

/// Helper to build `n` particles spread deterministically over a 100 x 100 box
fn make_particles(n: usize, params: &Parameters) -> Vec<Particle> {
    (0..n)
        .filter_map(|i| {
            let i_f = i as f64;
            // deterministic positions, no rand needed
            let x = 50.0 + (i_f * 0.37).sin() * 45.0;
            let y = 50.0 + (i_f * 0.13).cos() * 45.0;
            let vx = (i_f * 0.07).sin() * 10.0;
            let vy = (i_f * 0.11).cos() * 10.0;
            Particle::new(x, y, vx, vy, params.mass, params.charge).ok()
        })
        .collect()
}

/// Time the O(n^2) pairwise force evaluation
pub fn bench_forces() {
    let ns = [8, 16, 32, 64, 128, 256, 512, 1024];
    let params = Parameters::default();
    let forces = ForceSet::from_parameters(&params);

    for n in ns {
        let particles = make_particles(n, &params);
        let reps = (4096 / n).max(1);

        // Warm up
        let _ = forces.system_forces(&particles);

        let t0 = Instant::now();
        for _ in 0..reps {
            let _ = forces.system_forces(&particles);
        }
        let per_eval = t0.elapsed().as_secs_f64() / reps as f64;

        println!("N = {n:5}, forces = {:10.6} ms", per_eval * 1000.0);
    }
}

/// Time one collision-corrected tick (sequential mode) for growing n
pub fn bench_step() {
    let ns = [2, 7, 16, 32, 64, 128];
    let steps = 10;

    for n in ns {
        let params = Parameters::default();
        let Ok(enclosure) = Enclosure::new(0.0, 100.0, 0.0, 100.0) else {
            return;
        };
        let particles = make_particles(n, &params);
        let forces = ForceSet::from_parameters(&params);
        let mut scenario = Scenario::assemble(Engine::default(), params, particles, enclosure, forces);

        // Warm-up
        scenario.step();

        let t0 = Instant::now();
        for _ in 0..steps {
            scenario.step();
        }
        let per_step = t0.elapsed().as_secs_f64() / steps as f64;

        println!(
            "N = {n:5}, tick = {:10.6} ms, collisions = {}",
            per_step * 1000.0,
            scenario.enclosure.total_collisions()
        );
    }
}
