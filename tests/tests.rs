use approx::{assert_abs_diff_eq, assert_relative_eq};

use chargesim::simulation::forces::{net_force_on, SoftCoulomb, UniformGravity};
use chargesim::simulation::integrator::derivatives;
use chargesim::{
    coulomb_pair, coulomb_potential_energy, gravity_force, rk4_particle_step, rk4_system_step, Enclosure, ForceSet,
    NVec2, Particle, Rk4Integrator, SimError, State, StateGuard, Wall,
};

const Q: f64 = 50.0;
const CORE: f64 = 1e-6;
const G: f64 = -10.0;

/// Unit-mass particle carrying the default charge
pub fn charged(x: f64, y: f64, vx: f64, vy: f64) -> Particle {
    Particle::new(x, y, vx, vy, 1.0, Q).unwrap()
}

/// Unit-mass particle without charge
pub fn neutral(x: f64, y: f64, vx: f64, vy: f64) -> Particle {
    Particle::new(x, y, vx, vy, 1.0, 0.0).unwrap()
}

/// Gravity + soft-core Coulomb with the default constants
pub fn default_forces() -> ForceSet {
    forces_with_gravity(G)
}

pub fn forces_with_gravity(g: f64) -> ForceSet {
    ForceSet::new()
        .with(UniformGravity { g })
        .with(SoftCoulomb { core_radius: CORE })
}

/// 100 x 100 box
pub fn default_box() -> Enclosure {
    Enclosure::new(0.0, 100.0, 0.0, 100.0).unwrap()
}

fn states(particles: &[Particle]) -> Vec<State> {
    particles.iter().map(|p| p.state()).collect()
}

// ==================================================================================
// Particle tests
// ==================================================================================

#[test]
fn particle_accessors_view_the_state_vector() {
    let p = charged(1.0, 2.0, 3.0, 4.0);

    assert_eq!(p.state(), State::new(1.0, 2.0, 3.0, 4.0));
    assert_eq!(p.position(), NVec2::new(1.0, 2.0));
    assert_eq!(p.velocity(), NVec2::new(3.0, 4.0));
    assert_eq!((p.x(), p.y(), p.vx(), p.vy()), (1.0, 2.0, 3.0, 4.0));
    assert_eq!(p.initial_state(), p.state());
    assert_eq!(p.collision_count, 0);
    assert!(p.last_collision_time.is_none());
}

#[test]
fn set_state_rejects_wrong_dimension() {
    let mut p = charged(1.0, 2.0, 3.0, 4.0);

    for bad in [&[1.0, 2.0, 3.0][..], &[1.0, 2.0, 3.0, 4.0, 5.0][..], &[][..]] {
        let err = p.set_state(bad).unwrap_err();
        assert!(matches!(err, SimError::InvalidState(_)), "unexpected error {err:?}");
    }
    // Untouched after failed updates
    assert_eq!(p.state(), State::new(1.0, 2.0, 3.0, 4.0));
}

#[test]
fn set_state_rejects_non_finite_components() {
    let mut p = charged(1.0, 2.0, 3.0, 4.0);
    assert!(matches!(p.set_state(&[f64::NAN, 0.0, 0.0, 0.0]), Err(SimError::InvalidState(_))));
    assert!(matches!(p.set_state(&[0.0, 0.0, f64::INFINITY, 0.0]), Err(SimError::InvalidState(_))));
}

#[test]
fn set_state_keeps_initial_state() {
    let mut p = charged(1.0, 2.0, 3.0, 4.0);
    p.set_state(&[5.0, 6.0, 7.0, 8.0]).unwrap();

    assert_eq!(p.state(), State::new(5.0, 6.0, 7.0, 8.0));
    assert_eq!(p.initial_state(), State::new(1.0, 2.0, 3.0, 4.0));
}

#[test]
fn non_positive_mass_is_a_configuration_error() {
    for m in [0.0, -1.0, f64::NAN] {
        let err = Particle::new(0.0, 0.0, 0.0, 0.0, m, Q).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }
}

#[test]
fn particle_ids_increase() {
    let a = charged(0.0, 0.0, 0.0, 0.0);
    let b = charged(0.0, 0.0, 0.0, 0.0);
    assert!(b.id() > a.id());
}

#[test]
fn particle_energies() {
    let p = Particle::new(0.0, 20.0, 3.0, 4.0, 2.0, Q).unwrap();

    assert_relative_eq!(p.kinetic_energy(), 25.0);
    // -m g y with g = -10
    assert_relative_eq!(p.gravitational_energy(G), 400.0);
}

#[test]
fn displacement_points_from_other_to_self() {
    let a = charged(3.0, 4.0, 0.0, 0.0);
    let b = charged(0.0, 0.0, 0.0, 0.0);

    assert_eq!(a.displacement_from(&b), NVec2::new(3.0, 4.0));
    assert_relative_eq!(a.distance_to(&b), 5.0);
    assert_relative_eq!(b.distance_to(&a), 5.0);
}

// ==================================================================================
// Force tests
// ==================================================================================

#[test]
fn gravity_is_mass_times_g_along_y() {
    let p = Particle::new(10.0, 10.0, 0.0, 0.0, 3.0, Q).unwrap();
    assert_eq!(gravity_force(&p, G), NVec2::new(0.0, -30.0));
}

#[test]
fn coulomb_newton_third_law() {
    let pairs = [
        ((0.0, 0.0), (1.0, 0.0)),
        ((10.0, 20.0), (13.0, 24.0)),
        ((50.0, 50.0), (50.0, 50.5)),
        ((1.0, 1.0), (1.0 + 2e-6, 1.0 - 1e-6)),
    ];

    for ((ax, ay), (bx, by)) in pairs {
        let a = charged(ax, ay, 0.0, 0.0);
        let b = charged(bx, by, 0.0, 0.0);
        assert!(a.distance_to(&b) >= CORE);

        let f_ab = coulomb_pair(&a, &b, CORE);
        let f_ba = coulomb_pair(&b, &a, CORE);
        let scale = f_ab.norm();
        assert!((f_ab + f_ba).norm() <= 1e-12 * scale, "net {:?}", f_ab + f_ba);
    }
}

#[test]
fn coulomb_like_charges_repel_opposite_attract() {
    let a = charged(0.0, 0.0, 0.0, 0.0);
    let b = charged(2.0, 0.0, 0.0, 0.0);
    let c = Particle::new(2.0, 0.0, 0.0, 0.0, 1.0, -Q).unwrap();

    // Force on a points away from b
    assert!(coulomb_pair(&a, &b, CORE).x < 0.0);
    // and toward c
    assert!(coulomb_pair(&a, &c, CORE).x > 0.0);
}

#[test]
fn coulomb_magnitude_at_unit_distance() {
    let a = charged(0.0, 0.0, 0.0, 0.0);
    let b = charged(1.0, 0.0, 0.0, 0.0);
    assert_abs_diff_eq!(coulomb_pair(&a, &b, CORE).norm(), Q * Q, epsilon = 1e-5);
}

#[test]
fn coulomb_inverse_square_law() {
    let distances = [1.0, 2.0, 4.0, 8.0];
    let origin = charged(0.0, 0.0, 0.0, 0.0);
    let magnitudes: Vec<f64> = distances
        .iter()
        .map(|&d| coulomb_pair(&origin, &charged(d, 0.0, 0.0, 0.0), CORE).norm())
        .collect();

    for i in 0..distances.len() - 1 {
        let ratio = magnitudes[i + 1] / magnitudes[i];
        let expected = (distances[i] / distances[i + 1]).powi(2);
        assert_abs_diff_eq!(ratio, expected, epsilon = 1e-5);
    }
}

#[test]
fn overlapping_particles_feel_no_force() {
    let a = charged(50.0, 50.0, 0.0, 0.0);
    let b = charged(50.0, 50.0, 0.0, 0.0);

    let f = coulomb_pair(&a, &b, CORE);
    assert_eq!(f, NVec2::zeros());
}

#[test]
fn soft_core_keeps_small_distances_finite() {
    let origin = charged(0.0, 0.0, 0.0, 0.0);

    for d in [1e-10, 1e-9, 1e-8, 1e-7, 5e-7] {
        let f = coulomb_pair(&origin, &charged(d, 0.0, 0.0, 0.0), CORE);
        assert!(f.x.is_finite() && f.y.is_finite(), "non-finite force at d={d}");
        // Soft branch never exceeds the inverse-square value at the core radius
        assert!(f.norm() <= Q * Q / (CORE * CORE), "force too large at d={d}");
    }
}

#[test]
fn soft_core_branch_meets_inverse_square_with_bounded_jump() {
    let origin = charged(0.0, 0.0, 0.0, 0.0);
    let inside = coulomb_pair(&origin, &charged(CORE * (1.0 - 1e-9), 0.0, 0.0, 0.0), CORE).norm();
    let outside = coulomb_pair(&origin, &charged(CORE, 0.0, 0.0, 0.0), CORE).norm();

    assert_relative_eq!(inside / outside, 2f64.powf(-1.5), max_relative = 1e-6);
}

#[test]
fn symmetric_forces_cancel_pairwise() {
    let particles = vec![
        charged(10.0, 10.0, 0.0, 0.0),
        charged(12.0, 11.0, 0.0, 0.0),
        charged(30.0, 5.0, 0.0, 0.0),
        Particle::new(25.0, 40.0, 0.0, 0.0, 2.0, -20.0).unwrap(),
    ];
    let forces = default_forces();

    let total = forces.system_forces(&particles).iter().fold(NVec2::zeros(), |acc, f| acc + f);
    let gravity_total: f64 = particles.iter().map(|p| p.mass() * G).sum();

    assert_abs_diff_eq!(total.x, 0.0, epsilon = 1e-10);
    assert_abs_diff_eq!(total.y, gravity_total, epsilon = 1e-10);
}

#[test]
fn symmetric_forces_match_per_particle_sum() {
    let particles = vec![
        charged(10.0, 10.0, 0.0, 0.0),
        charged(12.0, 11.0, 0.0, 0.0),
        charged(30.0, 5.0, 0.0, 0.0),
    ];
    let forces = default_forces();
    let symmetric = forces.system_forces(&particles);

    for (i, f) in symmetric.iter().enumerate() {
        let direct = net_force_on(i, &particles, G, CORE);
        assert_relative_eq!(f.x, direct.x, max_relative = 1e-10);
        assert_relative_eq!(f.y, direct.y, max_relative = 1e-10);
    }
}

#[test]
fn accelerations_divide_by_mass() {
    let particles = vec![
        Particle::new(10.0, 50.0, 0.0, 0.0, 2.0, Q).unwrap(),
        Particle::new(20.0, 50.0, 0.0, 0.0, 4.0, Q).unwrap(),
    ];
    let forces = default_forces();

    let f = forces.system_forces(&particles);
    let a = forces.accelerations(&particles);

    assert_relative_eq!(a[0].x, f[0].x / 2.0);
    assert_relative_eq!(a[1].x, f[1].x / 4.0);
    assert_relative_eq!(a[0].y, G, max_relative = 1e-12);
}

#[test]
fn tiny_mass_gets_zero_acceleration() {
    let particles = vec![
        Particle::new(10.0, 50.0, 0.0, 0.0, 1e-12, Q).unwrap(),
        charged(20.0, 50.0, 0.0, 0.0),
    ];
    let a = default_forces().accelerations(&particles);
    assert_eq!(a[0], NVec2::zeros());
}

#[test]
fn coulomb_potential_pairs() {
    let particles = vec![
        charged(0.0, 0.0, 0.0, 0.0),
        charged(2.0, 0.0, 0.0, 0.0),
        charged(0.0, 4.0, 0.0, 0.0),
    ];
    let r23 = (4.0f64 + 16.0).sqrt();
    let expected = Q * Q / 2.0 + Q * Q / 4.0 + Q * Q / r23;

    assert_relative_eq!(coulomb_potential_energy(&particles, CORE), expected, max_relative = 1e-12);
}

#[test]
fn soft_core_force_is_negative_potential_gradient() {
    let r = 0.5 * CORE;
    let h = 1e-9 * CORE;

    let u = |d: f64| coulomb_potential_energy(&[charged(0.0, 0.0, 0.0, 0.0), charged(d, 0.0, 0.0, 0.0)], CORE);
    let gradient = (u(r + h) - u(r - h)) / (2.0 * h);

    let f = coulomb_pair(&charged(r, 0.0, 0.0, 0.0), &charged(0.0, 0.0, 0.0, 0.0), CORE);
    assert_relative_eq!(f.x, -gradient, max_relative = 1e-4);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn derivative_layout_is_velocity_then_acceleration() {
    let particles = vec![charged(10.0, 50.0, 5.0, -1.0), charged(90.0, 50.0, -5.0, 2.0)];
    let forces = default_forces();

    let d = derivatives(&forces, &particles);
    let a = forces.accelerations(&particles);
    for ((di, p), ai) in d.iter().zip(particles.iter()).zip(a.iter()) {
        assert_eq!(*di, State::new(p.vx(), p.vy(), ai.x, ai.y));
    }
}

#[test]
fn zero_dt_returns_zero_increments() {
    let mut particles = vec![charged(10.0, 50.0, 5.0, 0.0), charged(90.0, 50.0, -5.0, 0.0)];
    let forces = default_forces();

    let incs = rk4_system_step(&forces, &mut particles, 0.0);
    assert_eq!(incs, vec![State::zeros(); 2]);

    assert_eq!(rk4_particle_step(&forces, &mut particles, 1, 0.0), State::zeros());
}

#[test]
fn rk4_exact_under_constant_acceleration() {
    let mut particles = vec![neutral(50.0, 80.0, 0.0, 0.0)];
    let forces = default_forces();
    let dt = 0.01;

    let inc = rk4_system_step(&forces, &mut particles, dt)[0];

    assert_abs_diff_eq!(inc[3], G * dt, epsilon = 1e-10);
    assert_abs_diff_eq!(inc[1], 0.5 * G * dt * dt, epsilon = 1e-6);
    assert_abs_diff_eq!(inc[0], 0.0, epsilon = 1e-15);
    assert_abs_diff_eq!(inc[2], 0.0, epsilon = 1e-15);
}

#[test]
fn rk4_projectile_matches_analytic_increment() {
    let mut particles = vec![neutral(10.0, 20.0, 3.0, 7.0)];
    let forces = default_forces();
    let dt = 0.05;

    let inc = rk4_particle_step(&forces, &mut particles, 0, dt);

    assert_relative_eq!(inc[0], 3.0 * dt, max_relative = 1e-12);
    assert_relative_eq!(inc[1], 7.0 * dt + 0.5 * G * dt * dt, max_relative = 1e-10);
    assert_relative_eq!(inc[3], G * dt, max_relative = 1e-10);
}

#[test]
fn integrator_restores_all_states() {
    let mut particles = vec![
        charged(10.0, 50.0, 5.0, 0.0),
        charged(12.0, 52.0, -5.0, 1.0),
        charged(90.0, 50.0, -5.0, 0.0),
    ];
    let before = states(&particles);
    let forces = default_forces();

    let _ = rk4_system_step(&forces, &mut particles, 0.01);
    assert_eq!(states(&particles), before);

    let _ = rk4_particle_step(&forces, &mut particles, 1, 0.01);
    assert_eq!(states(&particles), before);
}

#[test]
fn particle_step_agrees_with_system_step() {
    let mut particles = vec![
        charged(10.0, 50.0, 5.0, 0.0),
        charged(12.0, 52.0, -5.0, 1.0),
        charged(90.0, 50.0, -5.0, 0.0),
    ];
    let forces = default_forces();
    let system = rk4_system_step(&forces, &mut particles, 0.01);

    for (i, inc) in system.iter().enumerate() {
        let single = rk4_particle_step(&forces, &mut particles, i, 0.01);
        for c in 0..4 {
            assert_abs_diff_eq!(single[c], inc[c], epsilon = 1e-12);
        }
    }
}

#[test]
fn isolated_pair_conserves_momentum() {
    let mut particles = vec![charged(40.0, 50.0, 5.0, 0.0), charged(60.0, 50.0, -5.0, 0.0)];
    let forces = forces_with_gravity(0.0);

    let p_before: f64 = particles.iter().map(|p| p.mass() * p.vx()).sum();
    let incs = rk4_system_step(&forces, &mut particles, 0.01);
    let p_after: f64 = particles
        .iter()
        .zip(incs.iter())
        .map(|(p, inc)| p.mass() * (p.vx() + inc[2]))
        .sum();

    assert_abs_diff_eq!(p_after, p_before, epsilon = 1e-10);
}

#[test]
fn integrate_until_lands_on_target() {
    let mut particles = vec![neutral(50.0, 90.0, 0.0, 0.0)];
    let forces = default_forces();
    let mut integrator = Rk4Integrator::new(0.3);

    let mut calls = 0;
    integrator.integrate_until(&forces, &mut particles, 1.0, |_, _| calls += 1);

    assert_eq!(integrator.step_count, 4);
    assert_eq!(calls, 4);
    assert_abs_diff_eq!(integrator.elapsed, 1.0, epsilon = 1e-10);
    // free fall: y = y0 + g t^2 / 2
    assert_abs_diff_eq!(particles[0].y(), 90.0 + 0.5 * G, epsilon = 1e-9);
    assert_abs_diff_eq!(particles[0].vy(), G, epsilon = 1e-9);

    integrator.reset();
    assert_eq!(integrator.step_count, 0);
    assert_eq!(integrator.elapsed, 0.0);
}

#[test]
fn integrator_step_counts() {
    let mut particles = vec![charged(10.0, 50.0, 5.0, 0.0), charged(90.0, 50.0, -5.0, 0.0)];
    let forces = default_forces();
    let mut integrator = Rk4Integrator::new(0.001);

    let incs = integrator.step(&forces, &mut particles);
    assert_eq!(incs.len(), 2);
    assert_eq!(integrator.step_count, 1);
    assert_abs_diff_eq!(integrator.elapsed, 0.001);
}

#[test]
fn state_guard_restores_on_panic() {
    let mut particles = vec![charged(10.0, 50.0, 5.0, 0.0), charged(90.0, 50.0, -5.0, 0.0)];
    let before = states(&particles);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut guard = StateGuard::new(&mut particles);
        guard.advance(&[State::repeat(1.0), State::repeat(2.0)], 1.0);
        assert_ne!(guard.particles()[0].state(), guard.saved()[0]);
        panic!("stage evaluation failed");
    }));

    assert!(result.is_err());
    assert_eq!(states(&particles), before);
}

// ==================================================================================
// Boundary tests
// ==================================================================================

#[test]
fn enclosure_rejects_malformed_bounds() {
    for (x0, x1, y0, y1) in [(10.0, 0.0, 0.0, 10.0), (0.0, 10.0, 5.0, 5.0), (0.0, f64::NAN, 0.0, 1.0)] {
        let err = Enclosure::new(x0, x1, y0, y1).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    let custom = Enclosure::new(-10.0, 10.0, -5.0, 5.0).unwrap();
    assert_eq!(custom.width(), 20.0);
    assert_eq!(custom.height(), 10.0);
}

#[test]
fn contains_is_inclusive() {
    let b = default_box();

    assert!(b.contains(NVec2::new(50.0, 50.0)));
    assert!(b.contains(NVec2::new(0.0, 0.0)));
    assert!(b.contains(NVec2::new(100.0, 100.0)));
    assert!(!b.contains(NVec2::new(-1.0, 50.0)));
    assert!(!b.contains(NVec2::new(101.0, 50.0)));
    assert!(!b.contains(NVec2::new(50.0, -1.0)));
    assert!(!b.contains(NVec2::new(50.0, 101.0)));
}

#[test]
fn first_crossing_interpolates_linearly() {
    let b = default_box();

    let c = b.first_crossing(NVec2::new(90.0, 50.0), NVec2::new(110.0, 50.0)).unwrap();
    assert_eq!(c.wall, Wall::Right);
    assert_relative_eq!(c.fraction, 0.5);

    let c = b.first_crossing(NVec2::new(50.0, 4.0), NVec2::new(50.0, -12.0)).unwrap();
    assert_eq!(c.wall, Wall::Bottom);
    assert_relative_eq!(c.fraction, 0.25);

    // y leaves earlier than x
    let c = b.first_crossing(NVec2::new(95.0, 99.0), NVec2::new(105.0, 103.0)).unwrap();
    assert_eq!(c.wall, Wall::Top);
    assert_relative_eq!(c.fraction, 0.25);
}

#[test]
fn first_crossing_tie_goes_to_horizontal_walls() {
    let b = default_box();
    let c = b.first_crossing(NVec2::new(90.0, 90.0), NVec2::new(110.0, 110.0)).unwrap();

    assert_eq!(c.wall, Wall::Right);
    assert_relative_eq!(c.fraction, 0.5);
}

#[test]
fn first_crossing_none_without_crossing() {
    let b = default_box();

    assert!(b.first_crossing(NVec2::new(10.0, 10.0), NVec2::new(20.0, 20.0)).is_none());
    // already outside at the start
    assert!(b.first_crossing(NVec2::new(110.0, 50.0), NVec2::new(120.0, 50.0)).is_none());
}

#[test]
fn no_collision_returns_plain_rk4_state() {
    let mut b = default_box();
    let mut particles = vec![charged(50.0, 50.0, 0.1, 0.1)];
    let forces = default_forces();

    let expected = particles[0].state() + rk4_particle_step(&forces, &mut particles, 0, 0.001);
    let end = b.resolve(&forces, &mut particles, 0, 0.001, 0.0);

    assert_eq!(end, expected);
    assert_eq!(b.total_collisions(), 0);
    assert_eq!(particles[0].collision_count, 0);
}

#[test]
fn direct_high_speed_approach_reflects() {
    let mut b = default_box();
    let mut particles = vec![charged(99.0, 50.0, 20.0, 0.0)];
    let forces = default_forces();
    let before = particles[0].state();

    let end = b.resolve(&forces, &mut particles, 0, 1.0, 0.0);

    assert!(b.contains(NVec2::new(end[0], end[1])), "left the box: {end:?}");
    assert!(end[2] < 0.0, "x velocity not reflected");
    assert_abs_diff_eq!(end[0], 81.0, epsilon = 1e-6);
    assert_eq!(particles[0].collision_count, 1);
    assert_eq!(b.total_collisions(), 1);
    assert_abs_diff_eq!(particles[0].last_collision_time.unwrap(), 0.05, epsilon = 1e-9);
    // state itself untouched until the driver commits
    assert_eq!(particles[0].state(), before);
}

#[test]
fn glancing_approach_stays_inside() {
    let mut b = default_box();
    let mut particles = vec![charged(99.9, 50.0, 0.0, 5.0)];
    let forces = default_forces();

    let end = b.resolve(&forces, &mut particles, 0, 0.02, 0.0);

    assert!(b.contains(NVec2::new(end[0], end[1])));
    assert!(end[2].abs() < 1.0);
}

#[test]
fn each_wall_keeps_particle_inside() {
    let cases = [
        (95.0, 50.0, 10.0, 0.0, 1.0),
        (5.0, 50.0, -10.0, 0.0, 1.0),
        (50.0, 95.0, 0.0, 20.0, 1.0),
        (50.0, 5.0, 0.0, -10.0, 1.0),
        (50.0, 50.0, 100.0, 0.0, 1.0),
        (50.0, 50.0, 0.0, -400.0, 0.2),
    ];
    let forces = default_forces();

    for (x, y, vx, vy, dt) in cases {
        let mut b = default_box();
        let mut particles = vec![charged(x, y, vx, vy)];
        let end = b.resolve(&forces, &mut particles, 0, dt, 0.0);

        assert!(b.contains(NVec2::new(end[0], end[1])), "({x}, {y}) -> {end:?}");
        assert!(end.iter().all(|c| c.is_finite()));
        assert!(b.total_collisions() > 0, "no collision recorded for ({x}, {y})");
    }
}

#[test]
fn reflection_preserves_energy_of_a_single_particle() {
    let mut b = default_box();
    let mut particles = vec![charged(95.0, 50.0, 10.0, 0.0)];
    let forces = default_forces();
    let e0 = particles[0].kinetic_energy() + particles[0].gravitational_energy(G);

    let end = b.resolve(&forces, &mut particles, 0, 1.0, 0.0);
    assert_eq!(b.total_collisions(), 1);
    particles[0].set_state(end.as_slice()).unwrap();
    let e1 = particles[0].kinetic_energy() + particles[0].gravitational_energy(G);

    assert_relative_eq!(e1, e0, max_relative = 1e-6);
}

#[test]
fn corner_approach_terminates_inside() {
    let mut b = default_box();
    let mut particles = vec![charged(98.0, 98.0, 5.0, 5.0)];
    let forces = default_forces();

    let end = b.resolve(&forces, &mut particles, 0, 0.1, 0.0);

    assert!(b.contains(NVec2::new(end[0], end[1])));
}

#[test]
fn corner_collision_reflects_both_components() {
    // exact binary values: hits the right wall at the half step, the top wall right after
    let mut b = default_box();
    let mut particles = vec![neutral(99.0, 99.0, 16.0, 16.0)];
    let forces = forces_with_gravity(0.0);

    let end = b.resolve(&forces, &mut particles, 0, 0.125, 0.0);

    assert_eq!(end, State::new(99.0, 99.0, -16.0, -16.0));
    assert_eq!(particles[0].collision_count, 2);
    assert_eq!(b.total_collisions(), 2);
}

#[test]
fn recursion_cap_accepts_clamped_state() {
    let mut b = default_box().with_max_depth(0);
    let mut particles = vec![neutral(99.0, 99.0, 16.0, 16.0)];
    let forces = forces_with_gravity(0.0);

    let end = b.resolve(&forces, &mut particles, 0, 0.125, 0.0);

    assert_eq!(end, State::new(99.0, 100.0, -16.0, 16.0));
    assert_eq!(particles[0].collision_count, 1);
}

#[test]
fn collision_with_neighbours_is_finite_and_restores_peers() {
    let mut b = default_box();
    let mut particles = vec![charged(90.0, 50.0, 10.0, 0.0), charged(70.0, 50.0, 0.0, 0.0)];
    let before = states(&particles);
    let forces = default_forces();

    let end = b.resolve(&forces, &mut particles, 0, 1.5, 0.0);

    assert!(end.iter().all(|c| c.is_finite()));
    assert!(b.contains(NVec2::new(end[0], end[1])));
    assert_eq!(states(&particles), before);
}

#[test]
fn enforce_bounds_clamps_position() {
    let b = default_box();
    let mut p = charged(150.0, -50.0, 1.0, 2.0);

    b.enforce_bounds(&mut p);

    assert_eq!(p.state(), State::new(100.0, 0.0, 1.0, 2.0));
}

#[test]
fn reflect_simple_mirrors_position_and_velocity() {
    let mut b = default_box();
    let mut p = charged(105.0, -3.0, 2.0, -1.0);

    assert!(b.reflect_simple(&mut p, 1.5));
    assert_eq!(p.state(), State::new(95.0, 3.0, -2.0, 1.0));
    assert_eq!(p.collision_count, 1);
    assert_eq!(p.last_collision_time, Some(1.5));
    assert_eq!(b.total_collisions(), 1);

    let mut inside = charged(50.0, 50.0, 1.0, 1.0);
    assert!(!b.reflect_simple(&mut inside, 2.0));
    assert_eq!(b.total_collisions(), 1);
}

#[test]
fn would_exit_uses_linear_lookahead() {
    let b = default_box();
    assert!(b.would_exit(&State::new(99.95, 50.0, 10.0, 0.0), 0.01));
    assert!(!b.would_exit(&State::new(99.0, 50.0, 10.0, 0.0), 0.01));
}

#[test]
fn resting_on_floor_counts_no_collision() {
    let mut b = default_box();
    let mut particles = vec![neutral(50.0, 0.0, 0.0, 0.0)];
    let forces = default_forces();

    let end = b.resolve(&forces, &mut particles, 0, 0.5, 0.0);

    assert_eq!(end, State::new(50.0, 0.0, 0.0, -5.0));
    assert_eq!(particles[0].collision_count, 0);
    assert!(particles[0].last_collision_time.is_none());
    assert_eq!(b.total_collisions(), 0);
}

#[test]
fn pushed_against_wall_counts_no_collision() {
    let mut b = default_box();
    let mut particles = vec![charged(100.0, 50.0, 0.0, 0.0), charged(90.0, 50.0, 0.0, 0.0)];
    let before = states(&particles);
    let forces = forces_with_gravity(0.0);

    let end = b.resolve(&forces, &mut particles, 0, 0.5, 0.0);

    assert_eq!(end[0], 100.0);
    assert!(end[2] > 0.0);
    assert_eq!(particles[0].collision_count, 0);
    assert_eq!(b.total_collisions(), 0);
    assert_eq!(states(&particles), before);
}
