//! Run loop: fixed number of ticks, progress reporting, final statistics

use std::fmt;
use std::time::Instant;

use log::info;

use crate::output::recorder::TrajectoryRecorder;
use crate::simulation::energy::relative_drift;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::State;

/// Statistics of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: usize,
    pub sim_time: f64,
    pub dt: f64,
    pub wall_time: f64, // seconds
    pub initial_energy: f64,
    pub final_energy: f64,
    pub absolute_drift: f64,
    pub relative_drift: f64,
    pub energy_tolerance: f64,
    pub particle_collisions: Vec<u32>,
    pub box_collisions: u64,
    pub final_states: Vec<State>,
}

impl RunSummary {
    pub fn from_scenario(scenario: &Scenario, wall_time: f64) -> Self {
        let initial_energy = scenario.monitor.initial();
        let final_energy = scenario.monitor.latest();

        Self {
            steps: scenario.step_count,
            sim_time: scenario.time(),
            dt: scenario.parameters.dt,
            wall_time,
            initial_energy,
            final_energy,
            absolute_drift: (final_energy - initial_energy).abs(),
            relative_drift: relative_drift(initial_energy, final_energy),
            energy_tolerance: scenario.monitor.tolerance(),
            particle_collisions: scenario.particles().iter().map(|p| p.collision_count).collect(),
            box_collisions: scenario.enclosure.total_collisions(),
            final_states: scenario.particles().iter().map(|p| p.state()).collect(),
        }
    }

    pub fn within_tolerance(&self) -> bool {
        self.relative_drift < self.energy_tolerance
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "SIMULATION STATISTICS")?;
        writeln!(f, "{rule}")?;

        writeln!(f, "\nTime:")?;
        writeln!(f, "  simulated time: {:.3} s", self.sim_time)?;
        writeln!(f, "  steps: {}", self.steps)?;
        writeln!(f, "  step size: {}", self.dt)?;
        writeln!(f, "  wall time: {:.2} s", self.wall_time)?;
        if self.wall_time > 0.0 {
            writeln!(f, "  speed: {:.2}x real time", self.sim_time.abs() / self.wall_time)?;
        }

        writeln!(f, "\nEnergy:")?;
        writeln!(f, "  initial: {:.6}", self.initial_energy)?;
        writeln!(f, "  final: {:.6}", self.final_energy)?;
        writeln!(f, "  absolute drift: {:.6e}", self.absolute_drift)?;
        writeln!(f, "  relative drift: {:.6e}", self.relative_drift)?;
        if self.within_tolerance() {
            writeln!(f, "  within tolerance ({:.1e})", self.energy_tolerance)?;
        } else {
            writeln!(f, "  exceeds tolerance ({:.1e})", self.energy_tolerance)?;
        }

        let total: u64 = self.particle_collisions.iter().map(|&c| u64::from(c)).sum();
        writeln!(f, "\nWall collisions:")?;
        writeln!(f, "  particles total: {total}")?;
        writeln!(f, "  box counter: {}", self.box_collisions)?;
        for (i, c) in self.particle_collisions.iter().enumerate().filter(|(_, c)| **c > 0) {
            writeln!(f, "  particle {}: {c}", i + 1)?;
        }

        writeln!(f, "\nFinal states:")?;
        for (i, s) in self.final_states.iter().enumerate() {
            writeln!(f, "  particle {}: pos=({:.2}, {:.2}), vel=({:.2}, {:.2})", i + 1, s[0], s[1], s[2], s[3])?;
        }
        write!(f, "{rule}")
    }
}

/// Run `scenario` for `parameters.t_end`, recording every frame into `recorder`
pub fn run(scenario: &mut Scenario, recorder: &mut TrajectoryRecorder) -> RunSummary {
    let total_steps = scenario.parameters.step_count();
    let interval = scenario.engine.progress_interval;

    info!(
        "running {} steps ({} s) with exact interpolated wall collisions",
        total_steps, scenario.parameters.t_end
    );

    if recorder.is_empty() {
        recorder.record(scenario.time(), scenario.monitor.latest(), scenario.particles());
    }

    let start = Instant::now();
    for step in 1..=total_steps {
        scenario.step();
        recorder.record(scenario.time(), scenario.monitor.latest(), scenario.particles());

        if interval > 0 && step % interval == 0 {
            let elapsed = start.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 { step as f64 / elapsed } else { 0.0 };
            info!(
                "progress {:.1}% | t={:.3}s | energy drift {:.3e} | collisions {} | {:.0} steps/s",
                100.0 * step as f64 / total_steps as f64,
                scenario.time(),
                scenario.relative_energy_drift(),
                scenario.particle_collisions(),
                rate
            );
        }
    }

    RunSummary::from_scenario(scenario, start.elapsed().as_secs_f64())
}
