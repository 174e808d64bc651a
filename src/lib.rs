pub mod error;
pub mod simulation;
pub mod configuration;
pub mod output;
pub mod benchmark;

pub use error::{Result, SimError};

pub use simulation::states::{Particle, System, State, NVec2, StateGuard};
pub use simulation::params::Parameters;
pub use simulation::forces::{Force, ForceSet, UniformGravity, SoftCoulomb, coulomb_pair, gravity_force, coulomb_potential_energy};
pub use simulation::integrator::{rk4_system_step, rk4_particle_step, Rk4Integrator};
pub use simulation::boundary::{Enclosure, Wall, Crossing};
pub use simulation::energy::{total_energy, total_momentum, EnergyMonitor, DriftLevel};
pub use simulation::engine::Engine;
pub use simulation::scenario::Scenario;
pub use simulation::runner::{run, RunSummary};

pub use configuration::config::{ScenarioConfig, EngineConfig, ParametersConfig, EnclosureConfig, ParticleConfig, StepMode};

pub use output::recorder::TrajectoryRecorder;

pub use benchmark::benchmark::{bench_forces, bench_step};
