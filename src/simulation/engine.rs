//! High-level runtime engine settings
//!
//! Selects how a tick is assembled and how the run loop reports progress
//! when running a `Scenario`

use crate::configuration::config::{EngineConfig, StepMode};

#[derive(Debug, Clone)]
pub struct Engine {
    pub step_mode: StepMode, // sequential or batch
    pub max_collision_depth: usize, // nested corner corrections per particle and tick
    pub progress_interval: usize, // steps between progress lines, 0 disables them
}

impl From<&EngineConfig> for Engine {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            step_mode: cfg.step_mode,
            max_collision_depth: cfg.max_collision_depth,
            progress_interval: cfg.progress_interval,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}
