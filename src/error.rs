//! Error types for chargesim.
//!
//! Only malformed configuration and malformed state vectors are errors.
//! Numerical corner cases (overlapping particles, zero time step, zero
//! displacement during crossing tests) are guarded branches, not failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid state vector: {0}")]
    InvalidState(String),

    #[error("particle index {index} out of range ({count} particles)")]
    ParticleIndex { index: usize, count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
