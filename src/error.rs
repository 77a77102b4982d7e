//! Error types for construction and runtime

use thiserror::Error;

/// Rejected configuration, reported at construction time
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Timestep must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    #[error("Natural frequency must be positive, got {0}")]
    InvalidNaturalFrequency(f64),

    #[error("Damping ratio must be non-negative, got {0}")]
    InvalidDampingRatio(f64),

    #[error("Parameter `{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("Noise standard deviation must be non-negative and finite, got {0}")]
    InvalidNoise(f64),

    #[error("History length must be at least 1")]
    InvalidHistoryLength,

    #[error("Invalid limits: min {min} must be below max {max}")]
    InvalidLimits { min: f64, max: f64 },

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime failure of the control loop
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Simulation diverged at t={time}: position={position}, velocity={velocity}")]
    Diverged {
        time: f64,
        position: f64,
        velocity: f64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Fail with [`ConfigError::NonFinite`] unless `value` is finite
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

/// Validate a fixed integration step
pub(crate) fn ensure_timestep(dt: f64) -> Result<f64, ConfigError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(ConfigError::InvalidTimestep(dt))
    }
}
