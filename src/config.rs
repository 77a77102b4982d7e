//! Serializable configuration of the whole loop

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::blocks::{
    AntiWindup, DerivativeMode, GaussianNoise, Pid, Plant, PlantParameters,
    DEFAULT_HISTORY_LEN, DEFAULT_NOISE_STD_DEV,
};
use crate::error::ConfigError;
use crate::simulation::{Stepper, TickInputs};

/// Controller settings
///
/// Gains are not part of this: they arrive with every tick and start from
/// [`SimConfig::initial_inputs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub anti_windup: AntiWindup,
    pub derivative_mode: DerivativeMode,
}

/// Process noise settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub enabled: bool,
    pub std_dev: f64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            std_dev: DEFAULT_NOISE_STD_DEV,
            seed: None,
        }
    }
}

/// Simulation settings
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "plant": { "damping_ratio": 0.3 }, "initial_inputs": { "gains": { "kp": 2.0 } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub plant: PlantParameters,
    pub controller: ControllerConfig,
    pub noise: NoiseConfig,
    /// Maximum retained history samples
    pub history_len: usize,
    /// Inputs a front end starts from, including the controller gains
    pub initial_inputs: TickInputs,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            plant: PlantParameters::default(),
            controller: ControllerConfig::default(),
            noise: NoiseConfig::default(),
            history_len: DEFAULT_HISTORY_LEN,
            initial_inputs: TickInputs::default(),
        }
    }
}

impl SimConfig {
    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Noise source described by this config
    pub fn noise_source(&self) -> Result<GaussianNoise, ConfigError> {
        let std_dev = if self.noise.enabled {
            self.noise.std_dev
        } else {
            0.0
        };
        GaussianNoise::new(std_dev, self.noise.seed)
    }

    /// Controller described by this config, sharing the plant's step
    pub fn controller(&self) -> Result<Pid, ConfigError> {
        Ok(Pid::new(self.initial_inputs.gains, self.plant.dt)?
            .with_anti_windup(self.controller.anti_windup)?
            .with_derivative_mode(self.controller.derivative_mode))
    }

    /// Validate everything and assemble a paused loop
    pub fn build(&self) -> Result<Stepper<GaussianNoise>, ConfigError> {
        let mut plant = Plant::with_noise(self.plant, self.noise_source()?)?;
        plant.set_disturbance(self.initial_inputs.disturbance);
        Stepper::new(plant, self.controller()?, self.history_len)
    }
}
