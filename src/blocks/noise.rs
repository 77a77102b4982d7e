//! Noise sources for the plant disturbance input
//!
//! The plant draws one sample per update from a [`NoiseSource`]. Sources are
//! injected at construction so runs can be made reproducible with a seed or
//! fully deterministic with [`Silent`].

use crate::error::ConfigError;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::StandardNormal;

/// Default standard deviation of the process noise
pub const DEFAULT_NOISE_STD_DEV: f64 = 0.01;

/// A source of scalar noise samples
pub trait NoiseSource {
    /// Draw the next sample
    fn sample(&mut self) -> f64;
}

/// Gaussian white noise source
///
/// Generates zero-mean normally distributed values with configurable
/// standard deviation. Supports reproducible sequences via optional seed.
///
/// # Example
///
/// ```ignore
/// let mut noise = GaussianNoise::new(0.01, Some(42))?;
/// let sample = noise.sample();
/// ```
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    std_dev: f64,
    rng: StdRng,
}

impl GaussianNoise {
    /// Create white noise with standard deviation and optional seed
    pub fn new(std_dev: f64, seed: Option<u64>) -> Result<Self, ConfigError> {
        let std_dev = Self::validate(std_dev)?;

        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Ok(Self { std_dev, rng })
    }

    /// Noise with the default standard deviation and a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            std_dev: DEFAULT_NOISE_STD_DEV,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Get current standard deviation
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Set new standard deviation
    pub fn set_std_dev(&mut self, std_dev: f64) -> Result<(), ConfigError> {
        self.std_dev = Self::validate(std_dev)?;
        Ok(())
    }

    /// Restart the sequence from a new seed
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn validate(std_dev: f64) -> Result<f64, ConfigError> {
        if std_dev.is_finite() && std_dev >= 0.0 {
            Ok(std_dev)
        } else {
            Err(ConfigError::InvalidNoise(std_dev))
        }
    }
}

impl Default for GaussianNoise {
    fn default() -> Self {
        Self {
            std_dev: DEFAULT_NOISE_STD_DEV,
            rng: StdRng::from_entropy(),
        }
    }
}

impl NoiseSource for GaussianNoise {
    fn sample(&mut self) -> f64 {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        let z: f64 = StandardNormal.sample(&mut self.rng);
        self.std_dev * z
    }
}

/// Noise source that always yields zero
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Silent;

impl NoiseSource for Silent {
    fn sample(&mut self) -> f64 {
        0.0
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for Box<N> {
    fn sample(&mut self) -> f64 {
        (**self).sample()
    }
}
