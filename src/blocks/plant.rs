//! Motor-and-rod plant model
//!
//! Second-order linear system with transfer function
//!
//! ```text
//! G(s) = K*wn^2 / (s^2 + 2*zeta*wn*s + wn^2)
//! ```
//!
//! in state-space form:
//!
//! ```text
//! dx/dt = A x + B u + D (disturbance + noise)
//!
//! A = [[0, 1], [-wn^2, -2*zeta*wn]]
//! B = [0, K*wn^2]^T
//! D = [0, 1]^T
//! ```
//!
//! with `x = (angle, angular velocity)`.

use log::{debug, warn};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use super::noise::{GaussianNoise, NoiseSource};
use crate::error::{ensure_finite, ensure_timestep, ConfigError};
use crate::solvers::{Euler, ExplicitSolver, Solver};

/// Default gravity bias acting on the rod
pub const DEFAULT_DISTURBANCE: f64 = 0.5;

/// Growth factor above which construction logs a stability warning
const GROWTH_WARN_THRESHOLD: f64 = 1.0 + 1e-3;

/// Physical parameters of the plant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantParameters {
    /// System gain `K`
    pub gain: f64,
    /// Natural frequency `wn` (rad/s)
    pub natural_frequency: f64,
    /// Damping ratio `zeta`
    pub damping_ratio: f64,
    /// Integration step (s)
    pub dt: f64,
}

impl Default for PlantParameters {
    fn default() -> Self {
        Self {
            gain: 1.0,
            natural_frequency: 2.0,
            damping_ratio: 0.1,
            dt: 0.01,
        }
    }
}

impl PlantParameters {
    pub fn new(gain: f64, natural_frequency: f64, damping_ratio: f64, dt: f64) -> Self {
        Self {
            gain,
            natural_frequency,
            damping_ratio,
            dt,
        }
    }

    /// Check that the parameters describe a well-formed plant
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("gain", self.gain)?;
        ensure_finite("natural_frequency", self.natural_frequency)?;
        ensure_finite("damping_ratio", self.damping_ratio)?;
        ensure_timestep(self.dt)?;

        if self.natural_frequency <= 0.0 {
            return Err(ConfigError::InvalidNaturalFrequency(self.natural_frequency));
        }
        if self.damping_ratio < 0.0 {
            return Err(ConfigError::InvalidDampingRatio(self.damping_ratio));
        }
        Ok(())
    }

    /// State matrix `A`
    pub fn state_matrix(&self) -> Matrix2<f64> {
        let wn = self.natural_frequency;
        Matrix2::new(0.0, 1.0, -wn * wn, -2.0 * self.damping_ratio * wn)
    }

    /// Input matrix `B`
    pub fn input_matrix(&self) -> Vector2<f64> {
        let wn = self.natural_frequency;
        Vector2::new(0.0, self.gain * wn * wn)
    }

    /// Largest magnitude among the eigenvalues of `I + A*dt`
    ///
    /// Values above 1 mean the forward Euler discretization amplifies the
    /// free response even though the continuous system does not.
    pub fn euler_growth_factor(&self) -> f64 {
        let wn = self.natural_frequency;
        let zeta = self.damping_ratio;
        let h = self.dt;

        if zeta < 1.0 {
            // lambda = -zeta*wn +/- i*wn*sqrt(1 - zeta^2)
            let re = 1.0 - zeta * wn * h;
            let im = wn * h * (1.0 - zeta * zeta).sqrt();
            (re * re + im * im).sqrt()
        } else {
            // lambda = wn * (-zeta +/- sqrt(zeta^2 - 1))
            let root = (zeta * zeta - 1.0).sqrt();
            let fast = (1.0 + wn * (-zeta - root) * h).abs();
            let slow = (1.0 + wn * (-zeta + root) * h).abs();
            fast.max(slow)
        }
    }
}

/// Snapshot of plant parameters and state for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlantInfo {
    pub gain: f64,
    pub natural_frequency: f64,
    pub damping_ratio: f64,
    pub dt: f64,
    pub position: f64,
    pub velocity: f64,
    pub disturbance: f64,
}

/// Motor with an attached rod, driven by a control input against gravity
///
/// The noise source is a type parameter so tests can run with
/// [`Silent`](super::noise::Silent) or a seeded [`GaussianNoise`].
///
/// # Example
///
/// ```ignore
/// let mut plant = Plant::new(PlantParameters::default())?;
/// plant.set_disturbance(0.0);
/// let angle = plant.update(1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Plant<N: NoiseSource = GaussianNoise> {
    params: PlantParameters,
    a: Matrix2<f64>,
    b: Vector2<f64>,
    d: Vector2<f64>,
    solver: Euler<2>,
    disturbance: f64,
    noise: N,
}

impl Plant<GaussianNoise> {
    /// Create a plant with default Gaussian process noise
    pub fn new(params: PlantParameters) -> Result<Self, ConfigError> {
        Self::with_noise(params, GaussianNoise::default())
    }
}

impl<N: NoiseSource> Plant<N> {
    /// Create a plant with an explicit noise source
    pub fn with_noise(params: PlantParameters, noise: N) -> Result<Self, ConfigError> {
        params.validate()?;

        let growth = params.euler_growth_factor();
        if growth > GROWTH_WARN_THRESHOLD {
            warn!(
                "Euler growth factor {:.6} > 1 for wn={} zeta={} dt={}; free response will grow",
                growth, params.natural_frequency, params.damping_ratio, params.dt
            );
        }

        Ok(Self {
            params,
            a: params.state_matrix(),
            b: params.input_matrix(),
            d: Vector2::new(0.0, 1.0),
            solver: Euler::zeros(),
            disturbance: DEFAULT_DISTURBANCE,
            noise,
        })
    }

    /// Advance the plant one step under `control_input`, returning the new angle
    pub fn update(&mut self, control_input: f64) -> f64 {
        let noise = self.noise.sample();
        let w = self.disturbance + noise;
        let (a, b, d) = (self.a, self.b, self.d);

        self.solver
            .step(|x| a * x + b * control_input + d * w, self.params.dt);

        self.position()
    }

    /// Rod angle (rad)
    #[inline]
    pub fn position(&self) -> f64 {
        self.solver.state()[0]
    }

    /// Rod angular velocity (rad/s)
    #[inline]
    pub fn velocity(&self) -> f64 {
        self.solver.state()[1]
    }

    /// Set the gravity bias, effective from the next update
    pub fn set_disturbance(&mut self, disturbance: f64) {
        self.disturbance = disturbance;
    }

    pub fn disturbance(&self) -> f64 {
        self.disturbance
    }

    /// Override the state (initial conditions)
    pub fn set_state(&mut self, position: f64, velocity: f64) {
        self.solver.set_state(Vector2::new(position, velocity));
    }

    /// Zero the state; parameters and disturbance are kept
    pub fn reset(&mut self) {
        self.solver.reset();
        debug!("plant reset");
    }

    pub fn parameters(&self) -> &PlantParameters {
        &self.params
    }

    pub fn dt(&self) -> f64 {
        self.params.dt
    }

    /// True while both state components are finite
    pub fn is_finite(&self) -> bool {
        self.solver.state().iter().all(|v| v.is_finite())
    }

    /// Equilibrium angle under a constant input and the current bias
    pub fn steady_state_position(&self, control_input: f64) -> f64 {
        let wn = self.params.natural_frequency;
        self.params.gain * control_input + self.disturbance / (wn * wn)
    }

    pub fn info(&self) -> PlantInfo {
        PlantInfo {
            gain: self.params.gain,
            natural_frequency: self.params.natural_frequency,
            damping_ratio: self.params.damping_ratio,
            dt: self.params.dt,
            position: self.position(),
            velocity: self.velocity(),
            disturbance: self.disturbance,
        }
    }
}
