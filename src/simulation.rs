//! Fixed-step closed-loop driver
//!
//! The [`Stepper`] owns the plant, the controller and the history buffer.
//! Callers hand in plain [`TickInputs`] on every tick and read plain values
//! back; nothing else holds a reference to the loop components.
//!
//! ```text
//! setpoint ──> (+) ──> [PID] ──> [plant] ──┬──> position
//!               ^ -                        │
//!               └──────────────────────────┘
//! ```

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::blocks::{
    GaussianNoise, HistoryBuffer, HistorySnapshot, NoiseSource, Pid, PidGains, Plant, Sample,
    DEFAULT_DISTURBANCE,
};
use crate::error::{ConfigError, SimError};

/// Values the caller supplies on every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInputs {
    /// Target rod angle (rad)
    pub setpoint: f64,
    pub gains: PidGains,
    /// Gravity bias
    pub disturbance: f64,
}

impl Default for TickInputs {
    fn default() -> Self {
        Self {
            setpoint: 0.0,
            gains: PidGains::default(),
            disturbance: DEFAULT_DISTURBANCE,
        }
    }
}

/// Whether [`Stepper::step`] advances the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    #[default]
    Paused,
    Running,
}

/// Closed-loop simulation driver
///
/// Each tick pushes gains and disturbance into the loop, computes the
/// control signal from the current plant position, advances the plant by
/// one step and records the result.
///
/// Simulated time advances by the plant's `dt` per tick, independent of
/// how often the caller ticks.
///
/// # Example
///
/// ```ignore
/// let mut stepper = Stepper::new(plant, pid, 500)?;
/// stepper.start();
/// let inputs = TickInputs { setpoint: 0.0, gains: PidGains::new(2.0, 0.5, 0.1), disturbance: 0.5 };
/// while let Some(sample) = stepper.step(&inputs)? {
///     if sample.time >= 10.0 { break; }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Stepper<N: NoiseSource = GaussianNoise> {
    plant: Plant<N>,
    controller: Pid,
    history: HistoryBuffer,
    time: f64,
    state: LoopState,
    diverged: bool,
}

impl<N: NoiseSource> Stepper<N> {
    /// Assemble a loop from its parts
    ///
    /// The controller's step must equal the plant's.
    pub fn new(plant: Plant<N>, controller: Pid, history_len: usize) -> Result<Self, ConfigError> {
        if controller.dt() != plant.dt() {
            return Err(ConfigError::InvalidTimestep(controller.dt()));
        }

        Ok(Self {
            plant,
            controller,
            history: HistoryBuffer::new(history_len)?,
            time: 0.0,
            state: LoopState::Paused,
            diverged: false,
        })
    }

    /// Advance one tick
    ///
    /// Returns `Ok(None)` without touching any state while paused. A tick
    /// that produces a non-finite state is not recorded, so the history only
    /// ever holds finite samples. Once the loop has diverged every call fails
    /// until [`reset`](Self::reset).
    pub fn step(&mut self, inputs: &TickInputs) -> Result<Option<Sample>, SimError> {
        if self.state == LoopState::Paused {
            return Ok(None);
        }
        self.check()?;

        self.controller.set_gains(inputs.gains);
        self.plant.set_disturbance(inputs.disturbance);

        let measured = self.plant.position();
        let control = self.controller.compute(inputs.setpoint, measured);
        let position = self.plant.update(control);

        self.time += self.plant.dt();

        if !control.is_finite() || !self.plant.is_finite() {
            self.diverged = true;
            warn!(
                "loop diverged at t={:.3} (position={}, velocity={}, control={})",
                self.time,
                self.plant.position(),
                self.plant.velocity(),
                control
            );
            return Err(self.diverged_error());
        }

        let sample = Sample {
            time: self.time,
            position,
            setpoint: inputs.setpoint,
            control,
        };
        self.history.push(sample);
        trace!(
            "t={:.3} position={:.5} control={:.5}",
            sample.time,
            sample.position,
            sample.control
        );

        Ok(Some(sample))
    }

    /// Step `ticks` times with the same inputs, returning the last sample
    pub fn run(&mut self, inputs: &TickInputs, ticks: usize) -> Result<Option<Sample>, SimError> {
        let mut last = None;
        for _ in 0..ticks {
            match self.step(inputs)? {
                Some(sample) => last = Some(sample),
                None => break,
            }
        }
        Ok(last)
    }

    /// Fail if the loop has diverged
    pub fn check(&self) -> Result<(), SimError> {
        if self.diverged {
            Err(self.diverged_error())
        } else {
            Ok(())
        }
    }

    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    /// Reset plant and controller, zero time, clear history and pause
    pub fn reset(&mut self) {
        self.plant.reset();
        self.controller.reset();
        self.history.clear();
        self.time = 0.0;
        self.diverged = false;
        self.state = LoopState::Paused;
        debug!("loop reset");
    }

    pub fn start(&mut self) {
        self.state = LoopState::Running;
        debug!("loop running at t={:.3}", self.time);
    }

    pub fn pause(&mut self) {
        self.state = LoopState::Paused;
        debug!("loop paused at t={:.3}", self.time);
    }

    /// Flip between running and paused, returning the new state
    pub fn toggle(&mut self) -> LoopState {
        match self.state {
            LoopState::Paused => self.start(),
            LoopState::Running => self.pause(),
        }
        self.state
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Simulated time (s)
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Override the plant state before or between runs
    pub fn set_initial_state(&mut self, position: f64, velocity: f64) {
        self.plant.set_state(position, velocity);
    }

    pub fn plant(&self) -> &Plant<N> {
        &self.plant
    }

    pub fn controller(&self) -> &Pid {
        &self.controller
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Owned copy of the history for another thread or a plot
    pub fn snapshot(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    fn diverged_error(&self) -> SimError {
        SimError::Diverged {
            time: self.time,
            position: self.plant.position(),
            velocity: self.plant.velocity(),
        }
    }
}
