//! rodsim - closed-loop PID simulation of a motor-driven rod
//!
//! A motor holds a rod against a constant gravity bias. The rod is modelled
//! as a damped second-order linear plant, integrated with forward Euler, and
//! stabilized by a PID controller with anti-windup.
//!
//! # Architecture
//!
//! - [`Plant`]: state-space rod model with injectable noise
//! - [`Pid`]: PID control law holding integral/derivative state
//! - [`Stepper`]: fixed-step driver owning both, plus a bounded [`HistoryBuffer`]
//!
//! Front ends pass plain values in through [`TickInputs`] and read plain
//! values back; the stepper is the only owner of loop state.
//!
//! # Example
//!
//! ```rust,ignore
//! use rodsim::prelude::*;
//!
//! let mut stepper = SimConfig::default().build()?;
//! stepper.start();
//!
//! let inputs = TickInputs {
//!     setpoint: 0.2,
//!     gains: PidGains::new(2.0, 0.5, 0.1),
//!     disturbance: 0.5,
//! };
//! stepper.run(&inputs, 1000)?;
//! println!("angle after {:.1} s: {:.4}", stepper.time(), stepper.plant().position());
//! ```

pub mod blocks;
pub mod config;
pub mod error;
pub mod simulation;
pub mod solvers;

pub use blocks::*;
pub use config::{ControllerConfig, NoiseConfig, SimConfig};
pub use error::{ConfigError, SimError};
pub use simulation::{LoopState, Stepper, TickInputs};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::blocks::*;
    pub use crate::config::{ControllerConfig, NoiseConfig, SimConfig};
    pub use crate::error::{ConfigError, SimError};
    pub use crate::simulation::{LoopState, Stepper, TickInputs};
    pub use crate::solvers::*;
}
