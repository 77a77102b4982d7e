//! Numerical integration solvers
//!
//! Fixed-step explicit integration of small, fixed-size state vectors.
//! The plant model only needs forward Euler, but integration goes through
//! the [`Solver`]/[`ExplicitSolver`] pair so the method stays swappable.

mod base;
mod euler;

pub use base::*;
pub use euler::Euler;
