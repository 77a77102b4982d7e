//! Forward Euler method for numerical integration

use nalgebra::SVector;

use super::{ExplicitSolver, Solver};

/// Explicit forward Euler method
///
/// First-order, single-stage explicit integration method.
///
/// # Mathematical Form
/// ```text
/// x_{n+1} = x_n + h * f(x_n)
/// ```
///
/// # Note
/// An undamped oscillator integrated with forward Euler gains amplitude by a
/// factor of `sqrt(1 + (w*h)^2)` per step. Keep `h` small relative to `1/w`.
#[derive(Debug, Clone)]
pub struct Euler<const N: usize> {
    state: SVector<f64, N>,
    initial: SVector<f64, N>,
}

impl<const N: usize> Euler<N> {
    /// Create a new Euler solver with the given initial state
    pub fn new(initial: SVector<f64, N>) -> Self {
        Self {
            state: initial,
            initial,
        }
    }

    /// Create a solver starting from the zero vector
    pub fn zeros() -> Self {
        Self::new(SVector::zeros())
    }
}

impl<const N: usize> Default for Euler<N> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<const N: usize> Solver<N> for Euler<N> {
    fn state(&self) -> &SVector<f64, N> {
        &self.state
    }

    fn set_state(&mut self, state: SVector<f64, N>) {
        self.state = state;
    }

    fn reset(&mut self) {
        self.state = self.initial;
    }
}

impl<const N: usize> ExplicitSolver<N> for Euler<N> {
    fn step<F>(&mut self, mut f: F, dt: f64)
    where
        F: FnMut(&SVector<f64, N>) -> SVector<f64, N>,
    {
        let slope = f(&self.state);
        self.state += slope * dt;
    }
}
