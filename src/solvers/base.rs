//! Base solver traits

use nalgebra::SVector;

/// Core solver trait for numerical integration of an `N`-dimensional state
pub trait Solver<const N: usize>: Send + Sync {
    /// Get current state vector
    fn state(&self) -> &SVector<f64, N>;

    /// Set state vector
    fn set_state(&mut self, state: SVector<f64, N>);

    /// Reset solver to initial state
    fn reset(&mut self);
}

/// Explicit solver trait
pub trait ExplicitSolver<const N: usize>: Solver<N> {
    /// Advance the state by `dt` with the given right-hand side `dx/dt = f(x)`
    fn step<F>(&mut self, f: F, dt: f64)
    where
        F: FnMut(&SVector<f64, N>) -> SVector<f64, N>;
}
