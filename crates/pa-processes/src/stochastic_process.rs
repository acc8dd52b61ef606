//! `StochasticProcess1D`: base trait for scalar processes.
//!
//! A process `dX = μ(t,X) dt + σ(t,X) dW` is described by its drift (`μ`)
//! and diffusion (`σ`). Discretely sampled processes override the
//! one-step moments directly.

use pa_core::{Real, Time};

/// A 1-dimensional stochastic process `dX = μ(t,X) dt + σ(t,X) dW`.
pub trait StochasticProcess1D: std::fmt::Debug + Send + Sync {
    /// Initial value of the process.
    fn x0(&self) -> Real;

    /// Drift `μ(t, x)`.
    fn drift_1d(&self, t: Time, x: Real) -> Real;

    /// Diffusion `σ(t, x)`.
    fn diffusion_1d(&self, t: Time, x: Real) -> Real;

    /// Expected value `E[x(t+Δt) | x(t) = x]`.
    fn expectation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        x + self.drift_1d(t, x) * dt
    }

    /// Standard deviation `σ(t,x) · √Δt`.
    fn std_deviation_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        self.diffusion_1d(t, x) * dt.sqrt()
    }

    /// Variance `σ(t,x)² · Δt`.
    fn variance_1d(&self, t: Time, x: Real, dt: Time) -> Real {
        let sd = self.std_deviation_1d(t, x, dt);
        sd * sd
    }

    /// Euler step `x(t+Δt) = E[x(t+Δt)|x(t)] + σ·√Δt · dw`.
    fn evolve_1d(&self, t: Time, x: Real, dt: Time, dw: Real) -> Real {
        self.expectation_1d(t, x, dt) + self.std_deviation_1d(t, x, dt) * dw
    }
}
