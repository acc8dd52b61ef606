//! # pa-math
//!
//! Mathematical utilities: the standard normal distribution (via statrs),
//! discrete quadrature on uniform grids, a bounded Newton-Raphson solver,
//! rounding, and a matrix newtype over nalgebra.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// Probability distributions.
pub mod distributions;

/// Numerical integration on tabulated data.
pub mod integrals;

/// Dense real matrices.
pub mod matrix;

/// Rounding conventions.
pub mod rounding;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::close;
pub use distributions::{normal_cdf, normal_cdf_inverse, normal_pdf};
pub use matrix::Matrix;
pub use rounding::{round, Rounding};
