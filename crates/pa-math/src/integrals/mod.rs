//! Numerical integration on tabulated data.
//!
//! The threshold engine only ever integrates densities sampled on uniform
//! grids, so every rule here works on slices of abscissae and ordinates.

pub mod discrete;

pub use discrete::{band_trapezoid, discrete_trapezoid, prefix_mass, trapezoid_uniform};
