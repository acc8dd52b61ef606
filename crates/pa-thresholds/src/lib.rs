//! # pa-thresholds
//!
//! Multi-period rating migration thresholds for an AR(1) latent factor.
//!
//! A [`TransitionMatrixSet`] of cumulative transition matrices is turned
//! into thresholds `A[ri, rf, k]` on the latent variable by
//! [`ThresholdSet::fit`]: closed form in the first period, then a bounded
//! Newton solve for the default threshold and a convolution of the survival
//! density for every later period. [`Validator`] rebuilds the matrices from
//! the stored densities, and [`ConditionalTransitionMatrix`] reprices them
//! under a systematic [`Scenario`] with the thresholds held fixed.
//!
//! ## Feature flags
//!
//! - `parallel` (default): calibrate, reconstruct and reprice initial
//!   ratings on the rayon thread pool.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod calibration;
pub mod conditional;
pub mod density;
mod parallel;
mod tables;
pub mod threshold;
pub mod threshold_set;
pub mod transition;
pub mod validation;

pub use calibration::{grid_horizons, PROBABILITY_FLOOR};
pub use conditional::{ConditionalTransitionMatrix, Scenario};
pub use density::{DensityGrid, GaussianKernel};
pub use threshold::{Boundaries, Threshold, ThresholdArray};
pub use threshold_set::{ThresholdSet, ThresholdSetBuilder};
pub use transition::TransitionMatrixSet;
pub use validation::{Reconstruction, Validator};
