//! # portfolio-analytics
//!
//! Multi-period credit rating migration thresholds driven by an AR(1)
//! latent factor.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `pa-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use portfolio_analytics::core::IntegrationSettings;
//! use portfolio_analytics::processes::Ar1Process;
//! use portfolio_analytics::thresholds::{ThresholdSet, TransitionMatrixSet, Validator};
//!
//! let matrices = TransitionMatrixSet::from_json_str("[[[0.99, 0.01], [0, 1]]]").unwrap();
//! let mut set = ThresholdSet::builder()
//!     .with_matrix_set(matrices)
//!     .with_settings(IntegrationSettings::default().with_grid_points(200))
//!     .build()
//!     .unwrap();
//! set.fit_all(&Ar1Process::new(0.0, 1.0, 0.0).unwrap(), 1.0).unwrap();
//!
//! let rebuilt = Validator::new(&set).reconstruct();
//! assert!((rebuilt.reconstructed[0][(0, 1)] - 0.01).abs() < 1e-4);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, errors and integration settings.
pub use pa_core as core;

/// Normal distribution, quadrature, root finding and matrices.
pub use pa_math as math;

/// Latent-factor processes.
pub use pa_processes as processes;

/// Transition matrices, threshold calibration, validation and stress pricing.
pub use pa_thresholds as thresholds;
