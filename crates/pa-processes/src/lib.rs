//! # pa-processes
//!
//! Stochastic processes driving the latent credit-quality variable.
//!
//! The threshold engine only needs the one-step conditional law of the
//! latent factor, which [`StochasticProcess1D`] exposes through its
//! expectation and standard deviation over a time step.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ar_process;
pub mod stochastic_process;

pub use ar_process::Ar1Process;
pub use stochastic_process::StochasticProcess1D;
