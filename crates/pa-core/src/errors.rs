//! Error types for portfolio-analytics.
//!
//! A single `thiserror`-derived enum covers every failure the calibration
//! engine can report. The `ensure!`, `ensure_post!` and `fail!` macros keep
//! precondition checks to one line at the call site.

use thiserror::Error;

/// The top-level error type used throughout portfolio-analytics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (shape mismatch, invalid probabilities, ...).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated (e.g. a propagated density is not finite).
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Index out of range (rating index, period index).
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or ambiguous construction inputs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An iterative solver did not reach the requested tolerance.
    #[error("no convergence after {iterations} iterations (last step {last_step:e})")]
    NonConvergence {
        /// Number of iterations performed.
        iterations: usize,
        /// Size of the last update.
        last_step: f64,
    },

    /// Malformed persisted data.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File system error.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Shorthand `Result` type used throughout portfolio-analytics.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use pa_core::{ensure, errors::Error};
/// fn positive(x: f64) -> pa_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use pa_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> pa_core::errors::Result<f64> {
///     let result = x.sqrt();
///     ensure_post!(result.is_finite(), "result must be finite, got {result}");
///     Ok(result)
/// }
/// assert!(compute(4.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use pa_core::{fail, errors::Error};
/// fn always_err() -> pa_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
