//! 1D root-finding solvers.

use pa_core::{
    errors::{Error, Result},
    Real, Size,
};

const DEFAULT_ACCURACY: Real = 1.0e-11;

/// Outcome of a converged Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolution {
    /// The accepted root.
    pub root: Real,
    /// Number of Newton steps taken.
    pub iterations: Size,
    /// Size of the last accepted step.
    pub last_step: Real,
}

// ── Newton-Raphson ────────────────────────────────────────────────────────────

/// Unbracketed Newton-Raphson iteration on `f(x) = 0`.
///
/// `f_df` returns the function value and its derivative. Starting from `x0`
/// the update `x ← x − f/f'` is repeated while the last step exceeds
/// `accuracy`; `initial_step` seeds the step size so at least one update is
/// made whenever it exceeds the accuracy. Fails with
/// [`Error::NonConvergence`] after `max_iterations` steps or when the
/// derivative vanishes or the iterate stops being finite.
pub fn newton_raphson<F>(
    mut f_df: F,
    x0: Real,
    accuracy: Real,
    initial_step: Real,
    max_iterations: Size,
) -> Result<NewtonSolution>
where
    F: FnMut(Real) -> (Real, Real),
{
    let acc = if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    };
    let mut x = x0;
    let mut step = initial_step;
    let mut iterations = 0;

    while step.abs() > acc {
        if iterations == max_iterations {
            return Err(Error::NonConvergence {
                iterations,
                last_step: step,
            });
        }
        iterations += 1;
        let (fx, dfx) = f_df(x);
        let next = x - fx / dfx;
        if !(dfx.abs() > 0.0) || !next.is_finite() {
            return Err(Error::NonConvergence {
                iterations,
                last_step: step,
            });
        }
        step = next - x;
        x = next;
    }

    Ok(NewtonSolution {
        root: x,
        iterations,
        last_step: step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn newton_sqrt_two() {
        let sol = newton_raphson(|x| (x * x - 2.0, 2.0 * x), 1.0, 1e-12, 1.0, 50).unwrap();
        assert_abs_diff_eq!(sol.root, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert!(sol.iterations < 10);
        assert!(sol.last_step.abs() <= 1e-12);
    }

    #[test]
    fn newton_hits_iteration_cap() {
        // x² + 1 has no real root: the iterates wander forever.
        let err = newton_raphson(|x| (x * x + 1.0, 2.0 * x), 0.5, 1e-12, 1.0, 25).unwrap_err();
        assert!(matches!(err, Error::NonConvergence { iterations: 25, .. }));
    }

    #[test]
    fn newton_vanishing_derivative() {
        let err = newton_raphson(|x| (x * x - 1.0, 0.0), 3.0, 1e-12, 1.0, 25).unwrap_err();
        assert!(matches!(err, Error::NonConvergence { iterations: 1, .. }));
    }

    #[test]
    fn newton_small_seed_skips_iteration() {
        let sol = newton_raphson(|x| (x - 3.0, 1.0), 1.0, 1e-6, 1e-9, 10).unwrap();
        assert_eq!(sol.iterations, 0);
        assert_eq!(sol.root, 1.0);
    }
}
