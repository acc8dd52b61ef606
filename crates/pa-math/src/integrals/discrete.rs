//! Discrete integrators operating on pre-computed data arrays.
//!
//! These are used when the integrand is only available as a vector of
//! function values at given abscissae, e.g. a survival density propagated
//! on a grid.

use pa_core::Real;

/// Composite trapezoidal rule on discrete data points.
///
/// Given abscissae `x[0..n]` and ordinates `f[0..n]`, returns
///
/// $$\sum_{i=0}^{n-2} \tfrac12 (x_{i+1}-x_i)(f_i + f_{i+1}).$$
pub fn discrete_trapezoid(x: &[Real], f: &[Real]) -> Real {
    debug_assert_eq!(x.len(), f.len());
    let n = x.len().min(f.len());
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n - 1 {
        sum += (x[i + 1] - x[i]) * (f[i] + f[i + 1]);
    }
    0.5 * sum
}

/// Composite trapezoidal rule on ordinates sampled with uniform step `h`.
pub fn trapezoid_uniform(f: &[Real], h: Real) -> Real {
    let n = f.len();
    if n < 2 {
        return 0.0;
    }
    let interior: Real = f[1..n - 1].iter().sum();
    h * (0.5 * (f[0] + f[n - 1]) + interior)
}

/// Trapezoidal integral of the piecewise-linear interpolant of `(x, f)`
/// restricted to `[lo, hi]`.
///
/// Grid points outside the band are discarded and the cells cut by the band
/// edges contribute their interpolated part, so adjacent bands add up to the
/// integral over their union. Either bound may be infinite; `lo >= hi`
/// gives zero.
pub fn band_trapezoid(x: &[Real], f: &[Real], lo: Real, hi: Real) -> Real {
    debug_assert_eq!(x.len(), f.len());
    let n = x.len().min(f.len());
    if n < 2 || !(lo < hi) {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n - 1 {
        let (x0, x1) = (x[i], x[i + 1]);
        let a = x0.max(lo);
        let b = x1.min(hi);
        if b <= a {
            continue;
        }
        let slope = (f[i + 1] - f[i]) / (x1 - x0);
        let fa = f[i] + slope * (a - x0);
        let fb = f[i] + slope * (b - x0);
        sum += 0.5 * (b - a) * (fa + fb);
    }
    sum
}

/// Running sums `Σ_{j≤i} f_j · h`.
///
/// The sequence is non-decreasing whenever `f` is non-negative, which makes
/// it searchable with `partition_point`.
pub fn prefix_mass(f: &[Real], h: Real) -> Vec<Real> {
    f.iter()
        .scan(0.0, |acc, &v| {
            *acc += v * h;
            Some(*acc)
        })
        .collect()
}
