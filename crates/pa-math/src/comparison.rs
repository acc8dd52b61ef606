//! Comparison utilities.

use pa_core::Real;

/// Default epsilon for close comparisons.
pub const EPSILON: Real = 1e-10;

/// Return `true` if `|a - b| <= epsilon`.
#[inline]
pub fn close(a: Real, b: Real, epsilon: Real) -> bool {
    (a - b).abs() <= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_basic() {
        assert!(close(1.0, 1.0 + 1e-11, EPSILON));
        assert!(!close(1.0, 1.0 + 1e-9, EPSILON));
        assert!(!close(Real::NAN, Real::NAN, EPSILON));
    }
}
