//! Rounding utilities.

use pa_core::Real;

/// Rounding convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rounding {
    /// No rounding; the value is returned unchanged.
    None,
    /// Round up (ceiling towards positive infinity).
    Up,
    /// Round down (floor towards negative infinity).
    Down,
    /// Round to nearest, ties away from zero.
    Closest,
}

/// Round `value` to `precision` decimal places using the given convention.
///
/// Non-finite values are returned unchanged.
pub fn round(value: Real, precision: i32, convention: Rounding) -> Real {
    if matches!(convention, Rounding::None) || !value.is_finite() {
        return value;
    }
    let mult = 10_f64.powi(precision);
    match convention {
        Rounding::None => value,
        Rounding::Up => (value * mult).ceil() / mult,
        Rounding::Down => (value * mult).floor() / mult,
        Rounding::Closest => (value * mult).round() / mult,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_rounding() {
        assert!((round(1.2345, 2, Rounding::Closest) - 1.23).abs() < 1e-10);
        assert!((round(-2.32635, 3, Rounding::Closest) + 2.326).abs() < 1e-10);
    }

    #[test]
    fn directional_rounding() {
        assert!((round(1.2301, 2, Rounding::Up) - 1.24).abs() < 1e-10);
        assert!((round(1.2399, 2, Rounding::Down) - 1.23).abs() < 1e-10);
    }

    #[test]
    fn non_finite_untouched() {
        assert!(round(Real::NAN, 3, Rounding::Closest).is_nan());
        assert_eq!(round(Real::NEG_INFINITY, 3, Rounding::Closest), Real::NEG_INFINITY);
    }
}
