//! Data formatting helpers for probabilities and threshold tables.

use crate::Real;

/// Presentation format for probability and threshold tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatType {
    /// Plain decimal numbers.
    #[default]
    Standard,
    /// Values multiplied by 100 with a trailing `%`.
    Percent,
}

/// Format a real number with the given number of decimal places.
pub fn format_real(value: Real, decimals: usize) -> String {
    format!("{:.prec$}", value, prec = decimals)
}

/// Format a probability as a percentage string (e.g. `0.05` → `"5.00%"`).
pub fn format_percent(value: Real, decimals: usize) -> String {
    format!("{:.prec$}%", value * 100.0, prec = decimals)
}

/// Format `value` according to `format`.
pub fn format_value(value: Real, format: FormatType, decimals: usize) -> String {
    match format {
        FormatType::Standard => format_real(value, decimals),
        FormatType::Percent => format_percent(value, decimals),
    }
}
