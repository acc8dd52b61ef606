//! Plain-text tables for threshold and probability matrices.

use crate::threshold::Threshold;
use pa_core::utilities::format_value;
use pa_core::{FormatType, Real, Size};
use std::fmt::Write;

/// `[ v0, v1, … ]` with every value formatted and right-aligned.
pub(crate) fn format_row(values: &[Real], format: FormatType, accuracy: Size) -> String {
    let cells: Vec<String> = values
        .iter()
        .map(|&v| format_value(v, format, accuracy))
        .collect();
    bracket(&cells, accuracy)
}

/// Same as [`format_row`] with the markers spelled `NaN` and `-Inf`.
pub(crate) fn format_threshold_row(cells: &[Threshold], format: FormatType, accuracy: Size) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|c| match c {
            Threshold::Value(v) => format_value(*v, format, accuracy),
            marker => marker.to_string(),
        })
        .collect();
    bracket(&cells, accuracy)
}

fn bracket(cells: &[String], accuracy: Size) -> String {
    let width = accuracy + 5;
    let mut out = String::from("[");
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // writing to a String cannot fail
        let _ = write!(out, " {cell:>width$}");
    }
    out.push_str(" ]");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned() {
        assert_eq!(
            format_row(&[0.5, -0.25], FormatType::Standard, 2),
            "[    0.50,   -0.25 ]"
        );
        assert_eq!(format_row(&[0.05], FormatType::Percent, 1), "[   5.0% ]");
    }

    #[test]
    fn markers_are_spelled_out() {
        let row = [Threshold::SameState, Threshold::Value(-2.3263), Threshold::Unreachable];
        assert_eq!(
            format_threshold_row(&row, FormatType::Standard, 2),
            "[     NaN,   -2.33,    -Inf ]"
        );
    }
}
