//! Miscellaneous utilities.

/// Number formatting for tables and reports.
pub mod data_formatters;

pub use data_formatters::{format_percent, format_real, format_value, FormatType};
