//! Probability distributions.
//!
//! Only the standard normal is needed by the threshold engine; the
//! complementary error function comes from the `statrs` crate.

pub mod normal;

pub use normal::{normal_cdf, normal_cdf_inverse, normal_pdf};
