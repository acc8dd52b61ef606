//! Reconstruction of transition matrices from calibrated thresholds.
//!
//! The validator integrates every stored survival density over the bands
//! cut out by the thresholds. It only reads the threshold set, so repeated
//! runs give identical output.

use crate::parallel::map_ratings;
use crate::tables::format_row;
use crate::threshold_set::ThresholdSet;
use pa_core::{FormatType, Real, Result, Size};
use pa_math::Matrix;
use std::fmt::Write;
use tracing::warn;

/// Reconstructs the transition matrices implied by a [`ThresholdSet`].
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    set: &'a ThresholdSet,
}

/// Output of [`Validator::reconstruct`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Implied cumulative matrices, one per period.
    pub reconstructed: Vec<Matrix>,
    /// `input − reconstructed`, when the input matrices are known.
    pub errors: Option<Vec<Matrix>>,
    /// Live ratings without stored densities; their rows are NaN.
    pub uncalibrated: Vec<Size>,
    inputs: Option<Vec<Matrix>>,
}

impl<'a> Validator<'a> {
    /// Validator over `set`.
    pub fn new(set: &'a ThresholdSet) -> Self {
        Self { set }
    }

    /// Rebuild every period's matrix from densities and thresholds.
    pub fn reconstruct(&self) -> Reconstruction {
        let set = self.set;
        let (ratings, periods) = (set.ratings(), set.periods());
        let rows = map_ratings(ratings, |ri| self.rating_rows(ri));

        let mut reconstructed = vec![Matrix::zeros(ratings, ratings); periods];
        let mut uncalibrated = Vec::new();
        for (ri, rows) in rows.into_iter().enumerate() {
            let rows = match rows {
                Some(rows) => rows,
                None => {
                    uncalibrated.push(ri);
                    vec![vec![Real::NAN; ratings]; periods]
                }
            };
            for (k, row) in rows.iter().enumerate() {
                for (rf, &p) in row.iter().enumerate() {
                    reconstructed[k][(ri, rf)] = p;
                }
            }
        }

        let inputs = set.matrix_set().map(|m| m.matrices().to_vec());
        let errors = inputs.as_ref().map(|inputs| {
            inputs
                .iter()
                .zip(&reconstructed)
                .map(|(input, rebuilt)| input - rebuilt)
                .collect()
        });

        Reconstruction {
            reconstructed,
            errors,
            uncalibrated,
            inputs,
        }
    }

    /// Rows `[k][rf]` of initial rating `ri`, or `None` when it cannot be
    /// reconstructed.
    fn rating_rows(&self, ri: Size) -> Option<Vec<Vec<Real>>> {
        let set = self.set;
        let (ratings, periods) = (set.ratings(), set.periods());
        if ri == set.default_state() {
            let mut unit = vec![0.0; ratings];
            unit[ri] = 1.0;
            return Some(vec![unit; periods]);
        }
        let densities = set.densities(ri)?;
        let rows: Result<Vec<Vec<Real>>> = densities
            .iter()
            .enumerate()
            .map(|(k, grid)| Ok(grid.band_probabilities(&set.boundaries(ri, k)?)))
            .collect();
        match rows {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(rating = ri, error = %e, "skipping reconstruction");
                None
            }
        }
    }
}

impl Reconstruction {
    /// Largest absolute reconstruction error, ignoring NaN rows.
    pub fn max_abs_error(&self) -> Option<Real> {
        self.errors
            .as_ref()
            .map(|errors| errors.iter().map(Matrix::max_abs).fold(0.0, Real::max))
    }

    /// Largest deviation of a reconstructed row sum from one.
    pub fn max_mass_defect(&self) -> Real {
        self.reconstructed
            .iter()
            .flat_map(|m| (0..m.rows()).map(move |i| m.row_sum(i)))
            .filter(|s| !s.is_nan())
            .fold(0.0, |acc, s| acc.max((s - 1.0).abs()))
    }

    /// Text report: for every initial rating and period the input (`T`),
    /// reconstructed (`Q`) and error (`E`) rows.
    pub fn report(&self, accuracy: Size) -> String {
        let mut out = String::new();
        let ratings = self.reconstructed.first().map_or(0, Matrix::rows);
        for ri in 0..ratings {
            let _ = writeln!(out, "initial rating {ri}");
            for (k, rebuilt) in self.reconstructed.iter().enumerate() {
                let _ = writeln!(out, "  period {k}");
                if let Some(inputs) = &self.inputs {
                    let _ = writeln!(
                        out,
                        "    T {}",
                        format_row(&inputs[k].row(ri), FormatType::Standard, accuracy)
                    );
                }
                let _ = writeln!(
                    out,
                    "    Q {}",
                    format_row(&rebuilt.row(ri), FormatType::Standard, accuracy)
                );
                if let Some(errors) = &self.errors {
                    let _ = writeln!(
                        out,
                        "    E {}",
                        format_row(&errors[k].row(ri), FormatType::Standard, accuracy)
                    );
                }
            }
        }
        out
    }
}
