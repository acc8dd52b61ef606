//! Cumulative rating transition matrices.
//!
//! Entry `(ri, rf)` of the matrix at period `k` is the probability of being
//! in rating `rf` at the end of period `k` having started in `ri` at time 0.
//! The last state is the absorbing Default.

use pa_core::{ensure, Error, Real, Result, Size};
use pa_math::{close, Matrix};
use std::path::Path;

/// Row sums may deviate from one by at most this much.
pub const ROW_SUM_TOLERANCE: Real = 1.0e-6;

/// An ordered sequence of cumulative transition matrices, one per period.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrixSet {
    matrices: Vec<Matrix>,
}

impl TransitionMatrixSet {
    /// Create a set from per-period matrices, validating them.
    pub fn new(matrices: Vec<Matrix>) -> Result<Self> {
        let set = Self { matrices };
        set.validate()?;
        Ok(set)
    }

    /// Create a set from nested `[period][from][to]` rows.
    pub fn from_rows(periods: Vec<Vec<Vec<Real>>>) -> Result<Self> {
        let matrices = periods
            .iter()
            .enumerate()
            .map(|(k, rows)| {
                Matrix::from_rows(rows).map_err(|e| {
                    Error::Precondition(format!("period {k}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(matrices)
    }

    /// Extend a one-period matrix `M` to `periods` cumulative matrices
    /// `M, M², …, M^periods`.
    pub fn from_power(one_period: &Matrix, periods: Size) -> Result<Self> {
        ensure!(periods > 0, "at least one period is required");
        let matrices = (1..=periods)
            .map(|k| {
                let exp = u32::try_from(k).map_err(|_| {
                    Error::InvalidArgument(format!("period count {periods} too large"))
                })?;
                one_period.power(exp)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(matrices)
    }

    /// Parse a JSON list of matrices, e.g. `[[[0.99, 0.01], [0, 1]]]`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<Vec<Vec<Real>>> = serde_json::from_str(json)?;
        Self::from_rows(rows)
    }

    /// Read a JSON list of matrices from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check shape, probability bounds, row sums and the absorbing default row.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.matrices.is_empty(), "at least one period is required");
        let n = self.matrices[0].rows();
        ensure!(n >= 2, "at least two rating states are required, got {n}");
        let default = n - 1;

        for (k, m) in self.matrices.iter().enumerate() {
            ensure!(
                m.rows() == n && m.cols() == n,
                "period {k}: expected a {n}x{n} matrix, got {}x{}",
                m.rows(),
                m.cols()
            );
            for i in 0..n {
                for j in 0..n {
                    let p = m[(i, j)];
                    ensure!(
                        (0.0..=1.0).contains(&p),
                        "period {k}: entry ({i}, {j}) = {p} is not a probability"
                    );
                }
                let sum = m.row_sum(i);
                ensure!(
                    close(sum, 1.0, ROW_SUM_TOLERANCE),
                    "period {k}: row {i} sums to {sum}"
                );
            }
            ensure!(
                m[(default, default)] == 1.0,
                "period {k}: default state must be absorbing"
            );
        }
        Ok(())
    }

    /// Number of rating states, Default included.
    pub fn ratings(&self) -> Size {
        self.matrices[0].rows()
    }

    /// Number of periods.
    pub fn periods(&self) -> Size {
        self.matrices.len()
    }

    /// Index of the absorbing Default state.
    pub fn default_state(&self) -> Size {
        self.ratings() - 1
    }

    /// Whether `ri` is the absorbing state.
    pub fn is_absorbing(&self, ri: Size) -> bool {
        ri == self.default_state()
    }

    /// Cumulative matrix for period `k`.
    pub fn matrix(&self, k: Size) -> &Matrix {
        &self.matrices[k]
    }

    /// All per-period matrices.
    pub fn matrices(&self) -> &[Matrix] {
        &self.matrices
    }

    /// `P_k[ri, rf]`.
    #[inline]
    pub fn probability(&self, ri: Size, rf: Size, k: Size) -> Real {
        self.matrices[k][(ri, rf)]
    }

    /// Cumulative default probability `P_k[ri, Default]`.
    #[inline]
    pub fn default_probability(&self, ri: Size, k: Size) -> Real {
        self.probability(ri, self.default_state(), k)
    }

    /// Probability mass lying below the latent threshold separating `ri`
    /// from `rf` at period `k`.
    ///
    /// A downgrade target (`rf > ri`) collects `rf ..= D−1`, an upgrade
    /// target collects `rf+1 ..= D−1`; `with_default` adds `P_k[ri, D]`.
    pub fn mass_below(&self, ri: Size, rf: Size, k: Size, with_default: bool) -> Real {
        let d = self.default_state();
        let from = if rf > ri { rf } else { rf + 1 };
        let live: Real = (from..d).map(|j| self.probability(ri, j, k)).sum();
        if with_default {
            live + self.probability(ri, d, k)
        } else {
            live
        }
    }
}
