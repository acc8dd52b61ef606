//! `Matrix`: a two-dimensional matrix of reals.
//!
//! This is a thin newtype around `nalgebra::DMatrix<f64>` exposing what the
//! transition-matrix code needs: row access, row sums, products and integer
//! powers.

use nalgebra::DMatrix;
use pa_core::{Error, Real, Result};
use std::ops::{Index, IndexMut, Mul, Sub};

/// A dynamically-sized 2D matrix of `Real` values (row-major access).
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<Real>);

impl Matrix {
    /// Create a zero-filled `rows × cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Create a matrix filled with `value`.
    pub fn from_element(rows: usize, cols: usize, value: Real) -> Self {
        Self(DMatrix::from_element(rows, cols, value))
    }

    /// Create an identity matrix of size `n × n`.
    pub fn identity(n: usize) -> Self {
        Self(DMatrix::identity(n, n))
    }

    /// Create from a row-major data slice.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[Real]) -> Self {
        Self(DMatrix::from_row_slice(rows, cols, data))
    }

    /// Create from nested rows. Fails on ragged input.
    pub fn from_rows(rows: &[Vec<Real>]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(Error::InvalidArgument(format!(
                "row {i} has {} columns, expected {n_cols}",
                row.len()
            )));
        }
        Ok(Self(DMatrix::from_fn(n_rows, n_cols, |i, j| rows[i][j])))
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    /// Return `true` if the matrix is square.
    pub fn is_square(&self) -> bool {
        self.0.nrows() == self.0.ncols()
    }

    /// Extract a row.
    pub fn row(&self, i: usize) -> Vec<Real> {
        self.0.row(i).iter().copied().collect()
    }

    /// Sum of the elements of row `i`.
    pub fn row_sum(&self, i: usize) -> Real {
        self.0.row(i).sum()
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<Real>> {
        (0..self.rows()).map(|i| self.row(i)).collect()
    }

    /// Largest absolute element, ignoring NaN entries.
    pub fn max_abs(&self) -> Real {
        self.0
            .iter()
            .filter(|v| !v.is_nan())
            .fold(0.0, |m, v| m.max(v.abs()))
    }

    /// Integer power by repeated squaring. `m.power(0)` is the identity.
    pub fn power(&self, exp: u32) -> Result<Self> {
        if !self.is_square() {
            return Err(Error::InvalidArgument(format!(
                "power of a non-square {}x{} matrix",
                self.rows(),
                self.cols()
            )));
        }
        let mut result = DMatrix::identity(self.rows(), self.cols());
        let mut base = self.0.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            e >>= 1;
            if e > 0 {
                base = &base * &base;
            }
        }
        Ok(Self(result))
    }
}

// ── From / Into ───────────────────────────────────────────────────────────────

impl From<DMatrix<Real>> for Matrix {
    fn from(m: DMatrix<Real>) -> Self {
        Self(m)
    }
}

// ── Indexing ──────────────────────────────────────────────────────────────────

impl Index<(usize, usize)> for Matrix {
    type Output = Real;
    fn index(&self, (i, j): (usize, usize)) -> &Real {
        &self.0[(i, j)]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Real {
        &mut self.0[(i, j)]
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

impl Sub for &Matrix {
    type Output = Matrix;
    fn sub(self, rhs: &Matrix) -> Matrix {
        Matrix(&self.0 - &rhs.0)
    }
}

impl Mul for &Matrix {
    type Output = Matrix;
    fn mul(self, rhs: &Matrix) -> Matrix {
        Matrix(&self.0 * &rhs.0)
    }
}
