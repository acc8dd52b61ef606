//! Stressed transition matrices under a systematic scenario.
//!
//! The thresholds of a calibrated [`ThresholdSet`] stay fixed; the scenario
//! moves the latent variable instead. At period `k` the kernel mean gains
//! `rho · √dt · s_k` and the residual standard deviation becomes
//! `√(dt · (1 − rho²))`. Probabilities are band integrals of the stressed
//! survival density over the unchanged boundaries.

use crate::calibration::grid_horizons;
use crate::density::{DensityGrid, GaussianKernel};
use crate::parallel::map_ratings;
use crate::tables::format_row;
use crate::threshold_set::ThresholdSet;
use pa_core::{ensure, FormatType, Real, Result, Size};
use pa_math::Matrix;
use pa_processes::{Ar1Process, StochasticProcess1D};
use std::fmt::Write;
use tracing::{info, warn};

/// Systematic shocks, one per period, and the sensitivity to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    shocks: Vec<Real>,
    rho: Real,
}

impl Scenario {
    /// Fails unless `rho ∈ (−1, 1)` and every shock is finite.
    pub fn new(shocks: Vec<Real>, rho: Real) -> Result<Self> {
        ensure!(rho > -1.0 && rho < 1.0, "rho must lie in (-1, 1), got {rho}");
        ensure!(
            shocks.iter().all(|s| s.is_finite()),
            "scenario shocks must be finite"
        );
        Ok(Self { shocks, rho })
    }

    /// Zero shocks over `periods` periods.
    pub fn neutral(periods: Size, rho: Real) -> Result<Self> {
        Self::new(vec![0.0; periods], rho)
    }

    /// Shocks per period.
    pub fn shocks(&self) -> &[Real] {
        &self.shocks
    }

    /// Sensitivity.
    pub fn rho(&self) -> Real {
        self.rho
    }

    /// Number of periods covered.
    pub fn len(&self) -> Size {
        self.shocks.len()
    }

    /// Whether the scenario covers no period.
    pub fn is_empty(&self) -> bool {
        self.shocks.is_empty()
    }
}

/// Transition probabilities `T[ri, rf, k]` repriced under a [`Scenario`].
#[derive(Debug, Clone)]
pub struct ConditionalTransitionMatrix<'a> {
    set: &'a ThresholdSet,
    matrices: Vec<Matrix>,
    densities: Vec<Option<Vec<DensityGrid>>>,
}

type PricedRating = (Vec<Vec<Real>>, Option<Vec<DensityGrid>>);

impl<'a> ConditionalTransitionMatrix<'a> {
    /// An unpriced matrix (every entry NaN) over `set`.
    pub fn new(set: &'a ThresholdSet) -> Self {
        let ratings = set.ratings();
        Self {
            set,
            matrices: vec![Matrix::from_element(ratings, ratings, Real::NAN); set.periods()],
            densities: vec![None; ratings],
        }
    }

    /// Reprice initial rating `ri` under `scenario`.
    pub fn fit(&mut self, process: &Ar1Process, scenario: &Scenario, ri: Size) -> Result<()> {
        self.set.thresholds().check_rating(ri)?;
        self.check_scenario(scenario)?;
        let grid_max = self.horizons(process);
        let priced = self.price(process, scenario, &grid_max, ri)?;
        self.store(ri, priced);
        Ok(())
    }

    /// Reprice every initial rating; same error policy as
    /// [`ThresholdSet::fit_all`].
    pub fn fit_all(&mut self, process: &Ar1Process, scenario: &Scenario) -> Result<()> {
        self.check_scenario(scenario)?;
        let grid_max = self.horizons(process);
        let results = {
            let this = &*self;
            map_ratings(this.set.ratings(), |ri| {
                this.price(process, scenario, &grid_max, ri)
            })
        };
        let mut first_error = None;
        for (ri, result) in results.into_iter().enumerate() {
            match result {
                Ok(priced) => self.store(ri, priced),
                Err(e) => {
                    warn!(rating = ri, error = %e, "repricing failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn check_scenario(&self, scenario: &Scenario) -> Result<()> {
        ensure!(
            scenario.len() == self.set.periods(),
            "scenario covers {} periods, the threshold set {}",
            scenario.len(),
            self.set.periods()
        );
        Ok(())
    }

    fn horizons(&self, process: &Ar1Process) -> Vec<Real> {
        grid_horizons(
            process,
            self.set.time_step(),
            self.set.settings().scale,
            self.set.periods(),
        )
    }

    fn price(
        &self,
        process: &Ar1Process,
        scenario: &Scenario,
        grid_max: &[Real],
        ri: Size,
    ) -> Result<PricedRating> {
        let set = self.set;
        let (ratings, periods) = (set.ratings(), set.periods());
        let d = set.default_state();

        if ri == d {
            let mut unit = vec![0.0; ratings];
            unit[d] = 1.0;
            return Ok((vec![unit; periods], None));
        }

        let boundaries = (0..periods)
            .map(|k| set.boundaries(ri, k))
            .collect::<Result<Vec<_>>>()?;
        let dt = set.time_step();
        let n = set.settings().grid_points;
        let rho = scenario.rho();

        let mut rows = Vec::with_capacity(periods);
        let mut densities: Vec<DensityGrid> = Vec::with_capacity(periods);
        for (k, (b, &shock)) in boundaries.iter().zip(scenario.shocks()).enumerate() {
            let kernel = GaussianKernel::stressed(process, dt, rho, shock);
            let start = b.default_threshold();
            ensure!(
                grid_max[k] > start,
                "horizon {} lies below the default threshold {start} for rating {ri} at period {k}",
                grid_max[k]
            );
            let grid = match densities.last() {
                None => kernel.seed(process.x0(), start, grid_max[k], n)?,
                Some(prev) => kernel.propagate(prev, start, grid_max[k], n)?,
            };
            rows.push(grid.band_probabilities(b));
            densities.push(grid);
        }
        info!(rating = ri, rho, "rating repriced");
        Ok((rows, Some(densities)))
    }

    fn store(&mut self, ri: Size, (rows, densities): PricedRating) {
        for (k, row) in rows.iter().enumerate() {
            for (rf, &p) in row.iter().enumerate() {
                self.matrices[k][(ri, rf)] = p;
            }
        }
        self.densities[ri] = densities;
    }

    /// `T[ri, rf, k]`; NaN until `ri` is priced.
    pub fn probability(&self, ri: Size, rf: Size, k: Size) -> Real {
        self.matrices[k][(ri, rf)]
    }

    /// Stressed matrices, one per period.
    pub fn matrices(&self) -> &[Matrix] {
        &self.matrices
    }

    /// Stressed densities of `ri`, once priced.
    pub fn densities(&self, ri: Size) -> Option<&[DensityGrid]> {
        self.densities.get(ri)?.as_deref()
    }

    /// The threshold set being repriced.
    pub fn threshold_set(&self) -> &ThresholdSet {
        self.set
    }

    /// Text rendering: the rows of `state` per period, or every matrix in
    /// full when `state` is `None`.
    pub fn format_matrix(&self, format: FormatType, accuracy: Size, state: Option<Size>) -> String {
        let mut out = String::new();
        match state {
            Some(ri) => {
                let _ = writeln!(out, "initial rating {ri}");
                for (k, m) in self.matrices.iter().enumerate() {
                    let _ = writeln!(out, "  period {k} {}", format_row(&m.row(ri), format, accuracy));
                }
            }
            None => {
                for (k, m) in self.matrices.iter().enumerate() {
                    let _ = writeln!(out, "period {k}");
                    for ri in 0..m.rows() {
                        let _ = writeln!(out, "  {}", format_row(&m.row(ri), format, accuracy));
                    }
                }
            }
        }
        out
    }
}
