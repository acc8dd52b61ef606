//! Per-rating threshold calibration.
//!
//! Period 0 is closed form. Every later period first solves for the default
//! threshold with a bounded Newton iteration, then propagates the survival
//! density onto the new grid and reads the remaining thresholds off its
//! running mass.

use crate::density::{DensityGrid, GaussianKernel};
use crate::threshold::{rating_block, Threshold};
use crate::transition::TransitionMatrixSet;
use pa_core::{ensure, IntegrationSettings, Real, Result, Size, Time};
use pa_math::normal_cdf_inverse;
use pa_math::solvers1d::newton_raphson;
use pa_processes::{Ar1Process, StochasticProcess1D};
use tracing::{debug, info, warn};

/// Period-0 probabilities are kept this far away from 0 and 1 before the
/// normal quantile is taken.
pub const PROBABILITY_FLOOR: Real = 1.0e-12;

/// Thresholds and densities of one initial rating.
#[derive(Debug, Clone)]
pub(crate) struct RatingCalibration {
    /// Cells laid out `[rf][k]`.
    pub thresholds: Vec<Threshold>,
    /// One grid per period; empty for the absorbing state.
    pub densities: Vec<DensityGrid>,
}

/// Horizon of the grid at every period, `mu + scale·√dt·√(k+1)`.
pub fn grid_horizons(process: &Ar1Process, dt: Time, scale: Real, periods: Size) -> Vec<Real> {
    (0..periods)
        .map(|k| process.mu() + scale * dt.sqrt() * ((k + 1) as Real).sqrt())
        .collect()
}

/// Inputs shared by all initial ratings.
pub(crate) struct CalibrationContext<'a> {
    pub matrices: &'a TransitionMatrixSet,
    pub process: &'a Ar1Process,
    pub settings: &'a IntegrationSettings,
    pub dt: Time,
    pub grid_max: &'a [Real],
}

impl CalibrationContext<'_> {
    /// Calibrate every threshold of initial rating `ri`.
    pub fn calibrate(&self, ri: Size) -> Result<RatingCalibration> {
        let set = self.matrices;
        let (ratings, periods) = (set.ratings(), set.periods());
        let d = set.default_state();
        let mut thresholds = rating_block(ratings, periods, ri);

        if set.is_absorbing(ri) {
            return Ok(RatingCalibration {
                thresholds,
                densities: Vec::new(),
            });
        }
        self.check_default_curve(ri)?;

        let at = |rf: Size, k: Size| rf * periods + k;
        let n = self.settings.grid_points;
        let kernel = GaussianKernel::unconditional(self.process, self.dt);
        let mut densities = Vec::with_capacity(periods);

        // ── period 0: closed form ──
        let offset = self.process.offset(self.process.x0());
        let sqrt_dt = self.dt.sqrt();
        for rf in (0..ratings).filter(|&rf| rf != ri) {
            let mass = set
                .mass_below(ri, rf, 0, true)
                .clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
            thresholds[at(rf, 0)] = Threshold::Value(sqrt_dt * normal_cdf_inverse(mass)? + offset);
        }
        let start = level(&thresholds[at(d, 0)]);
        ensure!(
            self.grid_max[0] > start,
            "horizon {} lies below the default threshold {start} for rating {ri}",
            self.grid_max[0]
        );
        densities.push(kernel.seed(self.process.x0(), start, self.grid_max[0], n)?);

        // ── periods 1.. : root finding, propagation, rebanding ──
        for k in 1..periods {
            let prev = &densities[k - 1];
            let target = set.default_probability(ri, k) - set.default_probability(ri, k - 1);
            let seed = level(&thresholds[at(d, k - 1)]);
            let solution = newton_raphson(
                |a| {
                    let (gn, fn_) = kernel.crossing(prev, a);
                    (gn - target, fn_)
                },
                seed,
                self.settings.precision,
                self.settings.delta,
                self.settings.max_iterations,
            )?;
            let a = solution.root;
            debug!(
                rating = ri,
                period = k,
                iterations = solution.iterations,
                threshold = a,
                "default threshold solved"
            );
            thresholds[at(d, k)] = Threshold::Value(a);

            ensure!(
                self.grid_max[k] > a,
                "horizon {} lies below the default threshold {a} for rating {ri} at period {k}",
                self.grid_max[k]
            );
            let grid = kernel.propagate(prev, a, self.grid_max[k], n)?;

            for rf in (0..d).rev().filter(|&rf| rf != ri) {
                let target = set.mass_below(ri, rf, k, false);
                let (x, clamped) = grid.first_reaching(target);
                if clamped {
                    warn!(
                        rating = ri,
                        period = k,
                        target_rating = rf,
                        target,
                        mass = grid.mass(),
                        "target mass exceeds the grid mass, clamping to the horizon"
                    );
                }
                thresholds[at(rf, k)] = Threshold::Value(x);
            }
            densities.push(grid);
        }

        info!(rating = ri, periods, "rating calibrated");
        Ok(RatingCalibration {
            thresholds,
            densities,
        })
    }

    /// Period-0 default probability in `(0, 1)` and strictly increasing
    /// cumulative default probabilities.
    fn check_default_curve(&self, ri: Size) -> Result<()> {
        let set = self.matrices;
        let pd0 = set.default_probability(ri, 0);
        ensure!(
            pd0 > 0.0 && pd0 < 1.0,
            "period-0 default probability of rating {ri} must lie in (0, 1), got {pd0}"
        );
        for k in 1..set.periods() {
            let (before, now) = (
                set.default_probability(ri, k - 1),
                set.default_probability(ri, k),
            );
            ensure!(
                now > before,
                "cumulative default probability of rating {ri} must increase, \
                 got {before} then {now} at period {k}"
            );
        }
        Ok(())
    }
}

fn level(cell: &Threshold) -> Real {
    cell.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pa_core::Error;

    fn two_state() -> TransitionMatrixSet {
        TransitionMatrixSet::from_rows(vec![
            vec![vec![0.99, 0.01], vec![0.0, 1.0]],
            vec![vec![0.98, 0.02], vec![0.0, 1.0]],
        ])
        .unwrap()
    }

    fn run(set: &TransitionMatrixSet, process: &Ar1Process, ri: Size) -> Result<RatingCalibration> {
        let settings = IntegrationSettings::default().with_grid_points(600);
        let grid_max = grid_horizons(process, 1.0, settings.scale, set.periods());
        CalibrationContext {
            matrices: set,
            process,
            settings: &settings,
            dt: 1.0,
            grid_max: &grid_max,
        }
        .calibrate(ri)
    }

    #[test]
    fn horizons_grow_with_sqrt_time() {
        let p = Ar1Process::new(0.5, 1.0, 0.0).unwrap();
        let h = grid_horizons(&p, 4.0, 7.0, 2);
        assert_abs_diff_eq!(h[0], 14.5, epsilon = 1e-12);
        assert_abs_diff_eq!(h[1], 0.5 + 14.0 * 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn period_zero_is_normal_quantile() {
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        let cal = run(&two_state(), &p, 0).unwrap();
        // layout [rf][k] with 2 periods
        assert_abs_diff_eq!(level(&cal.thresholds[2]), -2.326_347_874_040_841, epsilon = 1e-9);
        assert_eq!(cal.thresholds[0], Threshold::SameState);
        assert_eq!(cal.densities.len(), 2);
        assert!(level(&cal.thresholds[3]).is_finite());
        assert_abs_diff_eq!(cal.densities[1].start(), level(&cal.thresholds[3]), epsilon = 1e-15);
    }

    #[test]
    fn absorbing_rating_has_no_grid() {
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        let cal = run(&two_state(), &p, 1).unwrap();
        assert!(cal.densities.is_empty());
        assert_eq!(
            cal.thresholds,
            vec![
                Threshold::Unreachable,
                Threshold::Unreachable,
                Threshold::SameState,
                Threshold::SameState
            ]
        );
    }

    #[test]
    fn flat_default_curve_is_rejected() {
        let set = TransitionMatrixSet::from_rows(vec![
            vec![vec![0.99, 0.01], vec![0.0, 1.0]],
            vec![vec![0.99, 0.01], vec![0.0, 1.0]],
        ])
        .unwrap();
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        assert!(matches!(run(&set, &p, 0), Err(Error::Precondition(_))));
    }

    #[test]
    fn zero_default_probability_is_rejected() {
        let set = TransitionMatrixSet::from_rows(vec![vec![
            vec![0.9, 0.1, 0.0],
            vec![0.1, 0.9, 0.0],
            vec![0.0, 0.0, 1.0],
        ]])
        .unwrap();
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        assert!(matches!(run(&set, &p, 0), Err(Error::Precondition(_))));
    }
}
