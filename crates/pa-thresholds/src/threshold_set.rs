//! `ThresholdSet`: calibrated migration thresholds and the densities
//! behind them.
//!
//! A set is created from a transition matrix set (to be calibrated), from a
//! bare shape, or from a persisted threshold document. Calibration runs one
//! initial rating at a time ([`ThresholdSet::fit`]) or fans out over all of
//! them ([`ThresholdSet::fit_all`]).

use crate::calibration::{grid_horizons, CalibrationContext, RatingCalibration};
use crate::density::DensityGrid;
use crate::parallel::map_ratings;
use crate::tables::format_threshold_row;
use crate::threshold::{Boundaries, Threshold, ThresholdArray};
use crate::transition::TransitionMatrixSet;
use pa_core::{ensure, Error, FormatType, IntegrationSettings, Real, Result, Settings, Size, Time};
use pa_math::{round, Rounding};
use pa_processes::Ar1Process;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Migration thresholds `A[ri, rf, k]` with their calibration state.
#[derive(Debug, Clone)]
pub struct ThresholdSet {
    thresholds: ThresholdArray,
    matrix_set: Option<TransitionMatrixSet>,
    settings: IntegrationSettings,
    time_step: Time,
    grid_max: Vec<Real>,
    densities: Vec<Option<Vec<DensityGrid>>>,
}

impl ThresholdSet {
    fn from_parts(thresholds: ThresholdArray, matrix_set: Option<TransitionMatrixSet>) -> Self {
        let ratings = thresholds.ratings();
        Self {
            thresholds,
            matrix_set,
            settings: Settings::instance().integration(),
            time_step: 1.0,
            grid_max: Vec::new(),
            densities: vec![None; ratings],
        }
    }

    /// An uncalibrated set of zero thresholds.
    pub fn with_shape(ratings: Size, periods: Size) -> Result<Self> {
        if ratings < 2 || periods == 0 {
            return Err(Error::Configuration(format!(
                "a threshold set needs at least two ratings and one period, \
                 got {ratings} ratings and {periods} periods"
            )));
        }
        Ok(Self::from_parts(ThresholdArray::new(ratings, periods), None))
    }

    /// A set to be calibrated against `matrix_set`, using the process-wide
    /// integration settings.
    pub fn from_matrix_set(matrix_set: TransitionMatrixSet) -> Self {
        let thresholds = ThresholdArray::new(matrix_set.ratings(), matrix_set.periods());
        Self::from_parts(thresholds, Some(matrix_set))
    }

    /// Load persisted thresholds (see [`ThresholdSet::to_json`]).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let periods: Vec<Vec<Vec<Threshold>>> = serde_json::from_str(json)?;
        Ok(Self::from_parts(ThresholdArray::from_periods(periods)?, None))
    }

    /// Load persisted thresholds from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Start a [`ThresholdSetBuilder`].
    pub fn builder() -> ThresholdSetBuilder {
        ThresholdSetBuilder::default()
    }

    /// Replace the integration settings.
    pub fn with_settings(mut self, settings: IntegrationSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    /// Set the time step used by conditional pricing of loaded thresholds.
    /// Calibration overwrites it with its own `dt`.
    pub fn with_time_step(mut self, dt: Time) -> Result<Self> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "time step must be positive, got {dt}"
            )));
        }
        self.time_step = dt;
        Ok(self)
    }

    // ── Calibration ──────────────────────────────────────────────────────────

    /// Calibrate the thresholds of initial rating `ri` for time step `dt`.
    pub fn fit(&mut self, process: &Ar1Process, ri: Size, dt: Time) -> Result<()> {
        self.thresholds.check_rating(ri)?;
        let grid_max = self.prepare(process, dt)?;
        let calibration = self.context(process, dt, &grid_max)?.calibrate(ri)?;
        self.set_horizon(dt, grid_max);
        self.install(ri, calibration);
        Ok(())
    }

    /// Calibrate every initial rating for time step `dt`.
    ///
    /// Ratings are independent tasks; successful ones are stored even when
    /// another fails, and the failure of the lowest rating index is returned.
    pub fn fit_all(&mut self, process: &Ar1Process, dt: Time) -> Result<()> {
        let grid_max = self.prepare(process, dt)?;
        let results = {
            let context = self.context(process, dt, &grid_max)?;
            map_ratings(self.ratings(), |ri| context.calibrate(ri))
        };
        self.set_horizon(dt, grid_max);

        let mut first_error = None;
        for (ri, result) in results.into_iter().enumerate() {
            match result {
                Ok(calibration) => self.install(ri, calibration),
                Err(e) => {
                    warn!(rating = ri, error = %e, "calibration failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn prepare(&self, process: &Ar1Process, dt: Time) -> Result<Vec<Real>> {
        let matrices = self.require_matrix_set()?;
        ensure!(dt > 0.0 && dt.is_finite(), "time step must be positive, got {dt}");
        self.settings.validate()?;
        Ok(grid_horizons(
            process,
            dt,
            self.settings.scale,
            matrices.periods(),
        ))
    }

    fn context<'a>(
        &'a self,
        process: &'a Ar1Process,
        dt: Time,
        grid_max: &'a [Real],
    ) -> Result<CalibrationContext<'a>> {
        Ok(CalibrationContext {
            matrices: self.require_matrix_set()?,
            process,
            settings: &self.settings,
            dt,
            grid_max,
        })
    }

    fn require_matrix_set(&self) -> Result<&TransitionMatrixSet> {
        self.matrix_set.as_ref().ok_or_else(|| {
            Error::Configuration("calibration requires a transition matrix set".into())
        })
    }

    /// Record the grid horizon of a calibration. Densities computed under a
    /// different time step or horizon are dropped.
    fn set_horizon(&mut self, dt: Time, grid_max: Vec<Real>) {
        if dt != self.time_step || grid_max != self.grid_max {
            if self.densities.iter().any(Option::is_some) {
                debug!(dt, "horizon changed, discarding stored densities");
            }
            self.densities.iter_mut().for_each(|d| *d = None);
        }
        self.time_step = dt;
        self.grid_max = grid_max;
    }

    fn install(&mut self, ri: Size, calibration: RatingCalibration) {
        self.thresholds.set_rating(ri, &calibration.thresholds);
        self.densities[ri] = if calibration.densities.is_empty() {
            None
        } else {
            Some(calibration.densities)
        };
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    /// The full threshold array.
    pub fn thresholds(&self) -> &ThresholdArray {
        &self.thresholds
    }

    /// `A[ri, rf, k]`.
    pub fn threshold(&self, ri: Size, rf: Size, k: Size) -> Result<Threshold> {
        self.thresholds.get(ri, rf, k)
    }

    /// Latent boundaries of `ri` at period `k`.
    pub fn boundaries(&self, ri: Size, k: Size) -> Result<Boundaries> {
        if k >= self.periods() {
            return Err(Error::IndexOutOfRange {
                index: k,
                size: self.periods(),
            });
        }
        self.thresholds.boundaries(ri, k)
    }

    /// Whether `b_1 > … > b_D` holds for `ri` at every period. Trivially
    /// true for the absorbing state.
    pub fn is_ordered(&self, ri: Size) -> bool {
        if ri == self.default_state() {
            return true;
        }
        (0..self.periods()).all(|k| {
            self.boundaries(ri, k)
                .map(|b| b.is_strictly_decreasing())
                .unwrap_or(false)
        })
    }

    /// Per-period densities of `ri`, when calibrated in this session.
    pub fn densities(&self, ri: Size) -> Option<&[DensityGrid]> {
        self.densities.get(ri)?.as_deref()
    }

    /// Whether densities are stored for `ri`.
    pub fn is_calibrated(&self, ri: Size) -> bool {
        self.densities(ri).is_some()
    }

    /// Grid horizon per period of the last calibration; empty before any.
    pub fn grid_max(&self) -> &[Real] {
        &self.grid_max
    }

    /// Number of rating states.
    pub fn ratings(&self) -> Size {
        self.thresholds.ratings()
    }

    /// Number of periods.
    pub fn periods(&self) -> Size {
        self.thresholds.periods()
    }

    /// Index of the absorbing Default state.
    pub fn default_state(&self) -> Size {
        self.ratings() - 1
    }

    /// Time step of the last calibration (1 for loaded thresholds unless set).
    pub fn time_step(&self) -> Time {
        self.time_step
    }

    /// The input matrices, if the set was built from them.
    pub fn matrix_set(&self) -> Option<&TransitionMatrixSet> {
        self.matrix_set.as_ref()
    }

    /// Integration settings.
    pub fn settings(&self) -> &IntegrationSettings {
        &self.settings
    }

    // ── Persistence ──────────────────────────────────────────────────────────

    /// Serialise as a JSON list of `R × R` matrices, one per period, with
    /// levels rounded to `accuracy` decimals and the markers written as
    /// `"nan"` and `"-inf"`.
    pub fn to_json(&self, accuracy: Size) -> Result<String> {
        let precision = accuracy.min(17) as i32;
        let periods: Vec<Vec<Vec<Threshold>>> = self
            .thresholds
            .to_periods()
            .into_iter()
            .map(|m| {
                m.into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|c| c.map(|v| round(v, precision, Rounding::Closest)))
                            .collect()
                    })
                    .collect()
            })
            .collect();
        Ok(serde_json::to_string_pretty(&periods)?)
    }

    /// Write [`ThresholdSet::to_json`] to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>, accuracy: Size) -> Result<()> {
        std::fs::write(path, self.to_json(accuracy)?)?;
        Ok(())
    }

    /// Text table of the thresholds, one block per period.
    pub fn format_thresholds(&self, format: FormatType, accuracy: Size) -> String {
        let mut out = String::new();
        for (k, matrix) in self.thresholds.to_periods().iter().enumerate() {
            let _ = writeln!(out, "period {k}");
            for row in matrix {
                let _ = writeln!(out, "  {}", format_threshold_row(row, format, accuracy));
            }
        }
        out
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Builder for a [`ThresholdSet`] from exactly one source.
#[derive(Debug, Clone, Default)]
pub struct ThresholdSetBuilder {
    shape: Option<(Size, Size)>,
    matrix_set: Option<TransitionMatrixSet>,
    json: Option<String>,
    file: Option<PathBuf>,
    settings: Option<IntegrationSettings>,
    time_step: Option<Time>,
}

impl ThresholdSetBuilder {
    /// Source: an empty array of the given shape.
    pub fn with_shape(mut self, ratings: Size, periods: Size) -> Self {
        self.shape = Some((ratings, periods));
        self
    }

    /// Source: transition matrices to calibrate against.
    pub fn with_matrix_set(mut self, matrix_set: TransitionMatrixSet) -> Self {
        self.matrix_set = Some(matrix_set);
        self
    }

    /// Source: a persisted threshold document.
    pub fn with_json(mut self, json: impl Into<String>) -> Self {
        self.json = Some(json.into());
        self
    }

    /// Source: a persisted threshold file.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Integration settings instead of the process-wide defaults.
    pub fn with_settings(mut self, settings: IntegrationSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Time step for loaded thresholds.
    pub fn with_time_step(mut self, dt: Time) -> Self {
        self.time_step = Some(dt);
        self
    }

    /// Build the set. Fails with [`Error::Configuration`] unless exactly one
    /// source was given.
    pub fn build(self) -> Result<ThresholdSet> {
        let Self {
            shape,
            matrix_set,
            json,
            file,
            settings,
            time_step,
        } = self;
        let mut set = match (shape, matrix_set, json, file) {
            (Some((ratings, periods)), None, None, None) => {
                ThresholdSet::with_shape(ratings, periods)?
            }
            (None, Some(matrix_set), None, None) => ThresholdSet::from_matrix_set(matrix_set),
            (None, None, Some(json), None) => ThresholdSet::from_json_str(&json)?,
            (None, None, None, Some(path)) => ThresholdSet::from_json_file(path)?,
            (None, None, None, None) => {
                return Err(Error::Configuration(
                    "one of a shape, a transition matrix set or a threshold file is required"
                        .into(),
                ))
            }
            _ => {
                return Err(Error::Configuration(
                    "more than one threshold set source given".into(),
                ))
            }
        };

        if let Some(settings) = settings {
            set = set.with_settings(settings)?;
        }
        if let Some(dt) = time_step {
            set = set.with_time_step(dt)?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state() -> TransitionMatrixSet {
        TransitionMatrixSet::from_rows(vec![
            vec![vec![0.99, 0.01], vec![0.0, 1.0]],
            vec![vec![0.98, 0.02], vec![0.0, 1.0]],
        ])
        .unwrap()
    }

    fn small() -> IntegrationSettings {
        IntegrationSettings::default().with_grid_points(400)
    }

    #[test]
    fn builder_requires_one_source() {
        assert!(matches!(
            ThresholdSet::builder().build(),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            ThresholdSet::builder()
                .with_shape(2, 1)
                .with_matrix_set(two_state())
                .build(),
            Err(Error::Configuration(_))
        ));
        let set = ThresholdSet::builder().with_shape(3, 2).build().unwrap();
        assert_eq!(set.ratings(), 3);
        assert_eq!(set.periods(), 2);
        assert_eq!(set.threshold(0, 1, 1).unwrap(), Threshold::Value(0.0));
    }

    #[test]
    fn degenerate_shape_is_a_configuration_error() {
        assert!(matches!(ThresholdSet::with_shape(1, 3), Err(Error::Configuration(_))));
        assert!(matches!(ThresholdSet::with_shape(3, 0), Err(Error::Configuration(_))));
    }

    #[test]
    fn fit_without_matrices_fails() {
        let mut set = ThresholdSet::with_shape(2, 1).unwrap();
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        assert!(matches!(set.fit(&p, 0, 1.0), Err(Error::Configuration(_))));
    }

    #[test]
    fn fit_checks_arguments() {
        let mut set = ThresholdSet::builder()
            .with_matrix_set(two_state())
            .with_settings(small())
            .build()
            .unwrap();
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        assert!(matches!(
            set.fit(&p, 2, 1.0),
            Err(Error::IndexOutOfRange { index: 2, size: 2 })
        ));
        assert!(matches!(set.fit(&p, 0, 0.0), Err(Error::Precondition(_))));
    }

    #[test]
    fn refit_with_new_step_drops_stale_densities() {
        let mut set = ThresholdSet::builder()
            .with_matrix_set(two_state())
            .with_settings(small())
            .build()
            .unwrap();
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        set.fit(&p, 0, 1.0).unwrap();
        assert!(set.is_calibrated(0));
        set.fit(&p, 1, 0.5).unwrap();
        assert!(!set.is_calibrated(0));
        assert_eq!(set.time_step(), 0.5);
        assert_eq!(set.grid_max().len(), 2);
    }

    #[test]
    fn thresholds_table_shows_markers() {
        let mut set = ThresholdSet::builder()
            .with_matrix_set(two_state())
            .with_settings(small())
            .build()
            .unwrap();
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        set.fit_all(&p, 1.0).unwrap();
        let table = set.format_thresholds(FormatType::Standard, 4);
        assert!(table.starts_with("period 0\n"));
        assert!(table.contains("-2.3263"));
        assert!(table.contains("-Inf"));
        assert!(table.contains("NaN"));
    }
}
