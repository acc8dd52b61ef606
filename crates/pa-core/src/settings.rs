//! Integration settings and process-wide defaults.
//!
//! [`IntegrationSettings`] controls the density grid and the default
//! threshold root finder. [`Settings`] is a process-wide singleton holding the
//! settings picked up by constructors that are not given explicit ones. It
//! is accessed via a `std::sync::OnceLock`; the value is stored behind a
//! `Mutex` so it can be changed from any thread.

use crate::errors::{Error, Result};
use crate::{Real, Size};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Grid resolution, root-finder tolerances and horizon heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    /// Number of points in every density grid.
    pub grid_points: Size,
    /// Newton step size below which the default threshold is accepted.
    pub precision: Real,
    /// Horizon scale: `grid_max[k] = mu + scale·√dt·√(k+1)`.
    pub scale: Real,
    /// Initial step seed of the Newton iteration.
    pub delta: Real,
    /// Maximum number of Newton steps per period.
    pub max_iterations: Size,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            grid_points: 3000,
            precision: 1.0e-8,
            scale: 7.0,
            delta: 2000.0,
            max_iterations: 100,
        }
    }
}

impl IntegrationSettings {
    /// Parse settings from a JSON object. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Same settings with a different grid resolution.
    pub fn with_grid_points(mut self, grid_points: Size) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Same settings with a different Newton tolerance.
    pub fn with_precision(mut self, precision: Real) -> Self {
        self.precision = precision;
        self
    }

    /// Same settings with a different iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: Size) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check that the settings describe a usable grid and solver.
    pub fn validate(&self) -> Result<()> {
        if self.grid_points < 3 {
            return Err(Error::Configuration(format!(
                "grid_points must be at least 3, got {}",
                self.grid_points
            )));
        }
        if !(self.precision > 0.0) {
            return Err(Error::Configuration(format!(
                "precision must be positive, got {}",
                self.precision
            )));
        }
        if !(self.scale > 0.0) {
            return Err(Error::Configuration(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if !(self.delta.abs() > self.precision) {
            return Err(Error::Configuration(format!(
                "delta ({}) must exceed precision ({})",
                self.delta, self.precision
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Process-wide settings used by the portfolio-analytics library.
pub struct Settings {
    integration: Mutex<IntegrationSettings>,
}

static INSTANCE: OnceLock<Settings> = OnceLock::new();

impl Settings {
    /// Return a reference to the global singleton.
    pub fn instance() -> &'static Settings {
        INSTANCE.get_or_init(|| Settings {
            integration: Mutex::new(IntegrationSettings::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, IntegrationSettings> {
        // The guarded value is plain data, a poisoned lock still holds a valid copy.
        self.integration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current default integration settings.
    pub fn integration(&self) -> IntegrationSettings {
        *self.lock()
    }

    /// Replace the default integration settings.
    pub fn set_integration(&self, settings: IntegrationSettings) -> Result<()> {
        settings.validate()?;
        *self.lock() = settings;
        Ok(())
    }

    /// Restore the built-in defaults.
    pub fn reset_integration(&self) {
        *self.lock() = IntegrationSettings::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = IntegrationSettings::default();
        assert_eq!(s.grid_points, 3000);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s = IntegrationSettings::from_json_str(r#"{ "grid_points": 500 }"#).unwrap();
        assert_eq!(s.grid_points, 500);
        assert_eq!(s.scale, 7.0);
        assert_eq!(s.max_iterations, 100);
    }

    #[test]
    fn rejects_degenerate_grid() {
        let s = IntegrationSettings::default().with_grid_points(2);
        assert!(matches!(s.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn rejects_seed_below_precision() {
        let s = IntegrationSettings {
            delta: 1e-9,
            ..IntegrationSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn singleton_rejects_invalid_settings() {
        let bad = IntegrationSettings::default().with_max_iterations(0);
        assert!(Settings::instance().set_integration(bad).is_err());
        assert!(Settings::instance().integration().validate().is_ok());
    }
}
