//! Integration tests for threshold calibration.
//!
//! These exercise `ThresholdSet::fit` / `fit_all` end to end: closed-form
//! first period, Newton default thresholds, rebanding of the propagated
//! density, and the marker conventions.

use approx::assert_abs_diff_eq;
use pa_core::{Error, IntegrationSettings, Real};
use pa_math::{normal_cdf_inverse, Matrix};
use pa_processes::Ar1Process;
use pa_thresholds::{Threshold, ThresholdSet, TransitionMatrixSet, Validator};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("pa_thresholds=debug")
        .try_init();
}

fn one_period() -> Matrix {
    Matrix::from_rows(&[
        vec![0.90, 0.07, 0.02, 0.01],
        vec![0.05, 0.85, 0.07, 0.03],
        vec![0.02, 0.08, 0.80, 0.10],
        vec![0.00, 0.00, 0.00, 1.00],
    ])
    .unwrap()
}

fn two_state() -> TransitionMatrixSet {
    TransitionMatrixSet::from_rows(vec![
        vec![vec![0.99, 0.01], vec![0.0, 1.0]],
        vec![vec![0.98, 0.02], vec![0.0, 1.0]],
    ])
    .unwrap()
}

fn calibrate(matrices: TransitionMatrixSet, grid_points: usize) -> ThresholdSet {
    let mut set = ThresholdSet::builder()
        .with_matrix_set(matrices)
        .with_settings(IntegrationSettings::default().with_grid_points(grid_points))
        .build()
        .unwrap();
    set.fit_all(&Ar1Process::new(0.0, 1.0, 0.0).unwrap(), 1.0)
        .unwrap();
    set
}

fn level(set: &ThresholdSet, ri: usize, rf: usize, k: usize) -> Real {
    set.threshold(ri, rf, k).unwrap().value().unwrap()
}

// ───────────────────────── two-state scenario ─────────────────────────

#[test]
fn test_two_state_end_to_end() {
    init_tracing();
    let set = calibrate(two_state(), 800);

    let expected = normal_cdf_inverse(0.01).unwrap();
    assert_abs_diff_eq!(level(&set, 0, 1, 0), expected, epsilon = 1e-9);
    assert_abs_diff_eq!(expected, -2.326_347_874, epsilon = 1e-8);

    let rec = Validator::new(&set).reconstruct();
    assert_abs_diff_eq!(rec.reconstructed[0][(0, 1)], 0.01, epsilon = 1e-4);
    assert_abs_diff_eq!(rec.reconstructed[1][(0, 1)], 0.02, epsilon = 5e-4);
    assert_abs_diff_eq!(rec.reconstructed[1][(0, 0)], 0.98, epsilon = 5e-4);
}

#[test]
fn test_offset_and_time_step_shift_period_zero() {
    let mut set = ThresholdSet::builder()
        .with_matrix_set(two_state())
        .with_settings(IntegrationSettings::default().with_grid_points(400))
        .build()
        .unwrap();
    let process = Ar1Process::new(0.2, 0.5, 1.0).unwrap();
    set.fit(&process, 0, 0.25).unwrap();
    // √dt · Φ⁻¹(0.01) + mu + phi1 · x0
    let expected = 0.5 * normal_cdf_inverse(0.01).unwrap() + 0.7;
    assert_abs_diff_eq!(level(&set, 0, 1, 0), expected, epsilon = 1e-9);
    assert_eq!(set.time_step(), 0.25);
    assert_abs_diff_eq!(set.grid_max()[0], 0.2 + 7.0 * 0.5, epsilon = 1e-12);
}

// ───────────────────────── marker conventions ─────────────────────────

#[test]
fn test_same_state_and_absorbing_markers() {
    let set = calibrate(TransitionMatrixSet::from_power(&one_period(), 3).unwrap(), 600);
    let d = set.default_state();
    for k in 0..set.periods() {
        for ri in 0..set.ratings() {
            assert_eq!(set.threshold(ri, ri, k).unwrap(), Threshold::SameState);
        }
        for rf in 0..d {
            assert_eq!(set.threshold(d, rf, k).unwrap(), Threshold::Unreachable);
        }
        for ri in 0..d {
            for rf in (0..set.ratings()).filter(|&rf| rf != ri) {
                assert!(level(&set, ri, rf, k).is_finite());
            }
        }
    }
    assert!(set.densities(d).is_none());
}

// ───────────────────────── ordering and grids ─────────────────────────

#[test]
fn test_thresholds_strictly_ordered() {
    init_tracing();
    let set = calibrate(TransitionMatrixSet::from_power(&one_period(), 3).unwrap(), 800);
    for ri in 0..set.ratings() {
        assert!(set.is_ordered(ri), "rating {ri} has crossing thresholds");
    }
    // downgrades sit below upgrades for the middle rating
    for k in 0..set.periods() {
        assert!(level(&set, 1, 0, k) > level(&set, 1, 2, k));
        assert!(level(&set, 1, 2, k) > level(&set, 1, 3, k));
    }
}

#[test]
fn test_density_grids_span_default_threshold_to_horizon() {
    let set = calibrate(TransitionMatrixSet::from_power(&one_period(), 3).unwrap(), 500);
    let d = set.default_state();
    for ri in 0..d {
        let grids = set.densities(ri).unwrap();
        assert_eq!(grids.len(), 3);
        for (k, grid) in grids.iter().enumerate() {
            assert_eq!(grid.len(), 500);
            assert_abs_diff_eq!(grid.start(), level(&set, ri, d, k), epsilon = 1e-15);
            assert_abs_diff_eq!(grid.end(), set.grid_max()[k], epsilon = 1e-12);
            assert_abs_diff_eq!(
                grid.step(),
                (grid.end() - grid.start()) / 499.0,
                epsilon = 1e-12
            );
            assert!(grid.density().iter().all(|&f| f >= 0.0));
        }
    }
}

#[test]
fn test_single_fit_matches_fit_all() {
    let matrices = TransitionMatrixSet::from_power(&one_period(), 2).unwrap();
    let all = calibrate(matrices.clone(), 400);
    let mut one = ThresholdSet::builder()
        .with_matrix_set(matrices)
        .with_settings(IntegrationSettings::default().with_grid_points(400))
        .build()
        .unwrap();
    let process = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
    one.fit(&process, 1, 1.0).unwrap();
    for k in 0..2 {
        for rf in 0..4 {
            assert_eq!(
                one.threshold(1, rf, k).unwrap(),
                all.threshold(1, rf, k).unwrap()
            );
        }
    }
    assert_eq!(one.densities(1), all.densities(1));
}

// ───────────────────────── failures ─────────────────────────

#[test]
fn test_newton_iteration_cap_reports_non_convergence() {
    let mut set = ThresholdSet::builder()
        .with_matrix_set(two_state())
        .with_settings(
            IntegrationSettings::default()
                .with_grid_points(400)
                .with_precision(1e-14)
                .with_max_iterations(1),
        )
        .build()
        .unwrap();
    let err = set
        .fit(&Ar1Process::new(0.0, 1.0, 0.0).unwrap(), 0, 1.0)
        .unwrap_err();
    assert!(matches!(err, Error::NonConvergence { iterations: 1, .. }));
}

#[test]
fn test_fit_all_keeps_successful_ratings() {
    // rating 1 has a flat default curve and cannot be calibrated
    let matrices = TransitionMatrixSet::from_rows(vec![
        vec![
            vec![0.95, 0.04, 0.01],
            vec![0.05, 0.90, 0.05],
            vec![0.0, 0.0, 1.0],
        ],
        vec![
            vec![0.93, 0.05, 0.02],
            vec![0.06, 0.89, 0.05],
            vec![0.0, 0.0, 1.0],
        ],
    ])
    .unwrap();
    let mut set = ThresholdSet::builder()
        .with_matrix_set(matrices)
        .with_settings(IntegrationSettings::default().with_grid_points(400))
        .build()
        .unwrap();
    let err = set
        .fit_all(&Ar1Process::new(0.0, 1.0, 0.0).unwrap(), 1.0)
        .unwrap_err();
    assert!(matches!(err, Error::Precondition(_)));
    assert!(set.is_calibrated(0));
    assert!(!set.is_calibrated(1));
    assert_eq!(set.threshold(2, 2, 1).unwrap(), Threshold::SameState);
}

#[test]
fn test_invalid_settings_are_rejected() {
    let result = ThresholdSet::builder()
        .with_matrix_set(two_state())
        .with_settings(IntegrationSettings::default().with_grid_points(2))
        .build();
    assert!(matches!(result, Err(Error::Configuration(_))));
}
