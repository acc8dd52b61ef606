//! Benchmarks for threshold calibration, reconstruction and stress pricing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pa_core::IntegrationSettings;
use pa_math::Matrix;
use pa_processes::Ar1Process;
use pa_thresholds::{ConditionalTransitionMatrix, Scenario, ThresholdSet, TransitionMatrixSet, Validator};

fn four_state(periods: usize) -> TransitionMatrixSet {
    let m = Matrix::from_row_slice(
        4,
        4,
        &[
            0.90, 0.07, 0.02, 0.01, //
            0.05, 0.85, 0.07, 0.03, //
            0.02, 0.08, 0.80, 0.10, //
            0.00, 0.00, 0.00, 1.00,
        ],
    );
    TransitionMatrixSet::from_power(&m, periods).unwrap()
}

fn calibrated(grid_points: usize) -> (ThresholdSet, Ar1Process) {
    let process = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
    let mut set = ThresholdSet::builder()
        .with_matrix_set(four_state(3))
        .with_settings(IntegrationSettings::default().with_grid_points(grid_points))
        .build()
        .unwrap();
    set.fit_all(&process, 1.0).unwrap();
    (set, process)
}

fn benchmark_fit_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_all");
    group.sample_size(10);
    let process = Ar1Process::new(0.0, 1.0, 0.0).unwrap();

    for grid_points in [500, 1000, 3000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(grid_points),
            &grid_points,
            |b, &n| {
                b.iter(|| {
                    let mut set = ThresholdSet::builder()
                        .with_matrix_set(four_state(3))
                        .with_settings(IntegrationSettings::default().with_grid_points(n))
                        .build()
                        .unwrap();
                    set.fit_all(black_box(&process), 1.0).unwrap();
                    set
                })
            },
        );
    }

    group.finish();
}

fn benchmark_reconstruct(c: &mut Criterion) {
    let (set, _) = calibrated(1000);
    c.bench_function("reconstruct_1000", |b| {
        b.iter(|| Validator::new(black_box(&set)).reconstruct())
    });
}

fn benchmark_stress(c: &mut Criterion) {
    let (set, process) = calibrated(1000);
    let scenario = Scenario::new(vec![-1.0, -0.5, 0.0], 0.3).unwrap();
    c.bench_function("conditional_fit_all_1000", |b| {
        b.iter(|| {
            let mut ctm = ConditionalTransitionMatrix::new(&set);
            ctm.fit_all(&process, black_box(&scenario)).unwrap();
            ctm.probability(0, 3, 2)
        })
    });
}

criterion_group!(
    benches,
    benchmark_fit_all,
    benchmark_reconstruct,
    benchmark_stress
);
criterion_main!(benches);
