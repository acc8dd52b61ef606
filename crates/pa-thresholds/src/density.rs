//! Survival densities on uniform grids and the Gaussian transition kernel.
//!
//! A [`DensityGrid`] holds the density of the latent variable restricted to
//! the non-defaulted region `[default threshold, horizon]`; its total mass is
//! the survival probability. [`GaussianKernel`] moves such a density one
//! period forward by trapezoid convolution and supplies the two integrals
//! the default-threshold root finder needs.

use crate::threshold::Boundaries;
use pa_core::{ensure, ensure_post, Real, Result, Size, Time};
use pa_math::integrals::{band_trapezoid, prefix_mass, trapezoid_uniform};
use pa_math::{normal_cdf, normal_pdf};
use pa_processes::StochasticProcess1D;

/// A density sampled on `G` uniformly spaced points.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    points: Vec<Real>,
    density: Vec<Real>,
    step: Real,
}

impl DensityGrid {
    /// Sample `f` on `n` uniform points spanning `[start, end]`.
    pub fn from_fn(start: Real, end: Real, n: Size, f: impl Fn(Real) -> Real) -> Result<Self> {
        ensure!(n >= 2, "a density grid needs at least two points, got {n}");
        ensure!(
            start.is_finite() && end.is_finite() && end > start,
            "grid bounds must be finite with start < end, got [{start}, {end}]"
        );
        let step = (end - start) / (n - 1) as Real;
        let points: Vec<Real> = (0..n).map(|i| start + step * i as Real).collect();
        let density = points.iter().map(|&x| f(x)).collect();
        Ok(Self {
            points,
            density,
            step,
        })
    }

    /// Grid abscissae, ascending.
    pub fn points(&self) -> &[Real] {
        &self.points
    }

    /// Density values at [`points`](Self::points).
    pub fn density(&self) -> &[Real] {
        &self.density
    }

    /// Uniform spacing.
    pub fn step(&self) -> Real {
        self.step
    }

    /// First grid point.
    pub fn start(&self) -> Real {
        self.points[0]
    }

    /// Last grid point.
    pub fn end(&self) -> Real {
        self.points[self.points.len() - 1]
    }

    /// Number of points.
    pub fn len(&self) -> Size {
        self.points.len()
    }

    /// Always false; grids hold at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Trapezoid integral over the whole grid: the survival probability.
    pub fn mass(&self) -> Real {
        trapezoid_uniform(&self.density, self.step)
    }

    /// Mass of the band `[lo, hi]`.
    pub fn band_mass(&self, lo: Real, hi: Real) -> Real {
        band_trapezoid(&self.points, &self.density, lo, hi)
    }

    /// Grid point at which the running sum `Σ_{i≤c} f_i · h` first reaches
    /// `target`, scanning up from the default threshold.
    ///
    /// Returns the point and whether the target exceeded the total and the
    /// scan was clamped to the last point.
    pub fn first_reaching(&self, target: Real) -> (Real, bool) {
        let sums = prefix_mass(&self.density, self.step);
        let c = sums.partition_point(|&m| m < target);
        if c == sums.len() {
            (self.end(), true)
        } else {
            (self.points[c], false)
        }
    }

    /// Transition probabilities to every rating implied by `boundaries`.
    ///
    /// Live rating `rf` receives the mass of `[b_{rf+1}, b_rf]`; Default
    /// receives one minus the grid mass. The live bands partition the grid,
    /// so the row sums to one whenever the boundaries are ordered and `b_D`
    /// is the grid start.
    pub fn band_probabilities(&self, boundaries: &Boundaries) -> Vec<Real> {
        let d = boundaries.len();
        let mut row: Vec<Real> = (0..d)
            .map(|rf| {
                let (lo, hi) = boundaries.band(rf);
                self.band_mass(lo, hi)
            })
            .collect();
        row.push(1.0 - self.mass());
        row
    }
}

// ── Gaussian kernel ───────────────────────────────────────────────────────────

/// One-period Gaussian transition law of the latent variable,
/// `x' ~ N(E[x'|y] + shift, (σ(y) · vol_factor)²)`.
///
/// The unconditional kernel has no shift and unit factor. Under a scenario
/// shock `s` with sensitivity `rho` the mean moves by `rho · √dt · s` and
/// the idiosyncratic volatility shrinks by `√(1 − rho²)`.
#[derive(Debug, Clone, Copy)]
pub struct GaussianKernel<'p, P: StochasticProcess1D + ?Sized> {
    process: &'p P,
    dt: Time,
    shift: Real,
    vol_factor: Real,
}

impl<'p, P: StochasticProcess1D + ?Sized> GaussianKernel<'p, P> {
    /// The process's own one-step law.
    pub fn unconditional(process: &'p P, dt: Time) -> Self {
        Self {
            process,
            dt,
            shift: 0.0,
            vol_factor: 1.0,
        }
    }

    /// The one-step law conditional on systematic shock `shock`.
    pub fn stressed(process: &'p P, dt: Time, rho: Real, shock: Real) -> Self {
        Self {
            process,
            dt,
            shift: rho * dt.sqrt() * shock,
            vol_factor: (1.0 - rho * rho).sqrt(),
        }
    }

    /// Conditional mean of the next value given `y`.
    #[inline]
    pub fn mean(&self, y: Real) -> Real {
        self.process.expectation_1d(0.0, y, self.dt) + self.shift
    }

    /// Conditional standard deviation of the next value given `y`.
    #[inline]
    pub fn std_dev(&self, y: Real) -> Real {
        self.process.std_deviation_1d(0.0, y, self.dt) * self.vol_factor
    }

    /// Density of the first period started from the point mass at `x0`,
    /// sampled on `[start, end]`.
    pub fn seed(&self, x0: Real, start: Real, end: Real, n: Size) -> Result<DensityGrid> {
        let m = self.mean(x0);
        let s = self.std_dev(x0);
        ensure!(s > 0.0, "kernel standard deviation must be positive, got {s}");
        DensityGrid::from_fn(start, end, n, |x| normal_pdf((x - m) / s) / s)
    }

    /// `gn(a) = ∫ f(y) Φ((a − m(y))/σ(y)) dy` and
    /// `fn(a) = ∫ f(y) φ((a − m(y))/σ(y))/σ(y) dy` over the grid of `prev`.
    ///
    /// `gn` is the probability of surviving to the previous period and
    /// falling below `a` in this one; `fn` is its derivative in `a`.
    pub fn crossing(&self, prev: &DensityGrid, a: Real) -> (Real, Real) {
        let (g, f): (Vec<Real>, Vec<Real>) = prev
            .points()
            .iter()
            .zip(prev.density())
            .map(|(&y, &fy)| {
                let s = self.std_dev(y);
                let z = (a - self.mean(y)) / s;
                (fy * normal_cdf(z), fy * normal_pdf(z) / s)
            })
            .unzip();
        (
            trapezoid_uniform(&g, prev.step()),
            trapezoid_uniform(&f, prev.step()),
        )
    }

    /// Convolve `prev` with the kernel onto `n` points spanning
    /// `[start, end]`:
    /// `f(x_i) = ∫ prev(y) φ((x_i − m(y))/σ(y))/σ(y) dy`.
    pub fn propagate(
        &self,
        prev: &DensityGrid,
        start: Real,
        end: Real,
        n: Size,
    ) -> Result<DensityGrid> {
        let h = prev.step();
        let last = prev.len() - 1;
        // trapezoid weights folded into the previous density
        let sources: Vec<(Real, Real, Real)> = prev
            .points()
            .iter()
            .zip(prev.density())
            .enumerate()
            .map(|(j, (&y, &fy))| {
                let w = if j == 0 || j == last { 0.5 * h } else { h };
                (self.mean(y), self.std_dev(y), w * fy)
            })
            .collect();
        ensure!(
            sources.iter().all(|&(_, s, _)| s > 0.0),
            "kernel standard deviation must be positive"
        );

        let grid = DensityGrid::from_fn(start, end, n, |x| {
            sources
                .iter()
                .map(|&(m, s, w)| w * normal_pdf((x - m) / s) / s)
                .sum()
        })?;
        ensure_post!(
            grid.density().iter().all(|v| v.is_finite()),
            "propagated density on [{start}, {end}] is not finite"
        );
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pa_processes::Ar1Process;

    fn standard_normal_grid(n: Size) -> DensityGrid {
        DensityGrid::from_fn(-8.0, 8.0, n, normal_pdf).unwrap()
    }

    #[test]
    fn grid_geometry() {
        let g = DensityGrid::from_fn(-1.0, 1.0, 5, |_| 1.0).unwrap();
        assert_eq!(g.points(), &[-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(g.step(), 0.5);
        assert_eq!(g.start(), -1.0);
        assert_eq!(g.end(), 1.0);
        assert_abs_diff_eq!(g.mass(), 2.0, epsilon = 1e-15);
        assert!(DensityGrid::from_fn(1.0, 1.0, 5, |_| 1.0).is_err());
        assert!(DensityGrid::from_fn(0.0, 1.0, 1, |_| 1.0).is_err());
    }

    #[test]
    fn first_reaching_scans_prefix_sums() {
        let g = DensityGrid::from_fn(0.0, 4.0, 5, |_| 1.0).unwrap();
        // running sums 1, 2, 3, 4, 5
        assert_eq!(g.first_reaching(2.0), (1.0, false));
        assert_eq!(g.first_reaching(2.5), (2.0, false));
        assert_eq!(g.first_reaching(0.0), (0.0, false));
        assert_eq!(g.first_reaching(7.0), (4.0, true));
    }

    #[test]
    fn bands_partition_the_grid() {
        let g = standard_normal_grid(801);
        let b = Boundaries::new(vec![1.0, -0.5, g.start()]);
        let row = g.band_probabilities(&b);
        assert_eq!(row.len(), 4);
        assert_abs_diff_eq!(row.iter().sum::<Real>(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(row[0], 1.0 - normal_cdf(1.0), epsilon = 1e-4);
        assert_abs_diff_eq!(row[1], normal_cdf(1.0) - normal_cdf(-0.5), epsilon = 1e-4);
    }

    #[test]
    fn crossing_matches_closed_form_for_point_like_density() {
        // prev ≈ N(0, 1), kernel N(y, 1): x' ~ N(0, 2)
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        let k = GaussianKernel::unconditional(&p, 1.0);
        let prev = standard_normal_grid(1601);
        let a = -1.3;
        let (gn, fn_) = k.crossing(&prev, a);
        let s2 = 2.0_f64.sqrt();
        assert_abs_diff_eq!(gn, normal_cdf(a / s2), epsilon = 1e-6);
        assert_abs_diff_eq!(fn_, normal_pdf(a / s2) / s2, epsilon = 1e-6);
    }

    #[test]
    fn propagation_convolves_gaussians() {
        let p = Ar1Process::new(0.1, 0.5, 0.0).unwrap();
        let k = GaussianKernel::unconditional(&p, 1.0);
        let prev = standard_normal_grid(1601);
        let next = k.propagate(&prev, -8.0, 8.0, 401).unwrap();
        // x' = 0.1 + 0.5 y + ε  ~  N(0.1, 1.25)
        let s = 1.25_f64.sqrt();
        for (&x, &f) in next.points().iter().zip(next.density()).step_by(40) {
            assert_abs_diff_eq!(f, normal_pdf((x - 0.1) / s) / s, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(next.mass(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn stressed_kernel_shifts_and_shrinks() {
        let p = Ar1Process::new(0.0, 1.0, 0.0).unwrap();
        let k = GaussianKernel::stressed(&p, 4.0, 0.6, -1.0);
        assert_abs_diff_eq!(k.mean(0.5), 0.5 - 1.2, epsilon = 1e-15);
        assert_abs_diff_eq!(k.std_dev(0.5), 2.0 * 0.8, epsilon = 1e-15);

        let neutral = GaussianKernel::stressed(&p, 4.0, 0.0, 3.0);
        let plain = GaussianKernel::unconditional(&p, 4.0);
        assert_eq!(neutral.mean(0.3), plain.mean(0.3));
        assert_eq!(neutral.std_dev(0.3), plain.std_dev(0.3));
    }
}
