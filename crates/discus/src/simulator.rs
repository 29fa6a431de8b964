//! Orchestration of a complete multiple scattering calculation

// crate modules
use crate::config::SimulationConfig;
use crate::detector::Detector;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::results::ResultGroup;
use crate::tracer::{PathTracer, QSampler};

// nscatter modules
use nscatter_geometry::Sample;
use nscatter_histogram::{build_inverse, prepare_qs, Histogram, InterpolationMethod};
use nscatter_sparse::{DetectorGrid, SparseDetectorSet};

// external crates
use kdam::par_tqdm;
use log::{debug, info, trace, warn};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

// standard library
use std::f64::consts::PI;

/// Builds the sparse grid from the angles of the modelled detectors
///
/// Called with every `(latitude, longitude)` pair, the number of rows, and
/// the number of columns. The default is [DetectorGrid::covering].
pub type GridBuilder =
    Box<dyn Fn(&[(f64, f64)], usize, usize) -> nscatter_sparse::Result<DetectorGrid> + Send + Sync>;

/// Fills in wavelength points that were not simulated
///
/// Implemented for [InterpolationMethod], which is used unless another
/// policy is set with
/// [with_interpolation()](MultipleScatteringSimulator::with_interpolation).
pub trait InterpolationPolicy: Send + Sync {
    /// Fill every point not listed in the ascending `simulated` indices
    fn fill(&self, histogram: &mut Histogram, simulated: &[usize]) -> nscatter_histogram::Result<()>;

    /// Interpolate `source` onto the points `x`
    fn resample(&self, source: &Histogram, x: &[f64]) -> nscatter_histogram::Result<Histogram>;
}

impl InterpolationPolicy for InterpolationMethod {
    fn fill(&self, histogram: &mut Histogram, simulated: &[usize]) -> nscatter_histogram::Result<()> {
        InterpolationMethod::fill(self, histogram, simulated)
    }

    fn resample(&self, source: &Histogram, x: &[f64]) -> nscatter_histogram::Result<Histogram> {
        InterpolationMethod::resample(self, source, x)
    }
}

/// Monte Carlo estimate of the multiple scattering in a sample
///
/// For every detector and wavelength, the mean weight of paths with exactly
/// n scatters approximates the fraction of neutrons reaching the detector
/// after n scatters. Detectors are simulated in parallel, each with its own
/// random stream seeded from the configured seed and its spectrum number,
/// so results do not depend on how the work is scheduled.
///
/// ```rust
/// # use nscatter_discus::{Detector, MultipleScatteringSimulator, SimulationConfig};
/// # use nscatter_geometry::{Cuboid, Material, Sample};
/// # use nscatter_histogram::Histogram;
/// # use nalgebra::Vector3;
/// let shape = Cuboid::new(Vector3::zeros(), 0.02, 0.02, 0.001).unwrap();
/// let sample = Sample::new(shape, Material::new("V", 5.08, 5.1, 0.0722).unwrap());
/// let s_of_q = Histogram::new(vec![0.0, 100.0], vec![1.0, 1.0]).unwrap();
///
/// let config = SimulationConfig::builder()
///     .n_scatters(2)
///     .n_paths_single(100)
///     .n_paths_multiple(100)
///     .quiet(true)
///     .build();
///
/// let detector = Detector::new(1, Vector3::new(0.0, 0.0, 2.0), vec![1.0, 2.0]);
/// let simulator = MultipleScatteringSimulator::new(config, sample, s_of_q).unwrap();
/// let results = simulator.run(&[detector]).unwrap();
///
/// assert!(results.get("MSResults_Scatter_1").is_some());
/// assert!(results.get("MSResults_Scatter_2_2_Summed").is_some());
/// ```
pub struct MultipleScatteringSimulator {
    config: SimulationConfig,
    sample: Sample,
    s_of_q: Histogram,
    scattering_xs: Option<Histogram>,
    grid_builder: GridBuilder,
    interpolation: Box<dyn InterpolationPolicy>,
}

impl std::fmt::Debug for MultipleScatteringSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MultipleScatteringSimulator")
            .field("config", &self.config)
            .field("sample", &self.sample)
            .field("s_of_q", &self.s_of_q)
            .field("scattering_xs", &self.scattering_xs)
            .finish_non_exhaustive()
    }
}

impl MultipleScatteringSimulator {
    /// Validate every input and prepare a simulation
    ///
    /// S(Q) must be point data with no negative values.
    pub fn new(config: SimulationConfig, sample: Sample, s_of_q: Histogram) -> Result<Self> {
        config.validate()?;
        sample.material().validate()?;

        s_of_q.check_point_data()?;
        if !s_of_q.is_non_negative() {
            let (q, s) = lowest_point(&s_of_q);
            return Err(Error::NegativeStructureFactor { q, s });
        }
        debug!("S(Q) with {}", s_of_q.summary());

        let interpolation = Box::new(config.interpolation);
        Ok(Self {
            config,
            sample,
            s_of_q,
            scattering_xs: None,
            grid_builder: Box::new(DetectorGrid::covering),
            interpolation,
        })
    }

    /// Use a wavenumber dependent scattering cross section
    ///
    /// The table has k in Å⁻¹ on x and the cross section in barns on y, and
    /// is looked up with flat interpolation.
    pub fn with_scattering_xs(mut self, table: Histogram) -> Result<Self> {
        table.check_point_data()?;
        if !table.is_non_negative() {
            let (k, xs) = lowest_point(&table);
            return Err(Error::NegativeCrossSection { k, xs });
        }
        debug!("Scattering cross section table with {}", table.summary());
        self.scattering_xs = Some(table);
        Ok(self)
    }

    /// Replace the construction of the sparse grid
    pub fn with_grid_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&[(f64, f64)], usize, usize) -> nscatter_sparse::Result<DetectorGrid> + Send + Sync + 'static,
    {
        self.grid_builder = Box::new(builder);
        self
    }

    /// Replace the interpolation of points that were not simulated
    pub fn with_interpolation(mut self, policy: impl InterpolationPolicy + 'static) -> Self {
        self.interpolation = Box::new(policy);
        self
    }

    /// The validated configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate every detector and collect the named outputs
    ///
    /// Monitors and masked detectors are never simulated and come back as
    /// zeros. Every output holds one histogram per input detector, in input
    /// order, on that detector's wavelength axis.
    pub fn run(&self, detectors: &[Detector]) -> Result<ResultGroup> {
        if detectors.is_empty() {
            return Err(Error::NoDetectors);
        }

        let modelled = detectors
            .iter()
            .filter(|d| d.is_simulated())
            .collect::<Vec<&Detector>>();
        if modelled.is_empty() {
            return Err(Error::NothingToSimulate);
        }
        for detector in &modelled {
            detector.validate()?;
        }

        info!(
            "Simulating {} of {} detectors up to {} scatters",
            modelled.len(),
            detectors.len(),
            self.config.n_scatters
        );

        let (spectra, diagnostics) = match self.config.sparse {
            Some(options) => self.run_sparse(detectors, &modelled, options.rows, options.columns)?,
            None => self.run_detectors(detectors, &modelled)?,
        };

        diagnostics.report(self.config.max_scatter_point_attempts);
        self.assemble(spectra)
    }

    /// Simulate the real detectors directly
    fn run_detectors(
        &self,
        detectors: &[Detector],
        modelled: &[&Detector],
    ) -> Result<(Vec<Spectra>, Diagnostics)> {
        if let Some(n_points) = self.config.n_wavelength_points {
            let clamped = modelled
                .iter()
                .filter(|d| n_points > d.wavelengths.len())
                .count();
            if clamped > 0 {
                warn!("Wavelength point count {n_points} exceeds the bins of {clamped} detectors");
                warn!("  - Every bin of those detectors will be simulated");
            }
        }

        let targets = modelled
            .iter()
            .map(|d| Target {
                seed_offset: d.spectrum_no,
                position: d.position,
                wavelengths: &d.wavelengths,
                bins: simulated_bins(d.wavelengths.len(), self.config.n_wavelength_points),
            })
            .collect::<Vec<Target>>();

        let (simulated, diagnostics) = self.simulate_targets(&targets)?;

        // put the unsimulated detectors back in their place
        let mut simulated = simulated.into_iter();
        let mut spectra = Vec::with_capacity(detectors.len());
        for detector in detectors {
            let next = if detector.is_simulated() {
                simulated.next()
            } else {
                None
            };
            spectra.push(next.unwrap_or_else(|| {
                Spectra::zeros(&detector.wavelengths, self.config.n_scatters)
            }));
        }
        Ok((spectra, diagnostics))
    }

    /// Simulate a coarse grid of synthetic detectors and interpolate
    fn run_sparse(
        &self,
        detectors: &[Detector],
        modelled: &[&Detector],
        rows: usize,
        columns: usize,
    ) -> Result<(Vec<Spectra>, Diagnostics)> {
        let angles = modelled.iter().map(|d| d.angles()).collect::<Vec<_>>();
        let grid = (self.grid_builder)(&angles, rows, columns)?;
        if grid.rows() < 3 || grid.columns() < 3 {
            warn!(
                "Sparse grid of {}x{} is too small to estimate the interpolation error",
                grid.rows(),
                grid.columns()
            );
            warn!("  - Errors will only include the simulated uncertainties");
        }

        // wavelengths are validated as ascending so the ends are the extremes
        let min_wavelength = modelled
            .iter()
            .map(|d| d.wavelengths[0])
            .fold(f64::INFINITY, f64::min);
        let max_wavelength = modelled
            .iter()
            .map(|d| d.wavelengths[d.wavelengths.len() - 1])
            .fold(f64::NEG_INFINITY, f64::max);
        let n_points = self
            .config
            .n_wavelength_points
            .unwrap_or(modelled[0].wavelengths.len());
        let wavelengths = linspace(min_wavelength, max_wavelength, n_points);

        let distance = modelled.iter().map(|d| d.distance()).sum::<f64>() / modelled.len() as f64;
        debug!(
            "Sparse grid of {} detectors at {} m with {} wavelengths",
            grid.number_of_detectors(),
            distance,
            wavelengths.len()
        );

        let template = SparseDetectorSet::new(grid, wavelengths.clone());
        let targets = (0..template.len())
            .map(|i| -> Result<Target> {
                Ok(Target {
                    seed_offset: i as u64,
                    position: template.direction(i)? * distance,
                    wavelengths: &wavelengths,
                    bins: (0..wavelengths.len()).collect(),
                })
            })
            .collect::<Result<Vec<Target>>>()?;

        let (simulated, diagnostics) = self.simulate_targets(&targets)?;

        // one set for the no absorption reference, then one per scatter order
        let mut sets = vec![template; self.config.n_scatters + 1];
        for (i, spectra) in simulated.into_iter().enumerate() {
            for (set, histogram) in sets.iter_mut().zip(spectra.into_histograms()) {
                set.set_histogram(i, histogram)?;
            }
        }

        let spectra = detectors
            .par_iter()
            .map(|detector| self.expand(detector, &sets))
            .collect::<Result<Vec<Spectra>>>()?;

        Ok((spectra, diagnostics))
    }

    /// Interpolate the sparse results onto one real detector
    fn expand(&self, detector: &Detector, sets: &[SparseDetectorSet]) -> Result<Spectra> {
        if !detector.is_simulated() {
            return Ok(Spectra::zeros(&detector.wavelengths, self.config.n_scatters));
        }

        let (latitude, longitude) = detector.angles();
        let mut histograms = sets
            .iter()
            .map(|set| -> Result<Histogram> {
                let angular = set.bilinear_interpolate(latitude, longitude)?;
                Ok(self.interpolation.resample(&angular, &detector.wavelengths)?)
            })
            .collect::<Result<Vec<Histogram>>>()?;

        let no_absorption = histograms.remove(0);
        Ok(Spectra {
            no_absorption,
            orders: histograms,
        })
    }

    /// Simulate every target in parallel, merging the diagnostics after
    fn simulate_targets(&self, targets: &[Target]) -> Result<(Vec<Spectra>, Diagnostics)> {
        let qsq = self.prepare_importance(targets)?;

        let results = par_tqdm!(
            targets
                .par_iter()
                .map(|target| self.simulate_target(target, qsq.as_ref())),
            bar_format = "Simulating detectors: {count}/{total} [{rate:.2} det/s]  ",
            disable = self.config.quiet
        )
        .collect::<Result<Vec<(Spectra, Diagnostics)>>>()?;
        if !self.config.quiet {
            eprintln!();
        }

        let (spectra, diagnostics): (Vec<Spectra>, Vec<Diagnostics>) = results.into_iter().unzip();
        let diagnostics = diagnostics
            .into_iter()
            .fold(Diagnostics::default(), Diagnostics::merge);
        Ok((spectra, diagnostics))
    }

    /// Q.S(Q) prepared up to the largest momentum transfer of any target
    ///
    /// Only needed for importance sampling, where the inverse cumulative
    /// distribution is then built per wavenumber from the same table.
    fn prepare_importance(&self, targets: &[Target]) -> Result<Option<Histogram>> {
        if !self.config.importance_sampling {
            return Ok(None);
        }
        let min_wavelength = targets
            .iter()
            .map(|t| t.wavelengths[0])
            .fold(f64::INFINITY, f64::min);
        let q_max = 2.0 * (2.0 * PI / min_wavelength);
        let qsq = prepare_qs(&self.s_of_q, q_max)?;
        debug!("Importance sampling from Q.S(Q) of {} points up to Q={q_max:.4}", qsq.len());
        Ok(Some(qsq))
    }

    /// Simulate every requested wavelength of one target
    fn simulate_target(
        &self,
        target: &Target,
        qsq: Option<&Histogram>,
    ) -> Result<(Spectra, Diagnostics)> {
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(target.seed_offset));
        let mut diagnostics = Diagnostics::default();
        let mut spectra = Spectra::zeros(target.wavelengths, self.config.n_scatters);

        for &bin in &target.bins {
            let wavelength = target.wavelengths[bin];
            let k = 2.0 * PI / wavelength;

            let sampler = match qsq {
                Some(qsq) => QSampler::Importance(build_inverse(qsq, k)?),
                None => QSampler::Uniform,
            };
            let tracer = PathTracer::new(
                &self.sample,
                &self.s_of_q,
                &sampler,
                wavelength,
                self.scattering_xs_at(k),
                self.config.max_scatter_point_attempts,
            );

            let mut point = |n_scatters: usize, no_absorption: bool| -> Result<(f64, f64)> {
                let batch = self.simulate_paths(
                    &tracer,
                    n_scatters,
                    &target.position,
                    no_absorption,
                    &mut rng,
                    &mut diagnostics,
                    target.seed_offset,
                )?;
                Ok(batch.normalised(n_scatters, sampler.is_uniform()))
            };

            let (y, e) = point(1, true)?;
            spectra.no_absorption.y[bin] = y;
            spectra.no_absorption.e[bin] = e;

            for (i, histogram) in spectra.orders.iter_mut().enumerate() {
                let (y, e) = point(i + 1, false)?;
                histogram.y[bin] = y;
                histogram.e[bin] = e;
            }
        }

        for histogram in spectra.histograms_mut() {
            self.interpolation.fill(histogram, &target.bins)?;
        }
        Ok((spectra, diagnostics))
    }

    /// Simulate paths until the requested number have succeeded
    #[allow(clippy::too_many_arguments)]
    fn simulate_paths<R: Rng>(
        &self,
        tracer: &PathTracer,
        n_scatters: usize,
        detector: &Vector3<f64>,
        no_absorption: bool,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
        spectrum: u64,
    ) -> Result<PathBatch> {
        let paths = self.config.paths_for(n_scatters);
        let mut batch = PathBatch::with_capacity(paths);
        let mut discarded = 0;

        while batch.weights.len() < paths {
            let result = tracer.scatter(n_scatters, detector, no_absorption, rng, diagnostics)?;
            if result.success {
                batch.weights.push(result.weight);
                batch.qss += result.qss;
            } else {
                discarded += 1;
                diagnostics.discarded_paths += 1;
                if discarded == 10 * paths {
                    warn!(
                        "{discarded} paths discarded for detector {spectrum} with only {} of {paths} complete",
                        batch.weights.len()
                    );
                }
                if discarded > 100 * paths {
                    return Err(Error::TooManyDiscardedPaths {
                        spectrum,
                        discarded,
                        paths,
                    });
                }
            }
        }
        Ok(batch)
    }

    /// Scattering cross section in barns at wavenumber `k`
    fn scattering_xs_at(&self, k: f64) -> f64 {
        match &self.scattering_xs {
            Some(table) => table.flat_at(k),
            None => self.sample.material().scattering_xs,
        }
    }

    /// Transpose per-detector spectra into the named outputs
    fn assemble(&self, spectra: Vec<Spectra>) -> Result<ResultGroup> {
        let n_detectors = spectra.len();
        let mut no_absorption = Vec::with_capacity(n_detectors);
        let mut orders = vec![Vec::with_capacity(n_detectors); self.config.n_scatters];

        for detector in spectra {
            no_absorption.push(detector.no_absorption);
            for (order, histogram) in orders.iter_mut().zip(detector.orders) {
                order.push(histogram);
            }
        }

        Ok(ResultGroup::assemble(
            &self.config.output_prefix,
            no_absorption,
            orders,
        )?)
    }
}

/// A position to simulate and the wavelength bins to simulate there
#[derive(Debug)]
struct Target<'a> {
    seed_offset: u64,
    position: Vector3<f64>,
    wavelengths: &'a [f64],
    bins: Vec<usize>,
}

/// Every output for one detector
#[derive(Debug, Clone)]
struct Spectra {
    no_absorption: Histogram,
    orders: Vec<Histogram>,
}

impl Spectra {
    fn zeros(wavelengths: &[f64], n_scatters: usize) -> Self {
        let zeros = Histogram::zeros(wavelengths.to_vec());
        Self {
            no_absorption: zeros.clone(),
            orders: vec![zeros; n_scatters],
        }
    }

    fn histograms_mut(&mut self) -> impl Iterator<Item = &mut Histogram> {
        std::iter::once(&mut self.no_absorption).chain(self.orders.iter_mut())
    }

    fn into_histograms(self) -> impl Iterator<Item = Histogram> {
        std::iter::once(self.no_absorption).chain(self.orders)
    }
}

/// Weights of the successful paths for one point
#[derive(Debug, Default)]
struct PathBatch {
    weights: Vec<f64>,
    qss: f64,
}

impl PathBatch {
    fn with_capacity(paths: usize) -> Self {
        Self {
            weights: Vec::with_capacity(paths),
            qss: 0.0,
        }
    }

    /// Mean weight and its standard error
    ///
    /// Uniform Q sampling weights every intermediate scatter by Q.S(Q), so
    /// both are divided by the mean Q.S(Q) per scatter raised to the number
    /// of intermediate scatters.
    fn normalised(&self, n_scatters: usize, uniform: bool) -> (f64, f64) {
        let (mean, error) = mean_and_standard_error(&self.weights);
        if !uniform || n_scatters < 2 {
            return (mean, error);
        }

        let intermediate = n_scatters - 1;
        let mean_qss = self.qss / (self.weights.len() * intermediate) as f64;
        let normalisation = mean_qss.powi(intermediate as i32);
        trace!("Mean Q.S(Q) {mean_qss:.6e} over {intermediate} scatters");
        if normalisation == 0.0 {
            (0.0, 0.0)
        } else {
            (mean / normalisation, error / normalisation)
        }
    }
}

/// Sample mean and the standard error of the mean
fn mean_and_standard_error(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, (variance / n as f64).sqrt())
}

/// Point with the smallest value, used to report negative tables
fn lowest_point(histogram: &Histogram) -> (f64, f64) {
    histogram
        .x
        .iter()
        .zip(&histogram.y)
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map_or((f64::NAN, f64::NAN), |(x, y)| (*x, *y))
}

/// Indices of the wavelength bins to simulate
///
/// Bins are taken at a regular step that always includes the first and last
/// bin. Requests for at least as many points as bins simulate everything.
fn simulated_bins(n_bins: usize, n_points: Option<usize>) -> Vec<usize> {
    let n_points = match n_points {
        Some(n) if n > 0 && n < n_bins => n,
        _ => return (0..n_bins).collect(),
    };

    let step = n_bins / n_points;
    if step >= n_bins {
        return vec![0];
    }

    let mut bins = (0..n_bins).step_by(step).collect::<Vec<usize>>();
    if bins.last() != Some(&(n_bins - 1)) {
        bins.push(n_bins - 1);
    }
    bins
}

/// Evenly spaced points from `min` to `max` inclusive
fn linspace(min: f64, max: f64, n_points: usize) -> Vec<f64> {
    if n_points < 2 || max <= min {
        return vec![min];
    }
    let step = (max - min) / (n_points - 1) as f64;
    let mut points = (0..n_points)
        .map(|i| min + i as f64 * step)
        .collect::<Vec<f64>>();
    points[n_points - 1] = max;
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_for_subsampling() {
        assert_eq!(simulated_bins(5, None), vec![0, 1, 2, 3, 4]);
        assert_eq!(simulated_bins(5, Some(9)), vec![0, 1, 2, 3, 4]);
        assert_eq!(simulated_bins(10, Some(4)), vec![0, 2, 4, 6, 8, 9]);
        assert_eq!(simulated_bins(10, Some(5)), vec![0, 2, 4, 6, 8, 9]);
        assert_eq!(simulated_bins(9, Some(3)), vec![0, 3, 6, 8]);
        assert_eq!(simulated_bins(10, Some(1)), vec![0]);
    }

    #[test]
    fn most_negative_point_is_reported() {
        let table = Histogram::new(vec![0.0, 1.0, 2.0, 3.0], vec![1.0, -0.5, -2.0, 0.5]).unwrap();
        assert_eq!(lowest_point(&table), (2.0, -2.0));
    }

    #[test]
    fn evenly_spaced_wavelengths() {
        assert_eq!(linspace(1.0, 2.0, 3), vec![1.0, 1.5, 2.0]);
        assert_eq!(linspace(1.0, 1.0, 4), vec![1.0]);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }

    #[test]
    fn standard_error_of_the_mean() {
        let (mean, error) = mean_and_standard_error(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(mean, 2.5);
        assert!((error - (5.0_f64 / 12.0).sqrt()).abs() < 1e-12);
        assert_eq!(mean_and_standard_error(&[7.0]), (7.0, 0.0));
    }

    #[test]
    fn uniform_normalisation() {
        let batch = PathBatch {
            weights: vec![2.0, 4.0],
            qss: 8.0,
        };
        // two paths with two intermediate scatters each, mean Q.S(Q) of 2
        let (mean, _) = batch.normalised(3, true);
        assert_eq!(mean, 3.0 / 4.0);

        // single scattering and importance sampling are left alone
        assert_eq!(batch.normalised(1, true).0, 3.0);
        assert_eq!(batch.normalised(3, false).0, 3.0);

        let empty = PathBatch {
            weights: vec![1.0],
            qss: 0.0,
        };
        assert_eq!(empty.normalised(2, true), (0.0, 0.0));
    }
}
