//! Tabulated lookups and fill-in interpolation

// crate modules
use crate::error::{Error, Result};
use crate::histogram::Histogram;

// nscatter modules
use nscatter_utils::SliceExt;

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// Step lookup, taking the closest tabulated point at or below `x`
///
/// Queries outside the table clamp to the nearest end point. The `xs` are
/// expected in ascending order, repeated values are allowed.
///
/// ```rust
/// # use nscatter_histogram::interpolate_flat;
/// let xs = [1.0, 2.0, 3.0];
/// let ys = [10.0, 20.0, 30.0];
/// assert_eq!(interpolate_flat(&xs, &ys, 2.9), 20.0);
/// assert_eq!(interpolate_flat(&xs, &ys, 3.0), 30.0);
/// assert_eq!(interpolate_flat(&xs, &ys, 0.0), 10.0);
/// ```
pub fn interpolate_flat(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    match (xs.first(), xs.last()) {
        (Some(first), _) if x < *first => ys[0],
        (_, Some(last)) if x >= *last => ys[ys.len() - 1],
        (Some(_), Some(_)) => ys[xs.upper_bound(x) - 1],
        _ => f64::NAN,
    }
}

/// Linear lookup between the bracketing points
///
/// Queries outside the table clamp to the nearest end point.
///
/// ```rust
/// # use nscatter_histogram::interpolate_linear;
/// let xs = [0.0, 2.0];
/// let ys = [0.0, 4.0];
/// assert_eq!(interpolate_linear(&xs, &ys, 0.5), 1.0);
/// assert_eq!(interpolate_linear(&xs, &ys, 5.0), 4.0);
/// ```
pub fn interpolate_linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    match (xs.first(), xs.last()) {
        (Some(first), _) if x <= *first => ys[0],
        (_, Some(last)) if x >= *last => ys[ys.len() - 1],
        (Some(_), Some(_)) => {
            let i = xs.upper_bound(x) - 1;
            let fraction = (x - xs[i]) / (xs[i + 1] - xs[i]);
            ys[i] + fraction * (ys[i + 1] - ys[i])
        }
        _ => f64::NAN,
    }
}

/// Square-root lookup for inverse cumulative distributions
///
/// Solves `y = a√(x - b)` through the two bracketing points, which is exact
/// for the inverse of a cumulative integral of `Q·S(Q)` with S(Q) constant
/// over the interval. Queries outside the table clamp to the nearest end
/// point.
///
/// Fails if the bracketing points do not define a valid `(a, b)` pair.
///
/// ```rust
/// # use nscatter_histogram::interpolate_square_root;
/// // cumulative of Q over [0, 2], normalised: P = Q²/4
/// let probability = [0.0, 0.25, 1.0];
/// let q = [0.0, 1.0, 2.0];
/// let sampled = interpolate_square_root(&probability, &q, 0.5625).unwrap();
/// assert!((sampled - 1.5).abs() < 1e-12);
/// ```
pub fn interpolate_square_root(xs: &[f64], ys: &[f64], x: f64) -> Result<f64> {
    let (Some(first), Some(last)) = (xs.first(), xs.last()) else {
        return Err(Error::EmptyHistogram);
    };

    if x < *first {
        return Ok(ys[0]);
    }
    if x >= *last {
        return Ok(ys[ys.len() - 1]);
    }

    // repeated x values are skipped so x0 <= x < x1 with x0 < x1
    let i = xs.upper_bound(x) - 1;
    let (x0, x1) = (xs[i], xs[i + 1]);
    let (y0, y1) = (ys[i], ys[i + 1]);

    let a_squared = (y1 * y1 - y0 * y0) / (x1 - x0);
    if a_squared == 0.0 || !a_squared.is_finite() {
        return Err(Error::DegenerateSquareRoot { x0, x1, y0, y1 });
    }

    let b = x0 - y0 * y0 / a_squared;
    Ok((a_squared * (x - b)).max(0.0).sqrt())
}

/// Policy for filling points that were not simulated
///
/// Each variant resolves a query to a small set of weighted source points,
/// so values and uncertainties go through the same weights. Errors are
/// propagated as independent: `e = √Σ(wᵢ·eᵢ)²`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Straight line between the bracketing simulated points
    #[default]
    Linear,
    /// Value of the closest simulated point at or below
    Flat,
    /// Three-point Lagrange polynomial through the nearest simulated points
    Quadratic,
}

impl InterpolationMethod {
    /// Weighted source points for a query at `x` on the ascending `xs`
    ///
    /// Out-of-range queries take the nearest end point with weight one.
    fn weights(&self, xs: &[f64], x: f64) -> Vec<(usize, f64)> {
        let n = xs.len();
        if n == 1 || x <= xs[0] {
            return vec![(0, 1.0)];
        }
        if x >= xs[n - 1] {
            return vec![(n - 1, 1.0)];
        }

        let i = xs.upper_bound(x) - 1;
        match self {
            InterpolationMethod::Flat => vec![(i, 1.0)],
            InterpolationMethod::Linear => {
                let fraction = (x - xs[i]) / (xs[i + 1] - xs[i]);
                vec![(i, 1.0 - fraction), (i + 1, fraction)]
            }
            InterpolationMethod::Quadratic if n < 3 => {
                debug!("Quadratic interpolation needs 3 points, using linear");
                InterpolationMethod::Linear.weights(xs, x)
            }
            InterpolationMethod::Quadratic => {
                // centre the stencil on the bracketing pair, shifted inwards at the edges
                let start = if i == 0 {
                    0
                } else if i + 2 >= n {
                    n - 3
                } else if (x - xs[i - 1]) < (xs[i + 2] - x) {
                    i - 1
                } else {
                    i
                };
                let stencil = [start, start + 1, start + 2];
                stencil
                    .iter()
                    .map(|&j| {
                        let weight = stencil
                            .iter()
                            .filter(|&&m| m != j)
                            .map(|&m| (x - xs[m]) / (xs[j] - xs[m]))
                            .product::<f64>();
                        (j, weight)
                    })
                    .collect()
            }
        }
    }

    /// Evaluate value and error at `x` from the source points
    fn evaluate(&self, source: &Histogram, x: f64) -> (f64, f64) {
        let (y, e_squared) = self
            .weights(&source.x, x)
            .into_iter()
            .fold((0.0, 0.0), |(y, e2), (j, w)| {
                (y + w * source.y[j], e2 + (w * source.e[j]).powi(2))
            });
        (y, e_squared.sqrt())
    }

    /// Fill every point of `histogram` that is not listed in `simulated`
    ///
    /// The `simulated` indices must be ascending and refer to points whose
    /// values are already set. A single simulated point fills the whole
    /// histogram flat.
    ///
    /// ```rust
    /// # use nscatter_histogram::{Histogram, InterpolationMethod};
    /// let mut h = Histogram::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![1.0, 0.0, 3.0, 0.0, 5.0]).unwrap();
    /// InterpolationMethod::Linear.fill(&mut h, &[0, 2, 4]).unwrap();
    /// assert_eq!(h.y, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    /// ```
    pub fn fill(&self, histogram: &mut Histogram, simulated: &[usize]) -> Result<()> {
        if simulated.is_empty() {
            return Err(Error::NothingToInterpolate);
        }
        if let Some(&index) = simulated.iter().find(|&&i| i >= histogram.len()) {
            return Err(Error::SimulatedIndexOutOfRange {
                index,
                len: histogram.len(),
            });
        }

        if simulated.len() == histogram.len() {
            return Ok(());
        }

        let source = Histogram {
            x: simulated.iter().map(|&i| histogram.x[i]).collect(),
            y: simulated.iter().map(|&i| histogram.y[i]).collect(),
            e: simulated.iter().map(|&i| histogram.e[i]).collect(),
        };

        if source.len() == 1 {
            debug!("Single simulated point, filling all points flat");
        }

        let mut next = simulated.iter().peekable();
        for i in 0..histogram.len() {
            if next.peek() == Some(&&i) {
                next.next();
                continue;
            }
            let (y, e) = self.evaluate(&source, histogram.x[i]);
            histogram.y[i] = y;
            histogram.e[i] = e;
        }
        Ok(())
    }

    /// Resample `source` onto new points
    ///
    /// ```rust
    /// # use nscatter_histogram::{Histogram, InterpolationMethod};
    /// let source = Histogram::new(vec![0.0, 1.0], vec![0.0, 10.0]).unwrap();
    /// let resampled = InterpolationMethod::Linear.resample(&source, &[0.25, 0.5]).unwrap();
    /// assert_eq!(resampled.y, vec![2.5, 5.0]);
    /// ```
    pub fn resample(&self, source: &Histogram, x: &[f64]) -> Result<Histogram> {
        if source.is_empty() {
            return Err(Error::EmptyHistogram);
        }
        let (y, e) = x.iter().map(|&xi| self.evaluate(source, xi)).unzip();
        Ok(Histogram { x: x.to_vec(), y, e })
    }
}
