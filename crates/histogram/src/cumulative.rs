//! Cumulative Q·S(Q) distributions for importance sampling of Q

// crate modules
use crate::error::{Error, Result};
use crate::histogram::Histogram;
use crate::interpolate::interpolate_square_root;

// external crates
use itertools::Itertools;
use log::trace;

/// Inverse cumulative distribution of momentum transfer
///
/// Built from the cumulative integral of `Q·S(Q)` up to `2·k_inc`, with the
/// axes swapped so `x` is the normalised probability in [0, 1] and `y` is
/// the corresponding Q. Feeding a uniform random number in as `x` samples Q
/// in proportion to `Q·S(Q)`.
///
/// The `x` axis is non-decreasing but may repeat over regions where S(Q) is
/// zero. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeDistribution {
    inverse: Histogram,
    integral: f64,
}

impl CumulativeDistribution {
    /// Sample Q for a uniform random number `u` in [0, 1)
    pub fn sample_q(&self, u: f64) -> Result<f64> {
        interpolate_square_root(&self.inverse.x, &self.inverse.y, u)
    }

    /// Normalised cumulative probability at each tabulated point
    pub fn probability(&self) -> &[f64] {
        &self.inverse.x
    }

    /// Momentum transfer at each tabulated point
    pub fn q(&self) -> &[f64] {
        &self.inverse.y
    }

    /// Integral of Q·S(Q) over [0, 2k] before normalisation
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

/// Prepare the Q·S(Q) integrand from a tabulated structure factor
///
/// - A point at Q=0 is added if missing, duplicating the first S(Q) value
/// - A point at `q_max` is added if the table stops short, duplicating the
///   last S(Q) value
/// - Every step in S(Q) gets an extra point just below it carrying the
///   left-hand value, so the trapezoidal integral follows the flat
///   interpolation used for S(Q) lookups instead of blending across jumps
/// - The values are multiplied by Q
///
/// ```rust
/// # use nscatter_histogram::{prepare_qs, Histogram};
/// let sq = Histogram::new(vec![1.0, 2.0], vec![1.0, 3.0]).unwrap();
/// let qsq = prepare_qs(&sq, 4.0).unwrap();
///
/// // origin, step doubled just below Q=2, and a terminating point at Q=4
/// assert_eq!(qsq.len(), 5);
/// assert_eq!(qsq.x[0], 0.0);
/// assert_eq!(qsq.y[2], qsq.x[2] * 1.0);
/// assert_eq!(qsq.y[4], 12.0);
/// ```
pub fn prepare_qs(s_of_q: &Histogram, q_max: f64) -> Result<Histogram> {
    s_of_q.check_point_data()?;

    let mut q = s_of_q.x.clone();
    let mut s = s_of_q.y.clone();

    if q[0] < 0.0 {
        return Err(Error::NegativeAxis(q[0]));
    }

    // terminating points so there is never any extrapolation
    if q[0] > 0.0 {
        q.insert(0, 0.0);
        s.insert(0, s[0]);
    }
    if q[q.len() - 1] < q_max {
        q.push(q_max);
        s.push(s[s.len() - 1]);
    }

    // double up points at each step so the integral respects flat interpolation
    let mut i = 1;
    while i < q.len() {
        let shifted = next_below(q[i]);
        if s[i] != s[i - 1] && shifted > q[i - 1] {
            q.insert(i, shifted);
            s.insert(i, s[i - 1]);
            i += 1;
        }
        i += 1;
    }

    let qsq = q.iter().zip(&s).map(|(q, s)| q * s).collect();
    trace!("Prepared Q.S(Q) with {} points up to Q={q_max}", q.len());
    Histogram::new(q, qsq)
}

/// Cumulative trapezoidal integral from 0 to `xmax`
///
/// Returns the running integral at every tabulated point below `xmax` plus a
/// final point at `xmax` itself. A partial final interval uses a linearly
/// interpolated value at `xmax`.
///
/// Fails if the first point is not exactly at x=0, or if `xmax` is outside
/// the tabulated range, since no extrapolation is attempted.
///
/// ```rust
/// # use nscatter_histogram::{integrate_cumulative, Histogram};
/// let h = Histogram::new(vec![0.0, 1.0, 2.0, 3.0], vec![1.0; 4]).unwrap();
///
/// let cumulative = integrate_cumulative(&h, 2.2).unwrap();
/// assert_eq!(cumulative.x.len(), 4);
/// assert!((cumulative.y[3] - 2.2).abs() < 1e-12);
///
/// assert!(integrate_cumulative(&h, 3.2).is_err());
/// assert_eq!(integrate_cumulative(&h, 0.0).unwrap().y, vec![0.0]);
/// ```
pub fn integrate_cumulative(histogram: &Histogram, xmax: f64) -> Result<Histogram> {
    let (Some(&first), Some(&last)) = (histogram.x.first(), histogram.x.last()) else {
        return Err(Error::EmptyHistogram);
    };

    if first != 0.0 {
        return Err(Error::MissingOrigin(first));
    }
    if xmax > last {
        return Err(Error::BeyondRange { xmax, last });
    }
    if xmax < 0.0 {
        return Err(Error::BelowOrigin(xmax));
    }

    let mut x = vec![0.0];
    let mut y = vec![0.0];
    let mut sum = 0.0;

    let points = histogram.x.iter().zip(&histogram.y);
    for ((&x0, &y0), (&x1, &y1)) in points.tuple_windows() {
        if x1 <= xmax {
            sum += 0.5 * (y0 + y1) * (x1 - x0);
            x.push(x1);
            y.push(sum);
        } else {
            // partial final interval
            if x0 < xmax {
                let y_max = histogram.linear_at(xmax);
                sum += 0.5 * (y0 + y_max) * (xmax - x0);
                x.push(xmax);
                y.push(sum);
            }
            break;
        }
    }

    Histogram::new(x, y)
}

/// Build the inverse cumulative distribution of Q for one incident wavenumber
///
/// Integrates the prepared `Q·S(Q)` up to `2·k_inc`, normalises by the
/// integral, and swaps the axes for inverse-CDF sampling. Fails if the
/// integral is zero since no probability distribution can be built.
///
/// ```rust
/// # use nscatter_histogram::{build_inverse, prepare_qs, Histogram};
/// let sq = Histogram::new(vec![0.0, 10.0], vec![1.0, 1.0]).unwrap();
/// let qsq = prepare_qs(&sq, 10.0).unwrap();
/// let inverse = build_inverse(&qsq, 2.0).unwrap();
///
/// // uniform S(Q) integrates to Q²/2 over [0, 2k]
/// assert!((inverse.integral() - 8.0).abs() < 1e-12);
/// assert!((inverse.sample_q(1.0).unwrap() - 4.0).abs() < 1e-12);
/// ```
pub fn build_inverse(qsq: &Histogram, k_inc: f64) -> Result<CumulativeDistribution> {
    let cumulative = integrate_cumulative(qsq, 2.0 * k_inc)?;

    let integral = cumulative.y[cumulative.len() - 1];
    if integral == 0.0 {
        return Err(Error::ZeroIntegral);
    }

    let probability = cumulative.y.iter().map(|c| c / integral).collect();
    let inverse = Histogram::new(probability, cumulative.x)?;

    Ok(CumulativeDistribution { inverse, integral })
}

/// Largest representable value below a finite positive `x`
fn next_below(x: f64) -> f64 {
    if x > 0.0 && x.is_finite() {
        f64::from_bits(x.to_bits() - 1)
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_doubling_preserves_flat_integral() {
        // S=1 on [0,1), S=3 on [1,2]
        let sq = Histogram::new(vec![0.0, 1.0, 2.0], vec![1.0, 3.0, 3.0]).unwrap();
        let qsq = prepare_qs(&sq, 2.0).unwrap();
        let cumulative = integrate_cumulative(&qsq, 2.0).unwrap();

        // 0.5 from the first step and 3 * (4 - 1) / 2 = 4.5 from the second
        let total = cumulative.y[cumulative.len() - 1];
        assert!((total - 5.0).abs() < 1e-12, "{total}");
    }

    #[test]
    fn no_doubling_without_steps() {
        let sq = Histogram::new(vec![0.0, 1.0, 2.0], vec![2.0, 2.0, 2.0]).unwrap();
        let qsq = prepare_qs(&sq, 2.0).unwrap();
        assert_eq!(qsq.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(qsq.y, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn rejects_negative_q() {
        let sq = Histogram::new(vec![-1.0, 1.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(prepare_qs(&sq, 2.0), Err(Error::NegativeAxis(-1.0)));
    }

    #[test]
    fn partial_interval_on_a_slope() {
        // y = x integrates to x²/2
        let h = Histogram::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]).unwrap();
        let cumulative = integrate_cumulative(&h, 1.5).unwrap();
        assert_eq!(cumulative.x, vec![0.0, 1.0, 1.5]);
        assert!((cumulative.y[2] - 1.125).abs() < 1e-12);
    }

    #[test]
    fn missing_origin() {
        let h = Histogram::new(vec![0.5, 1.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(integrate_cumulative(&h, 1.0), Err(Error::MissingOrigin(0.5)));
    }

    #[test]
    fn zero_integral() {
        let sq = Histogram::new(vec![0.0, 5.0], vec![0.0, 0.0]).unwrap();
        let qsq = prepare_qs(&sq, 10.0).unwrap();
        assert_eq!(build_inverse(&qsq, 3.0), Err(Error::ZeroIntegral));
    }

    #[test]
    fn inverse_of_spike_stays_in_spike() {
        let sq = Histogram::new(
            vec![0.0, 4.9, 5.1, 10.0],
            vec![0.0, 100.0, 0.0, 0.0],
        )
        .unwrap();
        let qsq = prepare_qs(&sq, 12.0).unwrap();
        let inverse = build_inverse(&qsq, 6.0).unwrap();

        for u in [0.0, 0.1, 0.5, 0.9, 0.999] {
            let q = inverse.sample_q(u).unwrap();
            // the doubled points sit one ulp below the spike edges
            assert!((4.89..=5.11).contains(&q), "u={u} gave Q={q}");
        }
    }

    #[test]
    fn next_below_is_adjacent() {
        let x = 2.0;
        let below = next_below(x);
        assert!(below < x);
        assert_eq!(f64::from_bits(below.to_bits() + 1), x);
        assert_eq!(next_below(0.0), 0.0);
    }
}
