//! Module for point-data histograms

// crate modules
use crate::error::{Error, Result};
use crate::interpolate::{interpolate_flat, interpolate_linear};

// nscatter modules
use nscatter_utils::{SliceExt, ValueExt};

// external crates
use serde::{Deserialize, Serialize};

/// Ordered `(x, y, e)` samples in point-data form
///
/// The same type is used for every tabulated quantity in the simulation:
///
/// - a structure factor, with `x` as momentum transfer Q and `y` as S(Q)
/// - a detector's wavelength axis with simulated weights and their errors
/// - a cross section table against wavenumber
///
/// The fields remain public for direct use. Constructors check that the
/// three vectors agree in length but do not enforce ordering, because an
/// inverse cumulative distribution legitimately repeats `x` values across
/// regions of zero probability. Use [check_point_data()](Histogram::check_point_data)
/// where strictly increasing `x` is required.
///
/// ```rust
/// # use nscatter_histogram::Histogram;
/// let sq = Histogram::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.5, 1.0]).unwrap();
///
/// // Step lookups use the previous tabulated point
/// assert_eq!(sq.flat_at(1.9), 1.5);
///
/// // Linear lookups blend between the neighbours
/// assert_eq!(sq.linear_at(0.5), 1.25);
///
/// // Nothing is extrapolated
/// assert_eq!(sq.flat_at(-1.0), 1.0);
/// assert_eq!(sq.linear_at(9.0), 1.0);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Point positions
    pub x: Vec<f64>,
    /// Values at each point
    pub y: Vec<f64>,
    /// Absolute uncertainty on each value
    pub e: Vec<f64>,
}

impl Histogram {
    /// Histogram with zero uncertainties
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let e = vec![0.0; y.len()];
        Self::with_errors(x, y, e)
    }

    /// Histogram with explicit uncertainties
    pub fn with_errors(x: Vec<f64>, y: Vec<f64>, e: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || y.len() != e.len() {
            return Err(Error::LengthMismatch {
                x: x.len(),
                y: y.len(),
                e: e.len(),
            });
        }
        Ok(Self { x, y, e })
    }

    /// Zero-valued histogram on the provided points
    pub fn zeros(x: Vec<f64>) -> Self {
        let n = x.len();
        Self {
            x,
            y: vec![0.0; n],
            e: vec![0.0; n],
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True for a histogram without points
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Ensure this is usable point data for integration and lookups
    ///
    /// Requires at least one point and strictly increasing `x`.
    pub fn check_point_data(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::EmptyHistogram);
        }
        if !self.x.is_strictly_increasing() {
            return Err(Error::NotStrictlyIncreasing);
        }
        Ok(())
    }

    /// True if no value is negative
    pub fn is_non_negative(&self) -> bool {
        self.y.iter().all(|y| *y >= 0.0)
    }

    /// Step lookup at `x`, using the closest point at or below it
    pub fn flat_at(&self, x: f64) -> f64 {
        interpolate_flat(&self.x, &self.y, x)
    }

    /// Linear lookup at `x`
    pub fn linear_at(&self, x: f64) -> f64 {
        interpolate_linear(&self.x, &self.y, x)
    }

    /// Add another histogram on the same points, errors in quadrature
    pub fn add_assign_quadrature(&mut self, other: &Histogram) -> Result<()> {
        if other.len() != self.len() {
            return Err(Error::LengthMismatch {
                x: self.len(),
                y: other.len(),
                e: other.e.len(),
            });
        }
        for (i, (y, e)) in other.y.iter().zip(&other.e).enumerate() {
            self.y[i] += y;
            self.e[i] = self.e[i].hypot(*e);
        }
        Ok(())
    }

    /// Short summary of the first and last points for log messages
    pub fn summary(&self) -> String {
        match (self.x.first(), self.x.last()) {
            (Some(first), Some(last)) => nscatter_utils::f!(
                "{} points over [{}, {}]",
                self.len(),
                first.sci(4, 2),
                last.sci(4, 2)
            ),
            _ => "empty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lengths() {
        let result = Histogram::with_errors(vec![0.0, 1.0], vec![1.0], vec![0.0]);
        assert_eq!(
            result,
            Err(Error::LengthMismatch { x: 2, y: 1, e: 1 })
        );
    }

    #[test]
    fn point_data_checks() {
        let ok = Histogram::new(vec![0.0, 1.0], vec![0.0, 0.0]).unwrap();
        assert!(ok.check_point_data().is_ok());

        let repeated = Histogram::new(vec![0.0, 0.0], vec![0.0, 0.0]).unwrap();
        assert_eq!(repeated.check_point_data(), Err(Error::NotStrictlyIncreasing));

        assert_eq!(Histogram::default().check_point_data(), Err(Error::EmptyHistogram));
    }

    #[test]
    fn negative_values() {
        let mut sq = Histogram::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]).unwrap();
        assert!(sq.is_non_negative());
        sq.y[1] = -1e-9;
        assert!(!sq.is_non_negative());
    }

    #[test]
    fn summary_for_logging() {
        let sq = Histogram::new(vec![0.0, 25.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(sq.summary(), "2 points over [0.0000e+00, 2.5000e+01]");
        assert_eq!(Histogram::default().summary(), "empty");
    }

    #[test]
    fn quadrature_sum() {
        let mut a = Histogram::with_errors(vec![1.0], vec![1.0], vec![3.0]).unwrap();
        let b = Histogram::with_errors(vec![1.0], vec![2.0], vec![4.0]).unwrap();
        a.add_assign_quadrature(&b).unwrap();
        assert_eq!(a.y, vec![3.0]);
        assert_eq!(a.e, vec![5.0]);
    }
}
