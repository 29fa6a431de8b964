//! Synthetic detectors on a sparse grid and interpolation between them

// crate modules
use crate::angles::{great_circle_distance, inverse_distance_weights, unit_direction};
use crate::error::{Error, Result};
use crate::grid::DetectorGrid;

// nscatter modules
use nscatter_histogram::Histogram;

// external crates
use log::trace;
use nalgebra::Vector3;

/// Synthetic detectors placed on every point of a [DetectorGrid]
///
/// Each detector holds one histogram over a shared wavelength axis. The set
/// starts with zeroed histograms that are populated in place by the
/// simulation, then read back through the interpolation methods for every
/// real detector.
///
/// ```rust
/// # use nscatter_sparse::{DetectorGrid, SparseDetectorSet};
/// # use nscatter_histogram::Histogram;
/// let grid = DetectorGrid::new(0.0, 0.2, 3, 0.0, 0.4, 2).unwrap();
/// let mut set = SparseDetectorSet::new(grid, vec![1.0, 2.0]);
///
/// for i in 0..set.len() {
///     let h = Histogram::new(vec![1.0, 2.0], vec![i as f64; 2]).unwrap();
///     set.set_histogram(i, h).unwrap();
/// }
///
/// // half way between column 0 (rows 0..3) and column 1 (rows 3..6) on row 1
/// let h = set.bilinear_interpolate(0.1, 0.2).unwrap();
/// assert_eq!(h.y, vec![2.5, 2.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SparseDetectorSet {
    grid: DetectorGrid,
    wavelengths: Vec<f64>,
    histograms: Vec<Histogram>,
}

impl SparseDetectorSet {
    /// Zeroed detectors on every grid point sharing one wavelength axis
    pub fn new(grid: DetectorGrid, wavelengths: Vec<f64>) -> Self {
        let histograms = vec![Histogram::zeros(wavelengths.clone()); grid.number_of_detectors()];
        Self {
            grid,
            wavelengths,
            histograms,
        }
    }

    /// The underlying angular grid
    pub fn grid(&self) -> &DetectorGrid {
        &self.grid
    }

    /// The wavelength axis shared by every sparse detector
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Number of sparse detectors
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// True when there are no detectors, never the case for a valid grid
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Latitude and longitude of a sparse detector
    pub fn angles(&self, index: usize) -> Result<(f64, f64)> {
        let (row, column) = self.grid.grid_point(index)?;
        Ok((self.grid.latitude_at(row), self.grid.longitude_at(column)))
    }

    /// Unit vector from the sample towards a sparse detector
    pub fn direction(&self, index: usize) -> Result<Vector3<f64>> {
        let (latitude, longitude) = self.angles(index)?;
        Ok(unit_direction(latitude, longitude))
    }

    /// Simulated histogram of a sparse detector
    pub fn histogram(&self, index: usize) -> Result<&Histogram> {
        self.histograms.get(index).ok_or(Error::DetectorOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Replace the histogram of a sparse detector
    ///
    /// The histogram must have one point per wavelength.
    pub fn set_histogram(&mut self, index: usize, histogram: Histogram) -> Result<()> {
        if histogram.len() != self.wavelengths.len() {
            return Err(Error::WavelengthMismatch {
                expected: self.wavelengths.len(),
                found: histogram.len(),
            });
        }
        let len = self.len();
        let slot = self
            .histograms
            .get_mut(index)
            .ok_or(Error::DetectorOutOfRange { index, len })?;
        *slot = histogram;
        Ok(())
    }

    /// Inverse square distance average of the four surrounding detectors
    ///
    /// Distances are great-circle angles. A query exactly on a detector
    /// returns that detector's values.
    pub fn inverse_distance_interpolate(&self, latitude: f64, longitude: f64) -> Result<Histogram> {
        let indices = self.grid.nearest_neighbour_indices(latitude, longitude);

        let mut distances = [0.0; 4];
        for (d, &index) in distances.iter_mut().zip(&indices) {
            let (lat, lon) = self.angles(index)?;
            *d = great_circle_distance(latitude, longitude, lat, lon);
        }

        let weights = inverse_distance_weights(&distances);
        let total: f64 = weights.iter().sum();

        let mut result = Histogram::zeros(self.wavelengths.clone());
        for (&index, &weight) in indices.iter().zip(&weights) {
            let w = weight / total;
            let source = &self.histograms[index];
            for j in 0..result.len() {
                result.y[j] += w * source.y[j];
                result.e[j] += (w * source.e[j]).powi(2);
            }
        }
        result.e.iter_mut().for_each(|e| *e = e.sqrt());
        Ok(result)
    }

    /// Bilinear interpolation within the containing grid cell
    ///
    /// Interpolates along longitude at the two bounding latitudes, then along
    /// latitude. Uncertainties combine two terms in quadrature:
    ///
    /// - the source errors propagated through the same linear weights
    /// - a Taylor remainder estimate of the interpolation error from central
    ///   second differences along each axis
    ///
    /// The second term needs at least 3 rows and 3 columns and is zero on
    /// smaller grids. Queries on a grid point reproduce that detector's
    /// values and errors exactly.
    pub fn bilinear_interpolate(&self, latitude: f64, longitude: f64) -> Result<Histogram> {
        let grid = &self.grid;
        let (row, column) = grid.nearest_vertex(latitude, longitude);

        let lat0 = grid.latitude_at(row);
        let lat1 = grid.latitude_at(row + 1);
        let lon0 = grid.longitude_at(column);
        let lon1 = grid.longitude_at(column + 1);

        // outside the grid the nearest edge values are used
        let latitude = latitude.clamp(lat0, lat1);
        let longitude = longitude.clamp(lon0, lon1);
        let f_lat = (latitude - lat0) / (lat1 - lat0);
        let f_lon = (longitude - lon0) / (lon1 - lon0);

        let h00 = &self.histograms[grid.detector_index(row, column)?];
        let h10 = &self.histograms[grid.detector_index(row + 1, column)?];
        let h01 = &self.histograms[grid.detector_index(row, column + 1)?];
        let h11 = &self.histograms[grid.detector_index(row + 1, column + 1)?];

        let curvature = if grid.rows() >= 3 && grid.columns() >= 3 {
            let near_row = row + usize::from(f_lat > 0.5);
            let near_column = column + usize::from(f_lon > 0.5);
            Some((
                self.second_difference_longitude(near_row, near_column)?,
                self.second_difference_latitude(near_row, near_column)?,
            ))
        } else {
            trace!("Grid smaller than 3x3, no interpolation error estimate");
            None
        };

        let mut result = Histogram::zeros(self.wavelengths.clone());
        for j in 0..result.len() {
            let (y_low, e_low) = blend(f_lon, (h00.y[j], h00.e[j]), (h01.y[j], h01.e[j]));
            let (y_high, e_high) = blend(f_lon, (h10.y[j], h10.e[j]), (h11.y[j], h11.e[j]));
            let (y, propagated) = blend(f_lat, (y_low, e_low), (y_high, e_high));

            let interpolation_error = match &curvature {
                Some((d2_lon, d2_lat)) => {
                    0.5 * (longitude - lon0) * (lon1 - longitude) * d2_lon[j]
                        + 0.5 * (latitude - lat0) * (lat1 - latitude) * d2_lat[j]
                }
                None => 0.0,
            };

            result.y[j] = y;
            result.e[j] = interpolation_error.hypot(propagated);
        }
        Ok(result)
    }

    /// Central second difference along longitude at a grid point
    fn second_difference_longitude(&self, row: usize, column: usize) -> Result<Vec<f64>> {
        let centre = column.clamp(1, self.grid.columns() - 2);
        let indices = [
            self.grid.detector_index(row, centre - 1)?,
            self.grid.detector_index(row, centre)?,
            self.grid.detector_index(row, centre + 1)?,
        ];
        Ok(self.second_difference(indices, self.grid.longitude_step()))
    }

    /// Central second difference along latitude at a grid point
    fn second_difference_latitude(&self, row: usize, column: usize) -> Result<Vec<f64>> {
        let centre = row.clamp(1, self.grid.rows() - 2);
        let indices = [
            self.grid.detector_index(centre - 1, column)?,
            self.grid.detector_index(centre, column)?,
            self.grid.detector_index(centre + 1, column)?,
        ];
        Ok(self.second_difference(indices, self.grid.latitude_step()))
    }

    fn second_difference(&self, indices: [usize; 3], step: f64) -> Vec<f64> {
        let [minus, centre, plus] = indices.map(|i| &self.histograms[i].y);
        (0..self.wavelengths.len())
            .map(|j| (plus[j] - 2.0 * centre[j] + minus[j]) / (step * step))
            .collect()
    }
}

/// Linear blend of two `(value, error)` pairs, errors independent
fn blend(fraction: f64, a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let y = (1.0 - fraction) * a.0 + fraction * b.0;
    let e = ((1.0 - fraction) * a.1).hypot(fraction * b.1);
    (y, e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_set(rows: usize, columns: usize) -> SparseDetectorSet {
        let grid = DetectorGrid::new(0.0, 0.4, rows, -0.3, 0.3, columns).unwrap();
        let mut set = SparseDetectorSet::new(grid, vec![1.0, 2.0, 3.0]);
        for i in 0..set.len() {
            let (lat, lon) = set.angles(i).unwrap();
            let y = vec![1.0 + lat * lat, 2.0 + lon, 3.0 + lat * lon];
            let e = vec![0.01 * (i + 1) as f64; 3];
            let h = Histogram::with_errors(vec![1.0, 2.0, 3.0], y, e).unwrap();
            set.set_histogram(i, h).unwrap();
        }
        set
    }

    #[test]
    fn exact_on_every_vertex() {
        let set = filled_set(4, 3);
        for i in 0..set.len() {
            let (lat, lon) = set.angles(i).unwrap();
            let h = set.bilinear_interpolate(lat, lon).unwrap();
            assert_eq!(h.y, set.histogram(i).unwrap().y, "detector {i}");
            assert_eq!(h.e, set.histogram(i).unwrap().e, "detector {i}");
        }
    }

    #[test]
    fn inverse_distance_on_vertex() {
        let set = filled_set(3, 3);
        let (lat, lon) = set.angles(4).unwrap();
        let h = set.inverse_distance_interpolate(lat, lon).unwrap();
        assert_eq!(h.y, set.histogram(4).unwrap().y);
    }

    #[test]
    fn linear_data_has_no_interpolation_error() {
        // planar data has zero curvature so only propagated errors remain
        let grid = DetectorGrid::new(0.0, 1.0, 3, 0.0, 1.0, 3).unwrap();
        let mut set = SparseDetectorSet::new(grid, vec![1.0]);
        for i in 0..set.len() {
            let (lat, lon) = set.angles(i).unwrap();
            let h = Histogram::with_errors(vec![1.0], vec![lat + 2.0 * lon], vec![0.0]).unwrap();
            set.set_histogram(i, h).unwrap();
        }
        let h = set.bilinear_interpolate(0.25, 0.75).unwrap();
        assert!((h.y[0] - 1.75).abs() < 1e-12);
        assert!(h.e[0].abs() < 1e-12);
    }

    #[test]
    fn curvature_adds_error() {
        let grid = DetectorGrid::new(0.0, 1.0, 3, 0.0, 1.0, 3).unwrap();
        let mut set = SparseDetectorSet::new(grid, vec![1.0]);
        for i in 0..set.len() {
            let (lat, _) = set.angles(i).unwrap();
            let h = Histogram::new(vec![1.0], vec![lat * lat]).unwrap();
            set.set_histogram(i, h).unwrap();
        }
        // d²/dlat² = 2, remainder 0.5 * 0.25 * 0.25 * 2
        let h = set.bilinear_interpolate(0.25, 0.5).unwrap();
        assert!((h.e[0] - 0.0625).abs() < 1e-12, "{}", h.e[0]);
    }

    #[test]
    fn small_grid_skips_interpolation_error() {
        let grid = DetectorGrid::new(0.0, 1.0, 2, 0.0, 1.0, 2).unwrap();
        let mut set = SparseDetectorSet::new(grid, vec![1.0]);
        for i in 0..set.len() {
            let h = Histogram::with_errors(vec![1.0], vec![i as f64], vec![0.2]).unwrap();
            set.set_histogram(i, h).unwrap();
        }
        let h = set.bilinear_interpolate(0.5, 0.5).unwrap();
        assert!((h.y[0] - 1.5).abs() < 1e-12);
        // four equal errors weighted by 1/4 each
        assert!((h.e[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn rejects_wrong_wavelength_count() {
        let grid = DetectorGrid::new(0.0, 1.0, 2, 0.0, 1.0, 2).unwrap();
        let mut set = SparseDetectorSet::new(grid, vec![1.0, 2.0]);
        let h = Histogram::new(vec![1.0], vec![1.0]).unwrap();
        assert_eq!(
            set.set_histogram(0, h),
            Err(Error::WavelengthMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
