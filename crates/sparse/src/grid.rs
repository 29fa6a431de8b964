//! Regular latitude/longitude grids over detector angular space

// crate modules
use crate::error::{Error, Result};

// nscatter modules
use nscatter_utils::SliceExt;

// external crates
use log::debug;

/// Angular ranges narrower than this are widened
const DEGENERATE_TOLERANCE: f64 = 1e-5;

/// Shift applied to each bound of a degenerate angular range
const DEGENERATE_SHIFT: f64 = std::f64::consts::PI / 300.0;

/// Rectangular grid of detector positions in latitude and longitude
///
/// All angles are in radians. Grid points are numbered column-major, so the
/// detector index of `(row, column)` is `column * rows + row`.
///
/// A zero-width range on either axis is widened by π/300 on both sides so
/// the step size is never zero. This slightly misrepresents a truly
/// point-like range in exchange for finite interpolation weights.
///
/// ```rust
/// # use nscatter_sparse::DetectorGrid;
/// let grid = DetectorGrid::new(0.0, 1.0, 3, -1.0, 1.0, 5).unwrap();
///
/// assert_eq!(grid.latitude_at(1), 0.5);
/// assert_eq!(grid.longitude_at(4), 1.0);
/// assert_eq!(grid.detector_index(2, 1).unwrap(), 5);
/// assert_eq!(grid.number_of_detectors(), 15);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorGrid {
    min_latitude: f64,
    max_latitude: f64,
    rows: usize,
    latitude_step: f64,
    min_longitude: f64,
    max_longitude: f64,
    columns: usize,
    longitude_step: f64,
}

impl DetectorGrid {
    /// Grid with `rows` latitudes and `columns` longitudes over the ranges
    ///
    /// Fails if either point count is below 2 or a minimum exceeds its
    /// maximum.
    pub fn new(
        min_latitude: f64,
        max_latitude: f64,
        rows: usize,
        min_longitude: f64,
        max_longitude: f64,
        columns: usize,
    ) -> Result<Self> {
        if rows < 2 {
            return Err(Error::TooFewRows(rows));
        }
        if columns < 2 {
            return Err(Error::TooFewColumns(columns));
        }
        if min_latitude > max_latitude {
            return Err(Error::InvertedLatitude {
                min: min_latitude,
                max: max_latitude,
            });
        }
        if min_longitude > max_longitude {
            return Err(Error::InvertedLongitude {
                min: min_longitude,
                max: max_longitude,
            });
        }

        let (min_latitude, max_latitude) = widen_degenerate(min_latitude, max_latitude);
        let (min_longitude, max_longitude) = widen_degenerate(min_longitude, max_longitude);

        Ok(Self {
            min_latitude,
            max_latitude,
            rows,
            latitude_step: (max_latitude - min_latitude) / (rows - 1) as f64,
            min_longitude,
            max_longitude,
            columns,
            longitude_step: (max_longitude - min_longitude) / (columns - 1) as f64,
        })
    }

    /// Smallest grid spanning every `(latitude, longitude)` pair
    ///
    /// ```rust
    /// # use nscatter_sparse::DetectorGrid;
    /// let angles = [(0.1, -0.2), (0.3, 0.4), (0.2, 0.0)];
    /// let grid = DetectorGrid::covering(&angles, 3, 2).unwrap();
    ///
    /// assert_eq!(grid.latitude_at(0), 0.1);
    /// assert_eq!(grid.longitude_at(1), 0.4);
    /// ```
    pub fn covering(angles: &[(f64, f64)], rows: usize, columns: usize) -> Result<Self> {
        if angles.is_empty() {
            return Err(Error::NoDetectors);
        }
        let latitudes = angles.iter().map(|a| a.0).collect::<Vec<f64>>();
        let longitudes = angles.iter().map(|a| a.1).collect::<Vec<f64>>();

        Self::new(
            latitudes.try_min()?,
            latitudes.try_max()?,
            rows,
            longitudes.try_min()?,
            longitudes.try_max()?,
            columns,
        )
    }

    /// Number of latitude points
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of longitude points
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Latitude spacing between rows
    pub fn latitude_step(&self) -> f64 {
        self.latitude_step
    }

    /// Longitude spacing between columns
    pub fn longitude_step(&self) -> f64 {
        self.longitude_step
    }

    /// Total number of grid points
    pub fn number_of_detectors(&self) -> usize {
        self.rows * self.columns
    }

    /// Latitude of a grid row
    pub fn latitude_at(&self, row: usize) -> f64 {
        // hit the upper bound exactly on the last row
        if row + 1 == self.rows {
            return self.max_latitude;
        }
        self.min_latitude + row as f64 * self.latitude_step
    }

    /// Longitude of a grid column
    pub fn longitude_at(&self, column: usize) -> f64 {
        if column + 1 == self.columns {
            return self.max_longitude;
        }
        self.min_longitude + column as f64 * self.longitude_step
    }

    /// Linear detector index of a grid point
    pub fn detector_index(&self, row: usize, column: usize) -> Result<usize> {
        if row >= self.rows || column >= self.columns {
            return Err(Error::IndexOutOfRange {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(column * self.rows + row)
    }

    /// Grid point `(row, column)` for a linear detector index
    pub fn grid_point(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.number_of_detectors() {
            return Err(Error::DetectorOutOfRange {
                index,
                len: self.number_of_detectors(),
            });
        }
        Ok((index % self.rows, index / self.rows))
    }

    /// Lower corner `(row, column)` of the cell containing the query
    ///
    /// The returned point is at or below the query on both axes. Rows and
    /// columns are clamped to `rows - 2` and `columns - 2` so the opposite
    /// corner of the cell always exists, and queries outside the grid
    /// resolve to the nearest edge cell.
    pub fn nearest_vertex(&self, latitude: f64, longitude: f64) -> (usize, usize) {
        let row = lower_index(latitude, self.rows, |i| self.latitude_at(i), |x| {
            (x - self.min_latitude) / self.latitude_step
        });
        let column = lower_index(longitude, self.columns, |i| self.longitude_at(i), |x| {
            (x - self.min_longitude) / self.longitude_step
        });
        (row, column)
    }

    /// Detector indices of the four corners of the cell containing the query
    ///
    /// Ordered as `(row, col)`, `(row + 1, col)`, `(row, col + 1)`,
    /// `(row + 1, col + 1)` relative to the [nearest_vertex()](Self::nearest_vertex).
    ///
    /// ```rust
    /// # use nscatter_sparse::DetectorGrid;
    /// let grid = DetectorGrid::new(0.0, 1.0, 3, 0.0, 1.0, 3).unwrap();
    ///
    /// assert_eq!(grid.nearest_neighbour_indices(0.2, 0.7), [3, 4, 6, 7]);
    ///
    /// // the upper edge is clamped into the last cell
    /// assert_eq!(grid.nearest_neighbour_indices(1.0, 1.0), [4, 5, 7, 8]);
    /// ```
    pub fn nearest_neighbour_indices(&self, latitude: f64, longitude: f64) -> [usize; 4] {
        let (row, column) = self.nearest_vertex(latitude, longitude);
        let lower = column * self.rows + row;
        let upper = (column + 1) * self.rows + row;
        [lower, lower + 1, upper, upper + 1]
    }
}

/// Widen a range narrower than the degenerate tolerance
fn widen_degenerate(min: f64, max: f64) -> (f64, f64) {
    if max - min < DEGENERATE_TOLERANCE {
        debug!("Degenerate angular range [{min}, {max}], widening by {DEGENERATE_SHIFT:.5}");
        (min - DEGENERATE_SHIFT, max + DEGENERATE_SHIFT)
    } else {
        (min, max)
    }
}

/// Index of the grid point at or below `x`, clamped to `[0, n - 2]`
fn lower_index<A, S>(x: f64, n: usize, at: A, scaled: S) -> usize
where
    A: Fn(usize) -> f64,
    S: Fn(f64) -> f64,
{
    let last = n - 2;
    let position = scaled(x).floor();
    let mut i = if position.is_nan() || position < 0.0 {
        0
    } else {
        (position as usize).min(last)
    };

    // rounding in the division can land one point either side
    if i < last && at(i + 1) <= x {
        i += 1;
    } else if i > 0 && at(i) > x {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_construction() {
        assert_eq!(
            DetectorGrid::new(0.0, 1.0, 1, 0.0, 1.0, 2),
            Err(Error::TooFewRows(1))
        );
        assert_eq!(
            DetectorGrid::new(0.0, 1.0, 2, 0.0, 1.0, 0),
            Err(Error::TooFewColumns(0))
        );
        assert_eq!(
            DetectorGrid::new(1.0, 0.0, 2, 0.0, 1.0, 2),
            Err(Error::InvertedLatitude { min: 1.0, max: 0.0 })
        );
        assert_eq!(
            DetectorGrid::new(0.0, 1.0, 2, 1.0, -1.0, 2),
            Err(Error::InvertedLongitude { min: 1.0, max: -1.0 })
        );
    }

    #[test]
    fn degenerate_range_is_widened() {
        let grid = DetectorGrid::new(0.3, 0.3, 2, -1.0, 1.0, 2).unwrap();
        assert!((grid.latitude_at(0) - (0.3 - DEGENERATE_SHIFT)).abs() < 1e-15);
        assert!((grid.latitude_at(1) - (0.3 + DEGENERATE_SHIFT)).abs() < 1e-15);
        assert_eq!(grid.longitude_at(0), -1.0);
    }

    #[test]
    fn vertex_exactly_on_grid_points() {
        let grid = DetectorGrid::new(0.0, 0.35, 8, 0.1, 0.7, 7).unwrap();
        for row in 0..7 {
            for column in 0..6 {
                let vertex = grid.nearest_vertex(grid.latitude_at(row), grid.longitude_at(column));
                assert_eq!(vertex, (row, column));
            }
        }
    }

    #[test]
    fn vertex_outside_grid_is_clamped() {
        let grid = DetectorGrid::new(0.0, 1.0, 4, 0.0, 1.0, 3).unwrap();
        assert_eq!(grid.nearest_vertex(-5.0, -5.0), (0, 0));
        assert_eq!(grid.nearest_vertex(5.0, 5.0), (2, 1));
        // an undefined latitude falls to the first row, longitude unaffected
        assert_eq!(grid.nearest_vertex(f64::NAN, 0.2), (0, 0));
        assert_eq!(grid.nearest_vertex(f64::NAN, 0.5), (0, 1));
    }

    #[test]
    fn grid_point_round_trip() {
        let grid = DetectorGrid::new(0.0, 1.0, 3, 0.0, 1.0, 4).unwrap();
        assert_eq!(grid.grid_point(7), Ok((1, 2)));
        assert_eq!(grid.detector_index(1, 2), Ok(7));
        assert!(grid.grid_point(12).is_err());
        assert!(grid.detector_index(3, 0).is_err());
    }
}
