//! Integration tests for detector grids and sparse interpolation

use nscatter_histogram::Histogram;
use nscatter_sparse::{great_circle_distance, DetectorGrid, SparseDetectorSet};
use rstest::{fixture, rstest};

use std::f64::consts::{FRAC_PI_2, PI};

#[fixture]
fn grid() -> DetectorGrid {
    DetectorGrid::new(-0.3, 0.6, 5, 0.1, 1.3, 4).unwrap()
}

/// Smooth, non-planar values so every interpolation term is exercised
#[fixture]
fn populated(grid: DetectorGrid) -> SparseDetectorSet {
    let wavelengths = vec![0.5, 1.0, 1.5];
    let mut set = SparseDetectorSet::new(grid, wavelengths.clone());
    for i in 0..set.len() {
        let (lat, lon) = set.angles(i).unwrap();
        let y = wavelengths
            .iter()
            .map(|w| w * (lat.sin() + lon.cos()))
            .collect();
        let h = Histogram::with_errors(wavelengths.clone(), y, vec![0.001; 3]).unwrap();
        set.set_histogram(i, h).unwrap();
    }
    set
}

#[rstest]
#[case(-0.3, 0.1)] // case 1
#[case(0.6, 1.3)] // case 2
#[case(0.0, 0.5)] // case 3
#[case(0.149, 1.299)] // case 4
#[case(-0.075, 0.9)] // case 5
#[case(0.5999, 0.1001)] // case 6
fn four_distinct_neighbours(grid: DetectorGrid, #[case] lat: f64, #[case] lon: f64) {
    let mut indices = grid.nearest_neighbour_indices(lat, lon).to_vec();
    assert!(indices.iter().all(|i| *i < grid.number_of_detectors()));
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices.len(), 4);
}

#[rstest]
#[case(0.0, 0.0)] // case 1
#[case(0.7, -2.0)] // case 2
#[case(-1.2, 3.0)] // case 3
fn zero_distance_to_self(#[case] lat: f64, #[case] lon: f64) {
    assert_eq!(great_circle_distance(lat, lon, lat, lon), 0.0);
}

#[rstest]
#[case(0.0)] // case 1
#[case(1.0)] // case 2
#[case(-2.5)] // case 3
fn opposite_poles(#[case] lon: f64) {
    let d = great_circle_distance(FRAC_PI_2, lon, -FRAC_PI_2, lon);
    assert!((d - PI).abs() < 1e-12);
}

#[rstest]
fn vertices_are_exact(populated: SparseDetectorSet) {
    for i in 0..populated.len() {
        let (lat, lon) = populated.angles(i).unwrap();
        let h = populated.bilinear_interpolate(lat, lon).unwrap();
        let stored = populated.histogram(i).unwrap();
        assert_eq!(h.y, stored.y);
        assert_eq!(h.e, stored.e);
    }
}

#[rstest]
#[case(0.01, 0.45)] // case 1
#[case(0.4, 1.1)] // case 2
#[case(-0.2, 0.2)] // case 3
fn interpolation_close_to_smooth_function(
    populated: SparseDetectorSet,
    #[case] lat: f64,
    #[case] lon: f64,
) {
    let bilinear = populated.bilinear_interpolate(lat, lon).unwrap();
    let inverse = populated.inverse_distance_interpolate(lat, lon).unwrap();
    for (j, w) in populated.wavelengths().iter().enumerate() {
        let exact = w * (lat.sin() + lon.cos());
        assert!((bilinear.y[j] - exact).abs() < 0.03, "{} vs {exact}", bilinear.y[j]);
        assert!((inverse.y[j] - exact).abs() < 0.1, "{} vs {exact}", inverse.y[j]);

        // the error estimate is never smaller than the propagated part
        assert!(bilinear.e[j] >= 0.0004);
    }
}

#[rstest]
fn covering_spans_every_angle() {
    let angles = [(0.0, 0.2), (0.1, 0.4), (0.3, 0.3)];
    let grid = DetectorGrid::covering(&angles, 3, 2).unwrap();
    assert_eq!(grid.latitude_at(0), 0.0);
    assert_eq!(grid.latitude_at(2), 0.3);
    assert_eq!(grid.longitude_at(0), 0.2);
    assert_eq!(grid.longitude_at(1), 0.4);
    assert!(DetectorGrid::covering(&[], 3, 2).is_err());
}
