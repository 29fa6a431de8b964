//! Spherical angle helpers
//!
//! The beam travels along +z with y pointing up, so latitude is the angle
//! above the horizontal plane and longitude the angle from the beam axis
//! towards +x.

// external crates
use nalgebra::Vector3;

/// Latitude and longitude of a position relative to the sample at the origin
///
/// ```rust
/// # use nscatter_sparse::latitude_longitude;
/// # use nalgebra::Vector3;
/// let (lat, lon) = latitude_longitude(&Vector3::new(1.0, 0.0, 0.0));
/// assert_eq!(lat, 0.0);
/// assert_eq!(lon, std::f64::consts::FRAC_PI_2);
/// ```
pub fn latitude_longitude(position: &Vector3<f64>) -> (f64, f64) {
    let r = position.norm();
    if r == 0.0 {
        return (0.0, 0.0);
    }
    let latitude = (position.y / r).clamp(-1.0, 1.0).asin();
    let longitude = position.x.atan2(position.z);
    (latitude, longitude)
}

/// Unit vector pointing at a latitude and longitude
pub fn unit_direction(latitude: f64, longitude: f64) -> Vector3<f64> {
    Vector3::new(
        latitude.cos() * longitude.sin(),
        latitude.sin(),
        latitude.cos() * longitude.cos(),
    )
}

/// Angular distance between two points on a unit sphere
///
/// Uses the haversine form, which stays accurate for small separations.
///
/// ```rust
/// # use nscatter_sparse::great_circle_distance;
/// use std::f64::consts::PI;
/// assert_eq!(great_circle_distance(0.3, 1.2, 0.3, 1.2), 0.0);
/// assert!((great_circle_distance(0.0, 0.0, 0.0, PI) - PI).abs() < 1e-12);
/// ```
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat_term = ((lat1 - lat2) / 2.0).sin();
    let lon_term = ((lon1 - lon2) / 2.0).sin();
    let h = lat_term * lat_term + lat1.cos() * lat2.cos() * lon_term * lon_term;
    2.0 * h.sqrt().min(1.0).asin()
}

/// Inverse square distance weights, unnormalised
///
/// A zero distance takes all of the weight.
///
/// ```rust
/// # use nscatter_sparse::inverse_distance_weights;
/// assert_eq!(inverse_distance_weights(&[1.0, 2.0, 0.0, 4.0]), [0.0, 0.0, 1.0, 0.0]);
/// assert_eq!(inverse_distance_weights(&[2.0; 4]), [0.25; 4]);
/// ```
pub fn inverse_distance_weights(distances: &[f64; 4]) -> [f64; 4] {
    let mut weights = [0.0; 4];
    for (i, d) in distances.iter().enumerate() {
        if *d == 0.0 {
            weights = [0.0; 4];
            weights[i] = 1.0;
            return weights;
        }
        weights[i] = 1.0 / (d * d);
    }
    weights
}
