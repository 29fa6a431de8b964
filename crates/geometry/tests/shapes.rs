//! Integration tests for sample shapes

use nalgebra::Vector3;
use nscatter_geometry::{Cuboid, Cylinder, Material, SampleShape, Track};
use rstest::{fixture, rstest};

#[fixture]
fn plate() -> Cuboid {
    Cuboid::new(Vector3::zeros(), 0.2, 0.2, 0.001).unwrap()
}

#[fixture]
fn annulus() -> Cylinder {
    Cylinder::annulus(Vector3::new(0.0, 0.0, 0.0), 0.01, 0.008, 0.04).unwrap()
}

#[rstest]
#[case(0.0)] // case 1
#[case(15.0)] // case 2
#[case(30.0)] // case 3
#[case(60.0)] // case 4
fn plate_path_length_scales_with_secant(plate: Cuboid, #[case] angle: f64) {
    let theta = angle.to_radians();
    let direction = Vector3::new(theta.sin(), 0.0, theta.cos());
    let track = plate.intercept(Track::new(Vector3::new(0.0, 0.0, -0.0005), direction));
    assert_eq!(track.count(), 1);
    assert!((track.total_distance() - 0.001 / theta.cos()).abs() < 1e-12);
}

#[rstest]
#[case(0.0, 2)] // case 1
#[case(0.0079, 2)] // case 2
#[case(0.009, 1)] // case 3
#[case(0.011, 0)] // case 4
fn annulus_segment_count(annulus: Cylinder, #[case] offset: f64, #[case] expected: usize) {
    let track = annulus.intercept(Track::new(Vector3::new(offset, 0.0, -1.0), Vector3::z()));
    assert_eq!(track.count(), expected);
}

#[rstest]
fn depth_maps_across_the_hole(annulus: Cylinder) {
    let track = annulus.intercept(Track::new(Vector3::new(0.0, 0.0, -1.0), Vector3::z()));
    let first = track.segments()[0].distance;

    // just past the first wall lands on the far wall
    let point = track.point_at_depth(first + 0.0005).unwrap();
    assert!((point.z - 0.0085).abs() < 1e-12, "{point}");
}

#[rstest]
fn bounding_boxes(plate: Cuboid, annulus: Cylinder) {
    let bb = plate.bounding_box();
    assert!((bb.width() - Vector3::new(0.2, 0.2, 0.001)).norm() < 1e-15);
    assert!(bb.contains(&Vector3::zeros()));

    let bb = annulus.bounding_box();
    assert_eq!(bb.min, Vector3::new(-0.01, -0.02, -0.01));
    assert_eq!(bb.centre(), Vector3::zeros());
}

#[rstest]
fn material_from_json() {
    let json = r#"{"name": "V", "scattering_xs": 5.08, "absorption_xs": 5.1, "number_density": 0.0722}"#;
    let material: Material = serde_json::from_str(json).unwrap();
    assert!(material.validate().is_ok());
    assert!((material.total_xs(1.7982) - 10.18).abs() < 1e-12);
}
