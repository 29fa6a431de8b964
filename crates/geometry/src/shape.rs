//! Sample shapes and ray intersections

// crate modules
use crate::error::{Error, Result};
use crate::track::{Segment, Track};

// external crates
use nalgebra::Vector3;

/// Segments shorter than this are treated as grazing and dropped
const MIN_SEGMENT: f64 = 1e-12;

/// Axis-aligned box around a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Lower corner
    pub min: Vector3<f64>,
    /// Upper corner
    pub max: Vector3<f64>,
}

impl BoundingBox {
    /// Box between two corners
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    /// Extent along each axis
    pub fn width(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Centre point
    pub fn centre(&self) -> Vector3<f64> {
        0.5 * (self.min + self.max)
    }

    /// True if the point is inside or on the surface
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

/// The intercept capability required of a sample geometry
///
/// Implementors report every stretch of a ray that lies inside the object,
/// ordered along the ray and restricted to the forward direction. A ray
/// starting inside the object has its first segment start at the start
/// point.
pub trait SampleShape: std::fmt::Debug + Send + Sync {
    /// Axis-aligned box containing the whole shape
    fn bounding_box(&self) -> BoundingBox;

    /// Forward segments of the ray inside the shape
    fn segments(&self, start: &Vector3<f64>, direction: &Vector3<f64>) -> Vec<Segment>;

    /// Intersect a track with the shape, replacing any previous segments
    fn intercept(&self, track: Track) -> Track {
        let segments = self.segments(track.start(), track.direction());
        track.with_segments(segments)
    }
}

/// Axis-aligned rectangular block, e.g. a flat plate
///
/// ```rust
/// # use nscatter_geometry::{Cuboid, SampleShape, Track};
/// # use nalgebra::Vector3;
/// // 1 mm plate perpendicular to the beam
/// let plate = Cuboid::new(Vector3::zeros(), 0.2, 0.2, 0.001).unwrap();
///
/// let track = Track::new(Vector3::new(0.0, 0.0, -1.0), Vector3::z());
/// let track = plate.intercept(track);
/// assert_eq!(track.count(), 1);
/// assert!((track.total_distance() - 0.001).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cuboid {
    centre: Vector3<f64>,
    half_width: Vector3<f64>,
}

impl Cuboid {
    /// Block centred on `centre` with full widths along x, y and z
    pub fn new(centre: Vector3<f64>, width_x: f64, width_y: f64, width_z: f64) -> Result<Self> {
        check_dimension("cuboid width along x", width_x)?;
        check_dimension("cuboid width along y", width_y)?;
        check_dimension("cuboid width along z", width_z)?;
        Ok(Self {
            centre,
            half_width: 0.5 * Vector3::new(width_x, width_y, width_z),
        })
    }
}

impl SampleShape for Cuboid {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.centre - self.half_width, self.centre + self.half_width)
    }

    fn segments(&self, start: &Vector3<f64>, direction: &Vector3<f64>) -> Vec<Segment> {
        let bounds = self.bounding_box();
        let mut interval = Some((0.0, f64::INFINITY));
        for axis in 0..3 {
            let slab = slab_interval(start[axis], direction[axis], bounds.min[axis], bounds.max[axis]);
            interval = intersect(interval, slab);
        }
        to_segments(start, direction, interval.into_iter().collect())
    }
}

/// Cylinder with its axis along y, optionally hollow
///
/// An inner radius turns the cylinder into an annulus, giving up to two
/// segments for a ray passing through the hollow centre.
///
/// ```rust
/// # use nscatter_geometry::{Cylinder, SampleShape, Track};
/// # use nalgebra::Vector3;
/// let can = Cylinder::annulus(Vector3::zeros(), 0.01, 0.009, 0.05).unwrap();
///
/// let track = can.intercept(Track::new(Vector3::new(0.0, 0.0, -1.0), Vector3::z()));
/// assert_eq!(track.count(), 2);
/// assert!((track.total_distance() - 0.002).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    centre: Vector3<f64>,
    radius: f64,
    inner_radius: Option<f64>,
    height: f64,
}

impl Cylinder {
    /// Solid cylinder centred on `centre`
    pub fn new(centre: Vector3<f64>, radius: f64, height: f64) -> Result<Self> {
        check_dimension("cylinder radius", radius)?;
        check_dimension("cylinder height", height)?;
        Ok(Self {
            centre,
            radius,
            inner_radius: None,
            height,
        })
    }

    /// Hollow cylinder between `inner_radius` and `radius`
    pub fn annulus(
        centre: Vector3<f64>,
        radius: f64,
        inner_radius: f64,
        height: f64,
    ) -> Result<Self> {
        check_dimension("annulus inner radius", inner_radius)?;
        if inner_radius >= radius {
            return Err(Error::InnerRadiusTooLarge {
                inner: inner_radius,
                outer: radius,
            });
        }
        let mut cylinder = Self::new(centre, radius, height)?;
        cylinder.inner_radius = Some(inner_radius);
        Ok(cylinder)
    }

    /// Interval of the ray inside an infinite vertical cylinder of radius `r`
    fn radial_interval(
        &self,
        start: &Vector3<f64>,
        direction: &Vector3<f64>,
        r: f64,
    ) -> Option<(f64, f64)> {
        let px = start.x - self.centre.x;
        let pz = start.z - self.centre.z;
        let a = direction.x * direction.x + direction.z * direction.z;
        let c = px * px + pz * pz - r * r;

        // vertical ray never crosses the curved surface
        if a < 1e-24 {
            return (c <= 0.0).then_some((f64::NEG_INFINITY, f64::INFINITY));
        }

        let b = px * direction.x + pz * direction.z;
        let discriminant = b * b - a * c;
        if discriminant <= 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        Some(((-b - root) / a, (-b + root) / a))
    }
}

impl SampleShape for Cylinder {
    fn bounding_box(&self) -> BoundingBox {
        let half = Vector3::new(self.radius, 0.5 * self.height, self.radius);
        BoundingBox::new(self.centre - half, self.centre + half)
    }

    fn segments(&self, start: &Vector3<f64>, direction: &Vector3<f64>) -> Vec<Segment> {
        let half_height = 0.5 * self.height;
        let axial = slab_interval(
            start.y,
            direction.y,
            self.centre.y - half_height,
            self.centre.y + half_height,
        );
        let outer = self.radial_interval(start, direction, self.radius);
        let solid = intersect(intersect(Some((0.0, f64::INFINITY)), axial), outer);

        let Some((near, far)) = solid else {
            return Vec::new();
        };

        let intervals = match self
            .inner_radius
            .and_then(|r| self.radial_interval(start, direction, r))
        {
            Some((hole_near, hole_far)) => vec![(near, far.min(hole_near)), (near.max(hole_far), far)],
            None => vec![(near, far)],
        };
        to_segments(start, direction, intervals)
    }
}

/// Interval along a ray between two parallel planes on one axis
fn slab_interval(p: f64, d: f64, lo: f64, hi: f64) -> Option<(f64, f64)> {
    if d.abs() < 1e-12 {
        return (p >= lo && p <= hi).then_some((f64::NEG_INFINITY, f64::INFINITY));
    }
    let t1 = (lo - p) / d;
    let t2 = (hi - p) / d;
    Some((t1.min(t2), t1.max(t2)))
}

/// Overlap of two intervals
fn intersect(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    let ((a0, a1), (b0, b1)) = (a?, b?);
    let (near, far) = (a0.max(b0), a1.min(b1));
    (far > near).then_some((near, far))
}

/// Convert ordered intervals to segments, dropping grazing ones
fn to_segments(
    start: &Vector3<f64>,
    direction: &Vector3<f64>,
    intervals: Vec<(f64, f64)>,
) -> Vec<Segment> {
    intervals
        .into_iter()
        .filter(|(near, far)| far - near > MIN_SEGMENT && far.is_finite())
        .map(|(near, far)| Segment::along(start, direction, near, far))
        .collect()
}

fn check_dimension(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidDimension { name, value })
    }
}
