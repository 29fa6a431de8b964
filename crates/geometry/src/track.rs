//! Neutron tracks and their intersections with a sample

// external crates
use nalgebra::Vector3;

/// One continuous stretch of a track inside the sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Point where the track enters the object, or the start point if the
    /// track starts inside
    pub entry: Vector3<f64>,
    /// Point where the track leaves the object
    pub exit: Vector3<f64>,
    /// Path length inside the object between entry and exit
    pub distance: f64,
}

impl Segment {
    /// Segment between two distances along a ray
    pub fn along(start: &Vector3<f64>, direction: &Vector3<f64>, near: f64, far: f64) -> Self {
        Self {
            entry: start + direction * near,
            exit: start + direction * far,
            distance: far - near,
        }
    }
}

/// A ray with the segments where it passes through the sample
///
/// Tracks are small values moved through each stage of a path. Every new
/// start point or direction is a new track without segments, so stale
/// intersections can never be reused.
///
/// ```rust
/// # use nscatter_geometry::{Segment, Track};
/// # use nalgebra::Vector3;
/// let track = Track::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 2.0));
/// assert_eq!(track.direction(), &Vector3::new(0.0, 0.0, 1.0));
///
/// let start = *track.start();
/// let direction = *track.direction();
/// let track = track.with_segments(vec![
///     Segment::along(&start, &direction, 1.0, 2.0),
///     Segment::along(&start, &direction, 3.0, 5.0),
/// ]);
///
/// assert_eq!(track.total_distance(), 3.0);
/// assert_eq!(track.point_at_depth(1.5), Some(Vector3::new(0.0, 0.0, 3.5)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    start: Vector3<f64>,
    direction: Vector3<f64>,
    segments: Vec<Segment>,
}

impl Track {
    /// Track from a start point along a direction, normalised to unit length
    pub fn new(start: Vector3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            start,
            direction: direction.normalize(),
            segments: Vec::new(),
        }
    }

    /// Start point of the track
    pub fn start(&self) -> &Vector3<f64> {
        &self.start
    }

    /// Unit direction of the track
    pub fn direction(&self) -> &Vector3<f64> {
        &self.direction
    }

    /// Intersection segments ordered along the track
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of intersection segments
    pub fn count(&self) -> usize {
        self.segments.len()
    }

    /// Total path length inside the sample over every segment
    pub fn total_distance(&self) -> f64 {
        self.segments.iter().map(|s| s.distance).sum()
    }

    /// Point at a path length `depth` measured inside the sample only
    ///
    /// Gaps between segments are skipped, so a depth is always mapped onto
    /// the segment containing it. Returns `None` if the depth is negative or
    /// beyond the total distance.
    pub fn point_at_depth(&self, depth: f64) -> Option<Vector3<f64>> {
        if depth < 0.0 {
            return None;
        }
        let mut remaining = depth;
        for segment in &self.segments {
            if remaining <= segment.distance {
                return Some(segment.entry + self.direction * remaining);
            }
            remaining -= segment.distance;
        }
        None
    }

    /// Replace the intersection segments
    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_outside_segments() {
        let track = Track::new(Vector3::zeros(), Vector3::x());
        let start = *track.start();
        let track = track.with_segments(vec![Segment::along(&start, &Vector3::x(), 0.5, 1.0)]);
        assert_eq!(track.point_at_depth(-0.1), None);
        assert_eq!(track.point_at_depth(0.6), None);
        assert_eq!(track.point_at_depth(0.0), Some(Vector3::new(0.5, 0.0, 0.0)));
    }
}
