//! Simulation of individual multiple scattering paths

// crate modules
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};

// nscatter modules
use nscatter_geometry::{Sample, Track};
use nscatter_histogram::{CumulativeDistribution, Histogram};

// external crates
use nalgebra::Vector3;
use rand::Rng;

// standard library
use std::f64::consts::PI;

/// How momentum transfer is sampled at each intermediate scatter
///
/// Chosen once for a run. The importance variant carries the inverse
/// cumulative distribution for the current incident wavenumber.
#[derive(Debug, Clone, PartialEq)]
pub enum QSampler {
    /// Uniform on [0, 2k], weighted afterwards by Q.S(Q)
    Uniform,
    /// In proportion to Q.S(Q) through the inverse cumulative distribution
    Importance(CumulativeDistribution),
}

impl QSampler {
    /// Sample Q, returning it with its weight factor
    ///
    /// The uniform factor is Q.S(Q), which also feeds the normalisation
    /// applied to the mean weight. Importance sampling already follows the
    /// physical distribution so its factor is one.
    fn sample<R: Rng>(&self, k: f64, s_of_q: &Histogram, rng: &mut R) -> Result<(f64, f64)> {
        match self {
            QSampler::Uniform => {
                let q = 2.0 * k * rng.gen::<f64>();
                Ok((q, q * s_of_q.flat_at(q)))
            }
            QSampler::Importance(inverse) => Ok((inverse.sample_q(rng.gen())?, 1.0)),
        }
    }

    /// True for the uniform variant that needs Q.S(Q) normalisation
    pub fn is_uniform(&self) -> bool {
        matches!(self, QSampler::Uniform)
    }
}

/// Outcome of one simulated path
///
/// A path that misses the sample after a scatter is not an error. It comes
/// back with `success` unset and should be simulated again.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ScatterResult {
    /// The path reached the detector
    pub success: bool,
    /// Statistical weight of the path
    pub weight: f64,
    /// Sum of Q.S(Q) over intermediate scatters in uniform sampling
    pub qss: f64,
}

impl ScatterResult {
    fn failed() -> Self {
        Self::default()
    }
}

/// Simulates neutron paths of a fixed number of scatters for one wavelength
///
/// Free path lengths are drawn from the exponential attenuation law
/// truncated to the path length inside the sample, so every scatter point
/// is inside the object and the weight carries the probability of
/// interacting at all. Each scatter multiplies the weight by the scattering
/// cross section, and the final leg by the exit attenuation and
/// `S(Q)/(4π)`.
///
/// With absorption ignored every leg has zero attenuation, so free paths
/// are uniform over the path length and the interaction weight becomes the
/// number density times the length.
#[derive(Debug)]
pub struct PathTracer<'a> {
    sample: &'a Sample,
    s_of_q: &'a Histogram,
    sampler: &'a QSampler,
    k: f64,
    scattering_xs: f64,
    total_xs: f64,
    max_attempts: usize,
}

impl<'a> PathTracer<'a> {
    /// Path tracer for one incident wavelength in Å
    ///
    /// The scattering cross section in barns may differ from the material
    /// value when a wavenumber dependent table is in use.
    pub fn new(
        sample: &'a Sample,
        s_of_q: &'a Histogram,
        sampler: &'a QSampler,
        wavelength: f64,
        scattering_xs: f64,
        max_attempts: usize,
    ) -> Self {
        let total_xs = scattering_xs + sample.material().absorption_xs_at(wavelength);
        Self {
            sample,
            s_of_q,
            sampler,
            k: 2.0 * PI / wavelength,
            scattering_xs,
            total_xs,
            max_attempts,
        }
    }

    /// Incident wavenumber in Å⁻¹
    pub fn wavenumber(&self) -> f64 {
        self.k
    }

    /// Attenuation coefficient μ in m⁻¹
    pub fn attenuation_coefficient(&self) -> f64 {
        100.0 * self.sample.material().number_density * self.total_xs
    }

    /// Simulate one path of `n_scatters` events ending at a detector
    ///
    /// Fails only if no entry point into the sample can be found within the
    /// attempt limit. Paths lost to grazing incidence return a failed
    /// [ScatterResult].
    pub fn scatter<R: Rng>(
        &self,
        n_scatters: usize,
        detector: &Vector3<f64>,
        no_absorption: bool,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<ScatterResult> {
        let track = self.generate_entry(rng, diagnostics)?;
        let mut direction = *track.direction();

        let Some((mut position, factor)) = self.advance(&track, no_absorption, rng) else {
            return Ok(ScatterResult::failed());
        };
        let mut weight = factor * self.scattering_xs;
        let mut qss = 0.0;

        for _ in 1..n_scatters {
            let (q, q_weight) = self.sampler.sample(self.k, self.s_of_q, rng)?;
            weight *= q_weight;
            if self.sampler.is_uniform() {
                qss += q_weight;
            }

            let cos_theta = (1.0 - q * q / (2.0 * self.k * self.k)).clamp(-1.0, 1.0);
            let phi = 2.0 * PI * rng.gen::<f64>();
            direction = update_track_direction(&direction, cos_theta, phi);

            let track = self.intercept(Track::new(position, direction), diagnostics);
            if track.count() == 0 {
                return Ok(ScatterResult::failed());
            }
            let Some((next, factor)) = self.advance(&track, no_absorption, rng) else {
                return Ok(ScatterResult::failed());
            };
            position = next;
            weight *= factor * self.scattering_xs;
        }

        // final leg towards the detector
        let to_detector = detector - position;
        if to_detector.norm() == 0.0 {
            return Ok(ScatterResult::failed());
        }
        let track = self.intercept(Track::new(position, to_detector), diagnostics);
        if track.count() == 0 {
            return Ok(ScatterResult::failed());
        }

        let attenuation = if no_absorption {
            1.0
        } else {
            (-self.attenuation_coefficient() * track.total_distance()).exp()
        };
        let q = (track.direction() - direction).norm() * self.k;
        weight *= attenuation * self.s_of_q.flat_at(q) / (4.0 * PI);

        Ok(ScatterResult {
            success: true,
            weight,
            qss,
        })
    }

    /// Track along the beam that hits the sample
    ///
    /// Start points are uniform over the front face of the bounding box.
    fn generate_entry<R: Rng>(&self, rng: &mut R, diagnostics: &mut Diagnostics) -> Result<Track> {
        let bounds = self.sample.shape().bounding_box();
        let width = bounds.width();

        for attempt in 1..=self.max_attempts {
            let start = Vector3::new(
                bounds.min.x + rng.gen::<f64>() * width.x,
                bounds.min.y + rng.gen::<f64>() * width.y,
                bounds.min.z - width.z,
            );
            let track = self.intercept(Track::new(start, Vector3::z()), diagnostics);
            if track.count() > 0 {
                diagnostics.record_entry(attempt);
                return Ok(track);
            }
        }
        Err(Error::EntryAttemptsExceeded(self.max_attempts))
    }

    /// Sample a scatter point along the track and its interaction weight
    fn advance<R: Rng>(
        &self,
        track: &Track,
        no_absorption: bool,
        rng: &mut R,
    ) -> Option<(Vector3<f64>, f64)> {
        let length = track.total_distance();
        let mu = self.attenuation_coefficient();
        let u = rng.gen::<f64>();

        let (depth, factor) = if no_absorption || mu == 0.0 {
            let density = 100.0 * self.sample.material().number_density;
            (u * length, density * length)
        } else {
            let b4 = -(-mu * length).exp_m1();
            (-(-u * b4).ln_1p() / mu, b4 / self.total_xs)
        };

        let point = track.point_at_depth(depth.min(length))?;
        Some((point, factor))
    }

    fn intercept(&self, track: Track, diagnostics: &mut Diagnostics) -> Track {
        diagnostics.intercept_calls += 1;
        self.sample.shape().intercept(track)
    }
}

/// Rotate a direction by a polar scattering angle and an azimuth
///
/// The new direction makes an angle with cosine `cos_theta` to the old one,
/// with `phi` choosing where it lies on the cone. A direction along the
/// vertical takes a separate branch as the horizontal projection that
/// defines the azimuth vanishes.
///
/// ```rust
/// # use nscatter_discus::update_track_direction;
/// # use nalgebra::Vector3;
/// let theta = 60.0_f64.to_radians();
/// let v = update_track_direction(&Vector3::z(), theta.cos(), std::f64::consts::PI);
///
/// assert!(v.x.abs() < 1e-12);
/// assert!((v.y + theta.sin()).abs() < 1e-12);
/// assert!((v.z - theta.cos()).abs() < 1e-12);
/// ```
pub fn update_track_direction(direction: &Vector3<f64>, cos_theta: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // beam, horizontal and vertical components
    let (vb, vh, vv) = (direction.z, direction.x, direction.y);
    let horizontal = (vb * vb + vh * vh).sqrt();

    let (ub, uh, uv) = if horizontal > 1e-12 {
        let qb = -cos_phi * vv * vb / horizontal + sin_phi * vh / horizontal;
        let qh = -cos_phi * vv * vh / horizontal - sin_phi * vb / horizontal;
        let qv = cos_phi * horizontal;
        (
            cos_theta * vb + sin_theta * qb,
            cos_theta * vh + sin_theta * qh,
            cos_theta * vv + sin_theta * qv,
        )
    } else {
        (sin_theta * cos_phi, sin_theta * sin_phi, cos_theta * vv)
    };

    Vector3::new(uh, uv, ub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nscatter_geometry::{BoundingBox, Cuboid, Material, SampleShape, Segment};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn plate() -> Sample {
        let shape = Cuboid::new(Vector3::zeros(), 0.1, 0.1, 0.002).unwrap();
        Sample::new(shape, Material::new("V", 5.08, 5.1, 0.0722).unwrap())
    }

    fn flat_sq() -> Histogram {
        Histogram::new(vec![0.0, 100.0], vec![1.0, 1.0]).unwrap()
    }

    #[test]
    fn vertical_directions_are_finite() {
        for direction in [Vector3::y(), -Vector3::y()] {
            for phi in [0.0, 1.0, 4.0] {
                let v = update_track_direction(&direction, 0.3, phi);
                assert!(v.iter().all(|c| c.is_finite()));
                assert!((v.norm() - 1.0).abs() < 1e-12);
                assert!((v.dot(&direction) - 0.3).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn rotation_keeps_scattering_angle() {
        let direction = Vector3::new(0.3, -0.4, 0.5).normalize();
        for phi in [0.0, 0.7, 2.0, 5.5] {
            let v = update_track_direction(&direction, -0.2, phi);
            assert!((v.norm() - 1.0).abs() < 1e-12);
            assert!((v.dot(&direction) + 0.2).abs() < 1e-12);
        }
    }

    #[test]
    fn no_absorption_weight_is_thin_sample_limit() {
        // normal incidence through a uniform plate is deterministic
        let sample = plate();
        let s_of_q = flat_sq();
        let sampler = QSampler::Uniform;
        let tracer = PathTracer::new(&sample, &s_of_q, &sampler, 1.0, 5.08, 100);

        let mut rng = StdRng::seed_from_u64(1);
        let mut diagnostics = Diagnostics::default();
        let detector = Vector3::new(0.0, 0.0, 100.0);
        let result = tracer
            .scatter(1, &detector, true, &mut rng, &mut diagnostics)
            .unwrap();

        let expected = 100.0 * 0.0722 * 0.002 * 5.08 / (4.0 * PI);
        assert!(result.success);
        assert!((result.weight - expected).abs() < 1e-12);
        assert_eq!(diagnostics.intercept_calls, 2);
    }

    #[test]
    fn uniform_sampling_accumulates_qss() {
        let sample = plate();
        let s_of_q = flat_sq();
        let sampler = QSampler::Uniform;
        let tracer = PathTracer::new(&sample, &s_of_q, &sampler, 2.0, 5.08, 100);

        let mut rng = StdRng::seed_from_u64(5);
        let mut diagnostics = Diagnostics::default();
        let detector = Vector3::new(0.0, 0.0, 100.0);

        let mut successes = 0;
        for _ in 0..100 {
            let result = tracer
                .scatter(3, &detector, false, &mut rng, &mut diagnostics)
                .unwrap();
            if result.success {
                successes += 1;
                assert!(result.qss > 0.0 && result.qss <= 2.0 * 2.0 * tracer.wavenumber());
            }
        }
        assert!(successes > 0);
        assert_eq!(diagnostics.entry_tracks(), 100);
    }

    /// Shape that no ray ever intersects
    #[derive(Debug)]
    struct Unreachable;

    impl SampleShape for Unreachable {
        fn bounding_box(&self) -> BoundingBox {
            BoundingBox::new(Vector3::repeat(-0.01), Vector3::repeat(0.01))
        }

        fn segments(&self, _: &Vector3<f64>, _: &Vector3<f64>) -> Vec<Segment> {
            Vec::new()
        }
    }

    #[test]
    fn entry_attempts_exhausted() {
        let sample = Sample::new(Unreachable, Material::new("V", 5.08, 5.1, 0.0722).unwrap());
        let s_of_q = flat_sq();
        let sampler = QSampler::Uniform;
        let tracer = PathTracer::new(&sample, &s_of_q, &sampler, 1.0, 5.08, 7);

        let mut rng = StdRng::seed_from_u64(3);
        let mut diagnostics = Diagnostics::default();
        let detector = Vector3::new(0.0, 0.0, 10.0);

        let result = tracer.scatter(1, &detector, false, &mut rng, &mut diagnostics);
        assert!(matches!(result, Err(Error::EntryAttemptsExceeded(7))));
        assert_eq!(diagnostics.intercept_calls, 7);
    }
}
