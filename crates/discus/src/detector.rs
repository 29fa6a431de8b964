//! Detectors of the instrument being corrected

// crate modules
use crate::error::{Error, Result};

// nscatter modules
use nscatter_sparse::latitude_longitude;
use nscatter_utils::SliceExt;

// external crates
use nalgebra::Vector3;

/// A detector spectrum to simulate
///
/// Positions are in metres relative to the sample at the origin and the
/// wavelength axis is in Å, one simulated point per wavelength.
///
/// ```rust
/// # use nscatter_discus::Detector;
/// # use nalgebra::Vector3;
/// let detector = Detector::new(3, Vector3::new(1.0, 0.0, 1.0), vec![1.0, 1.5, 2.0]);
/// assert!(detector.is_simulated());
///
/// let (lat, lon) = detector.angles();
/// assert_eq!(lat, 0.0);
/// assert!((lon - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
///
/// assert!(!detector.monitor().is_simulated());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    /// Spectrum number, used to offset the random seed
    pub spectrum_no: u64,
    /// Position relative to the sample (m)
    pub position: Vector3<f64>,
    /// Wavelength axis (Å)
    pub wavelengths: Vec<f64>,
    /// Monitors are never simulated
    pub is_monitor: bool,
    /// Masked detectors are never simulated
    pub is_masked: bool,
}

impl Detector {
    /// Ordinary detector at a position
    pub fn new(spectrum_no: u64, position: Vector3<f64>, wavelengths: Vec<f64>) -> Self {
        Self {
            spectrum_no,
            position,
            wavelengths,
            is_monitor: false,
            is_masked: false,
        }
    }

    /// Flag as a monitor
    pub fn monitor(mut self) -> Self {
        self.is_monitor = true;
        self
    }

    /// Flag as masked
    pub fn masked(mut self) -> Self {
        self.is_masked = true;
        self
    }

    /// True unless the detector is a monitor or masked
    pub fn is_simulated(&self) -> bool {
        !(self.is_monitor || self.is_masked)
    }

    /// Latitude and longitude of the detector seen from the sample
    pub fn angles(&self) -> (f64, f64) {
        latitude_longitude(&self.position)
    }

    /// Distance from the sample
    pub fn distance(&self) -> f64 {
        self.position.norm()
    }

    /// Check the wavelength axis is usable
    pub fn validate(&self) -> Result<()> {
        if self.wavelengths.is_empty() {
            return Err(Error::EmptyWavelengths(self.spectrum_no));
        }
        let positive = self.wavelengths.iter().all(|w| *w > 0.0 && w.is_finite());
        if !positive || !self.wavelengths.is_strictly_increasing() {
            return Err(Error::InvalidWavelengths(self.spectrum_no));
        }
        Ok(())
    }
}
