//! Simulation configuration

// crate modules
use crate::error::{Error, Result};

// nscatter modules
use nscatter_histogram::InterpolationMethod;

// external crates
use serde::{Deserialize, Serialize};

// standard library
use std::path::Path;

/// Largest supported number of scattering events per path
pub const MAX_SCATTER_ORDER: usize = 5;

/// Energy transfer mode of the experiment
///
/// Only elastic scattering is modelled, the others exist so that a request
/// for them is rejected with a clear message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyMode {
    /// No energy transfer, incident and final wavelengths are equal
    #[default]
    Elastic,
    /// Fixed incident energy, as on a direct geometry spectrometer
    Direct,
    /// Fixed final energy, as on an indirect geometry spectrometer
    Indirect,
}

impl std::fmt::Display for EnergyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            EnergyMode::Elastic => "Elastic",
            EnergyMode::Direct => "Direct",
            EnergyMode::Indirect => "Indirect",
        };
        write!(f, "{name}")
    }
}

/// Dimensions of the sparse instrument grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseOptions {
    /// Number of latitude points, at least 3
    pub rows: usize,
    /// Number of longitude points, at least 2
    pub columns: usize,
}

/// Everything that controls a multiple scattering simulation
///
/// The fields are left public for direct use, but a builder is also
/// implemented. Configurations can also be read from JSON, with missing
/// fields taking their default values.
///
/// ```rust
/// # use nscatter_discus::SimulationConfig;
/// let config = SimulationConfig::from_json_str(r#"{"n_scatters": 3, "seed": 42}"#).unwrap();
///
/// assert_eq!(config.n_scatters, 3);
/// assert_eq!(config.seed, 42);
/// assert_eq!(config.n_paths_single, 10000);
/// assert_eq!(config.output_prefix, "MSResults");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of scatter orders to simulate, 1 to 5
    pub n_scatters: usize,
    /// Successful paths per point for single scattering
    pub n_paths_single: usize,
    /// Successful paths per point for each multiple scattering order
    pub n_paths_multiple: usize,
    /// Seed for the random streams, offset by each detector's spectrum number
    pub seed: u64,
    /// Energy transfer mode, only elastic is supported
    pub energy_mode: EnergyMode,
    /// Sample Q in proportion to Q.S(Q) rather than uniformly
    pub importance_sampling: bool,
    /// Simulate a coarse grid of synthetic detectors and interpolate
    pub sparse: Option<SparseOptions>,
    /// Number of wavelength points to simulate, the rest are interpolated
    pub n_wavelength_points: Option<usize>,
    /// Interpolation used to fill wavelengths that were not simulated
    pub interpolation: InterpolationMethod,
    /// Attempts at finding an entry point into the sample before giving up
    pub max_scatter_point_attempts: usize,
    /// Prefix of every output workspace name
    pub output_prefix: String,
    /// Do not print the progress bar
    pub quiet: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_scatters: 2,
            n_paths_single: 10000,
            n_paths_multiple: 10000,
            seed: 123456789,
            energy_mode: EnergyMode::Elastic,
            importance_sampling: false,
            sparse: None,
            n_wavelength_points: None,
            interpolation: InterpolationMethod::Linear,
            max_scatter_point_attempts: 5000,
            output_prefix: "MSResults".to_string(),
            quiet: false,
        }
    }
}

impl SimulationConfig {
    /// Get an instance of the [SimulationConfigBuilder]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Read a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Check every parameter before any simulation work is done
    ///
    /// ```rust
    /// # use nscatter_discus::{EnergyMode, SimulationConfig};
    /// let config = SimulationConfig::builder().n_scatters(6).build();
    /// assert!(config.validate().is_err());
    ///
    /// let config = SimulationConfig::builder().energy_mode(EnergyMode::Direct).build();
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_SCATTER_ORDER).contains(&self.n_scatters) {
            return Err(Error::InvalidScatterOrder(self.n_scatters));
        }
        if self.n_paths_single == 0 {
            return Err(Error::NoPaths("single"));
        }
        if self.n_paths_multiple == 0 && self.n_scatters > 1 {
            return Err(Error::NoPaths("multiple"));
        }
        if self.energy_mode != EnergyMode::Elastic {
            return Err(Error::UnsupportedEnergyMode(self.energy_mode));
        }
        if let Some(sparse) = &self.sparse {
            if sparse.rows < 3 {
                return Err(Error::TooFewSparseRows(sparse.rows));
            }
            if sparse.columns < 2 {
                return Err(Error::TooFewSparseColumns(sparse.columns));
            }
        }
        if self.n_wavelength_points == Some(0) {
            return Err(Error::NoWavelengthPoints);
        }
        if self.max_scatter_point_attempts == 0 {
            return Err(Error::NoScatterPointAttempts);
        }
        Ok(())
    }

    /// Number of successful paths per point for a scatter order
    pub fn paths_for(&self, order: usize) -> usize {
        if order <= 1 {
            self.n_paths_single
        } else {
            self.n_paths_multiple
        }
    }
}

/// Builder implementation for [SimulationConfig]
///
/// Allows chained setter calls, with any number of parameters set this way
/// (including none). Call [build()](SimulationConfigBuilder::build) to get
/// the final [SimulationConfig].
///
/// ```rust
/// # use nscatter_discus::{SimulationConfig, SparseOptions};
/// # use nscatter_histogram::InterpolationMethod;
/// let config = SimulationConfig::builder()
///     .n_scatters(3)
///     .n_paths_single(2000)
///     .importance_sampling(true)
///     .sparse(3, 2)
///     .n_wavelength_points(10)
///     .interpolation(InterpolationMethod::Quadratic)
///     .quiet(true)
///     .build();
///
/// assert_eq!(config.sparse, Some(SparseOptions { rows: 3, columns: 2 }));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct SimulationConfigBuilder {
    config: SimulationConfig,
}

impl SimulationConfigBuilder {
    /// Create a new instance of the builder with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [SimulationConfig] type
    pub fn build(self) -> SimulationConfig {
        self.config
    }

    /// Number of scatter orders to simulate
    pub fn n_scatters(mut self, n_scatters: usize) -> Self {
        self.config.n_scatters = n_scatters;
        self
    }

    /// Successful paths per point for single scattering
    pub fn n_paths_single(mut self, paths: usize) -> Self {
        self.config.n_paths_single = paths;
        self
    }

    /// Successful paths per point for multiple scattering orders
    pub fn n_paths_multiple(mut self, paths: usize) -> Self {
        self.config.n_paths_multiple = paths;
        self
    }

    /// Seed for the random streams
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Energy transfer mode
    pub fn energy_mode(mut self, mode: EnergyMode) -> Self {
        self.config.energy_mode = mode;
        self
    }

    /// Sample Q in proportion to Q.S(Q)
    pub fn importance_sampling(mut self, enable: bool) -> Self {
        self.config.importance_sampling = enable;
        self
    }

    /// Simulate a sparse grid of `rows` latitudes and `columns` longitudes
    pub fn sparse(mut self, rows: usize, columns: usize) -> Self {
        self.config.sparse = Some(SparseOptions { rows, columns });
        self
    }

    /// Number of wavelength points to simulate
    pub fn n_wavelength_points(mut self, points: usize) -> Self {
        self.config.n_wavelength_points = Some(points);
        self
    }

    /// Interpolation for wavelengths that were not simulated
    pub fn interpolation(mut self, method: InterpolationMethod) -> Self {
        self.config.interpolation = method;
        self
    }

    /// Attempts at finding an entry point into the sample
    pub fn max_scatter_point_attempts(mut self, attempts: usize) -> Self {
        self.config.max_scatter_point_attempts = attempts;
        self
    }

    /// Prefix of the output workspace names
    pub fn output_prefix(mut self, prefix: &str) -> Self {
        self.config.output_prefix = prefix.to_string();
        self
    }

    /// Do not print the progress bar
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.config.quiet = quiet;
        self
    }
}
