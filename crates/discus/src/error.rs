//! Result and Error types for nscatter-discus

// crate modules
use crate::config::EnergyMode;

/// Type alias for Result<T, discus::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nscatter-discus` crate
///
/// Every variant is fatal to a simulation. Paths that miss the sample by
/// grazing incidence are retried internally and never surface as errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to parse simulation configuration")]
    JsonError(#[from] serde_json::Error),

    #[error("number of scatterings must be between 1 and 5 (found {0})")]
    InvalidScatterOrder(usize),

    #[error("number of {0} scattering paths must be positive")]
    NoPaths(&'static str),

    #[error("only elastic scattering is supported (found {0})")]
    UnsupportedEnergyMode(EnergyMode),

    #[error("sparse instrument needs at least 3 rows (found {0})")]
    TooFewSparseRows(usize),

    #[error("sparse instrument needs at least 2 columns (found {0})")]
    TooFewSparseColumns(usize),

    #[error("number of wavelength points must be positive")]
    NoWavelengthPoints,

    #[error("maximum scatter point attempts must be positive")]
    NoScatterPointAttempts,

    #[error("S(Q) must not be negative (found S={s} at Q={q})")]
    NegativeStructureFactor { q: f64, s: f64 },

    #[error("scattering cross section must not be negative (found {xs} barns at k={k})")]
    NegativeCrossSection { k: f64, xs: f64 },

    #[error("no detectors provided")]
    NoDetectors,

    #[error("detector {0} has no wavelength points")]
    EmptyWavelengths(u64),

    #[error("wavelengths of detector {0} must be positive and strictly increasing")]
    InvalidWavelengths(u64),

    #[error("every detector is either a monitor or masked, nothing to simulate")]
    NothingToSimulate,

    #[error(
        "unable to generate entry point into sample after {0} attempts, try increasing max_scatter_point_attempts"
    )]
    EntryAttemptsExceeded(usize),

    #[error("path generation abandoned for detector {spectrum} after {discarded} discarded paths while {paths} were needed, only a broken sample geometry gets this far")]
    TooManyDiscardedPaths {
        spectrum: u64,
        discarded: usize,
        paths: usize,
    },

    #[error(transparent)]
    HistogramError(#[from] nscatter_histogram::Error),

    #[error(transparent)]
    SparseError(#[from] nscatter_sparse::Error),

    #[error(transparent)]
    GeometryError(#[from] nscatter_geometry::Error),
}
