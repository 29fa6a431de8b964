//! Result and Error types for nscatter-sparse

/// Type alias for Result<T, sparse::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nscatter-sparse` crate
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("detector grid needs at least 2 latitude points (found {0})")]
    TooFewRows(usize),

    #[error("detector grid needs at least 2 longitude points (found {0})")]
    TooFewColumns(usize),

    #[error("minimum latitude {min} is larger than the maximum {max}")]
    InvertedLatitude { min: f64, max: f64 },

    #[error("minimum longitude {min} is larger than the maximum {max}")]
    InvertedLongitude { min: f64, max: f64 },

    #[error("grid point ({row}, {column}) is outside a {rows}x{columns} detector grid")]
    IndexOutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    #[error("sparse detector {index} does not exist (found {len} detectors)")]
    DetectorOutOfRange { index: usize, len: usize },

    #[error("inconsistent number of wavelength points (expected {expected}, found {found})")]
    WavelengthMismatch { expected: usize, found: usize },

    #[error("no detector angles to cover with a grid")]
    NoDetectors,

    #[error("invalid detector angles")]
    InvalidAngles(#[from] nscatter_utils::Error),
}
