//! Result and Error types for nscatter-histogram

/// Type alias for Result<T, histogram::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nscatter-histogram` crate
///
/// Every variant describes malformed input and is fatal to a simulation.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("histogram has no points")]
    EmptyHistogram,

    #[error("inconsistent histogram lengths (x: {x}, y: {y}, e: {e})")]
    LengthMismatch { x: usize, y: usize, e: usize },

    #[error("x values must be strictly increasing for point data")]
    NotStrictlyIncreasing,

    #[error("momentum transfer values must not be negative (found Q={0})")]
    NegativeAxis(f64),

    #[error("distribution must start at x=0 for a cumulative integral (found x={0})")]
    MissingOrigin(f64),

    #[error("distribution doesn't extend as far as the upper integration limit x={xmax} (last point x={last})")]
    BeyondRange { xmax: f64, last: f64 },

    #[error("upper integration limit x={0} is below the origin")]
    BelowOrigin(f64),

    #[error("Integral of Q*S(Q) is zero so can't generate probability distribution")]
    ZeroIntegral,

    #[error("cannot perform square root interpolation between ({x0}, {y0}) and ({x1}, {y1})")]
    DegenerateSquareRoot { x0: f64, x1: f64, y0: f64, y1: f64 },

    #[error("at least one simulated point is required to fill a histogram")]
    NothingToInterpolate,

    #[error("simulated point index {index} is outside a histogram of {len} points")]
    SimulatedIndexOutOfRange { index: usize, len: usize },
}
