//! Point-data histograms and cumulative distributions
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod cumulative;
mod error;
mod histogram;
mod interpolate;

#[doc(inline)]
pub use crate::histogram::Histogram;

#[doc(inline)]
pub use crate::cumulative::{build_inverse, integrate_cumulative, prepare_qs, CumulativeDistribution};

#[doc(inline)]
pub use crate::interpolate::{
    interpolate_flat, interpolate_linear, interpolate_square_root, InterpolationMethod,
};

#[doc(inline)]
pub use crate::error::{Error, Result};
