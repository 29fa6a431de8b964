//! Sparse detector grids and angular interpolation
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod angles;
mod error;
mod grid;
mod set;

#[doc(inline)]
pub use crate::grid::DetectorGrid;

#[doc(inline)]
pub use crate::set::SparseDetectorSet;

#[doc(inline)]
pub use crate::angles::{
    great_circle_distance, inverse_distance_weights, latitude_longitude, unit_direction,
};

#[doc(inline)]
pub use crate::error::{Error, Result};
