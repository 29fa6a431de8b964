//! Sample geometry, tracks and materials
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod error;
mod material;
mod shape;
mod track;

#[doc(inline)]
pub use crate::track::{Segment, Track};

#[doc(inline)]
pub use crate::shape::{BoundingBox, Cuboid, Cylinder, SampleShape};

#[doc(inline)]
pub use crate::material::{Material, Sample, REFERENCE_WAVELENGTH};

#[doc(inline)]
pub use crate::error::{Error, Result};
