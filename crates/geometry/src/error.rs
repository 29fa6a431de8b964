//! Result and Error types for nscatter-geometry

/// Type alias for Result<T, geometry::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nscatter-geometry` crate
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("{name} must be positive and finite (found {value})")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("inner radius {inner} must be smaller than the outer radius {outer}")]
    InnerRadiusTooLarge { inner: f64, outer: f64 },

    #[error("material \"{name}\" has an invalid {property} ({value})")]
    InvalidMaterial {
        name: String,
        property: &'static str,
        value: f64,
    },
}
