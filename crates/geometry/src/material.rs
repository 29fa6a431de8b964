//! Sample material cross sections

// crate modules
use crate::error::{Error, Result};
use crate::shape::SampleShape;

// external crates
use serde::{Deserialize, Serialize};

/// Wavelength in Å at which tabulated absorption cross sections are quoted
pub const REFERENCE_WAVELENGTH: f64 = 1.7982;

/// Neutron cross sections of a sample material
///
/// Cross sections are in barns and the number density in atoms/Å³. The
/// absorption cross section is quoted at 1.7982 Å (2200 m/s) and scales
/// linearly with wavelength.
///
/// ```rust
/// # use nscatter_geometry::Material;
/// let vanadium = Material::new("V", 5.08, 5.1, 0.0722).unwrap();
///
/// assert!((vanadium.absorption_xs_at(1.7982) - 5.1).abs() < 1e-12);
///
/// // μ in m⁻¹ for 1 Å neutrons
/// let mu = vanadium.attenuation_coefficient(1.0);
/// assert!((mu - 100.0 * 0.0722 * (5.08 + 5.1 / 1.7982)).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Name used in log messages
    pub name: String,
    /// Total scattering cross section (barns)
    pub scattering_xs: f64,
    /// Absorption cross section at the reference wavelength (barns)
    pub absorption_xs: f64,
    /// Number density (atoms/Å³)
    pub number_density: f64,
}

impl Material {
    /// Checked material, all properties finite and non-negative
    pub fn new(
        name: impl Into<String>,
        scattering_xs: f64,
        absorption_xs: f64,
        number_density: f64,
    ) -> Result<Self> {
        let material = Self {
            name: name.into(),
            scattering_xs,
            absorption_xs,
            number_density,
        };
        material.validate()?;
        Ok(material)
    }

    /// Check every property is finite and non-negative
    ///
    /// Deserialised materials skip the constructor so should be validated
    /// before use.
    pub fn validate(&self) -> Result<()> {
        for (property, value) in [
            ("scattering cross section", self.scattering_xs),
            ("absorption cross section", self.absorption_xs),
            ("number density", self.number_density),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(Error::InvalidMaterial {
                    name: self.name.clone(),
                    property,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Absorption cross section (barns) at a wavelength in Å
    pub fn absorption_xs_at(&self, wavelength: f64) -> f64 {
        self.absorption_xs * wavelength / REFERENCE_WAVELENGTH
    }

    /// Total cross section (barns) at a wavelength in Å
    pub fn total_xs(&self, wavelength: f64) -> f64 {
        self.scattering_xs + self.absorption_xs_at(wavelength)
    }

    /// Macroscopic attenuation coefficient μ (m⁻¹) at a wavelength in Å
    ///
    /// Barns times atoms/Å³ is 10⁻⁸ Å⁻¹, or 100 m⁻¹.
    pub fn attenuation_coefficient(&self, wavelength: f64) -> f64 {
        100.0 * self.number_density * self.total_xs(wavelength)
    }
}

/// A sample: the shape it occupies and the material it is made of
///
/// ```rust
/// # use nscatter_geometry::{Cuboid, Material, Sample, SampleShape};
/// # use nalgebra::Vector3;
/// let plate = Cuboid::new(Vector3::zeros(), 0.1, 0.1, 0.002).unwrap();
/// let sample = Sample::new(plate, Material::new("V", 5.08, 5.1, 0.0722).unwrap());
///
/// assert_eq!(sample.shape().bounding_box().width().z, 0.002);
/// assert_eq!(sample.material().name, "V");
/// ```
#[derive(Debug)]
pub struct Sample {
    shape: Box<dyn SampleShape>,
    material: Material,
}

impl Sample {
    /// Sample from any shape providing the intercept capability
    pub fn new(shape: impl SampleShape + 'static, material: Material) -> Self {
        Self {
            shape: Box::new(shape),
            material,
        }
    }

    /// The sample geometry
    pub fn shape(&self) -> &dyn SampleShape {
        self.shape.as_ref()
    }

    /// The sample material
    pub fn material(&self) -> &Material {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_density() {
        let result = Material::new("bad", 1.0, 1.0, -0.1);
        assert_eq!(
            result,
            Err(Error::InvalidMaterial {
                name: "bad".to_string(),
                property: "number density",
                value: -0.1
            })
        );
    }

    #[test]
    fn nan_is_invalid() {
        assert!(Material::new("nan", f64::NAN, 1.0, 0.1).is_err());
    }
}
