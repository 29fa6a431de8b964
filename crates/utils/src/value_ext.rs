use crate::f;

/// Extends float primitives with formatting and comparison helpers
pub trait ValueExt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition of the mantissa precision and exponent padding.
    ///
    /// ```rust
    /// # use nscatter_utils::ValueExt;
    /// assert_eq!((-1.0_f64).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!(0.00123_f64.sci(2, 3), "1.23e-003".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;

    /// Absolute difference within `tolerance`
    ///
    /// ```rust
    /// # use nscatter_utils::ValueExt;
    /// assert!(1.0_f64.approx_eq(1.0 + 1e-12, 1e-9));
    /// assert!(!1.0_f64.approx_eq(1.1, 1e-9));
    /// ```
    fn approx_eq(&self, other: f64, tolerance: f64) -> bool;
}

impl ValueExt for f64 {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let formatted = f!("{:.precision$e}", self, precision = precision);

        // LowerExp always writes an 'e', fall back to the raw text regardless
        let Some((mantissa, exponent)) = formatted.split_once('e') else {
            return formatted;
        };

        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };

        f!("{mantissa}e{sign}{digits:0>exp_pad$}")
    }

    fn approx_eq(&self, other: f64, tolerance: f64) -> bool {
        (self - other).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_pads_exponent() {
        assert_eq!(12345.0_f64.sci(2, 2), "1.23e+04");
        assert_eq!(0.5_f64.sci(1, 1), "5.0e-1");
    }

    #[test]
    fn approx_eq_is_absolute() {
        assert!(1e-6_f64.approx_eq(1.5e-6, 1e-6));
        assert!(!1e-6_f64.approx_eq(3e-6, 1e-6));
        assert!(!f64::NAN.approx_eq(0.0, 1.0));
    }
}
