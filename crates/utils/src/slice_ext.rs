use crate::error::{Error, Result};

/// Extends functionality for slices of float arrays
pub trait SliceExt<T> {
    /// Find the minimum value in float arrays
    ///
    /// Only provides the minimum value from a collection of valid numbers. Any
    /// NAN values, infinite values, or empty slices will return an error.
    ///
    /// ```rust
    /// # use nscatter_utils::SliceExt;
    /// # use nscatter_utils::Error;
    /// // Successful cases
    /// assert_eq!([1.1, 0.5, 2.2].try_min(), Ok(0.5));
    /// assert_eq!([1.1, f64::MIN, 2.2].try_min(), Ok(f64::MIN));
    ///
    /// // Error cases
    /// assert_eq!([1.1, f64::NAN, 2.2].try_min(), Err(Error::SliceContainsUndefinedValues));
    /// assert_eq!(Vec::<f64>::new().try_min(), Err(Error::SliceContainsNoValues));
    /// ```
    ///
    /// Uses `total_cmp` to always produce an ordering in accordance to the
    /// totalOrder predicate of IEEE 754.
    fn try_min(&self) -> Result<T>;

    /// Find the maximum value in float arrays
    ///
    /// Only provides the maximum value from a collection of valid numbers. Any
    /// NAN values, infinite values, or empty slices will return an error.
    ///
    /// ```rust
    /// # use nscatter_utils::SliceExt;
    /// # use nscatter_utils::Error;
    /// assert_eq!([1.1, 0.5, 2.2].try_max(), Ok(2.2));
    /// assert_eq!([1.1, f64::INFINITY].try_max(), Err(Error::SliceContainsUndefinedValues));
    /// ```
    fn try_max(&self) -> Result<T>;

    /// Number of leading values less than or equal to `value`
    ///
    /// Equivalent to the C++ `upper_bound` position on an ascending axis, so
    /// `upper_bound(x) - 1` is the last tabulated point at or below `x`.
    ///
    /// ```rust
    /// # use nscatter_utils::SliceExt;
    /// let axis = [0.0, 1.0, 2.0, 3.0];
    /// assert_eq!(axis.upper_bound(-0.5), 0);
    /// assert_eq!(axis.upper_bound(1.0), 2);
    /// assert_eq!(axis.upper_bound(2.5), 3);
    /// assert_eq!(axis.upper_bound(9.0), 4);
    /// ```
    fn upper_bound(&self, value: T) -> usize;

    /// True when every value is larger than the one before it
    ///
    /// ```rust
    /// # use nscatter_utils::SliceExt;
    /// assert!([0.0, 0.5, 2.0].is_strictly_increasing());
    /// assert!(![0.0, 0.5, 0.5].is_strictly_increasing());
    /// ```
    fn is_strictly_increasing(&self) -> bool;
}

impl SliceExt<f64> for [f64] {
    fn try_min(&self) -> Result<f64> {
        if self.iter().any(|v| !v.is_finite()) {
            return Err(Error::SliceContainsUndefinedValues);
        };

        self.iter()
            .copied()
            .min_by(|a, b| a.total_cmp(b))
            .ok_or(Error::SliceContainsNoValues)
    }

    fn try_max(&self) -> Result<f64> {
        if self.iter().any(|v| !v.is_finite()) {
            return Err(Error::SliceContainsUndefinedValues);
        };

        self.iter()
            .copied()
            .max_by(|a, b| a.total_cmp(b))
            .ok_or(Error::SliceContainsNoValues)
    }

    fn upper_bound(&self, value: f64) -> usize {
        self.partition_point(|x| *x <= value)
    }

    fn is_strictly_increasing(&self) -> bool {
        self.windows(2).all(|pair| pair[0] < pair[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_with_repeated_values() {
        // cumulative distributions repeat values over zero-probability regions
        let axis = [0.0, 0.5, 0.5, 0.5, 1.0];
        assert_eq!(axis.upper_bound(0.5), 4);
        assert_eq!(axis.upper_bound(0.49), 1);
    }
}
