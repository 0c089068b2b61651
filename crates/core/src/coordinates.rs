//! Coordinate transforms for spectral (droplet size) grids
//!
//! A transform maps the physical radius `r` onto the grid coordinate `x`.
//! The growth factory uses two of them: one for the grid layout (where bins
//! are evenly spaced) and one for the advected density (`psi = pdf / (dx/dr)`).

/// Monotonic map `r -> x` with its inverse and derivative
pub trait CoordinateTransform: Send + Sync {
    /// Grid coordinate of radius `r`
    fn x(&self, r: f64) -> f64;

    /// Radius at grid coordinate `x`
    fn r(&self, x: f64) -> f64;

    /// Derivative `dx/dr` at radius `r`
    fn dx_dr(&self, r: f64) -> f64;
}

/// `x = r`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Linear;

impl CoordinateTransform for Linear {
    fn x(&self, r: f64) -> f64 {
        r
    }

    fn r(&self, x: f64) -> f64 {
        x
    }

    fn dx_dr(&self, _r: f64) -> f64 {
        1.0
    }
}

/// `x = r^p`; `p = 2` gives a surface-like and `p = 3` a volume-like coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Power {
    /// Exponent `p`, must be positive
    pub exponent: f64,
}

impl CoordinateTransform for Power {
    fn x(&self, r: f64) -> f64 {
        r.powf(self.exponent)
    }

    fn r(&self, x: f64) -> f64 {
        x.powf(self.exponent.recip())
    }

    fn dx_dr(&self, r: f64) -> f64 {
        self.exponent * r.powf(self.exponent - 1.0)
    }
}

/// `x = ln(r / r0)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Logarithmic {
    /// Reference radius, must be positive
    pub r0: f64,
}

impl CoordinateTransform for Logarithmic {
    fn x(&self, r: f64) -> f64 {
        (r / self.r0).ln()
    }

    fn r(&self, x: f64) -> f64 {
        self.r0 * x.exp()
    }

    fn dx_dr(&self, r: f64) -> f64 {
        r.recip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn check_round_trip_and_derivative(transform: &dyn CoordinateTransform) {
        for r in [0.5, 1.0, 2.5, 10.0] {
            assert_relative_eq!(transform.r(transform.x(r)), r, max_relative = 1e-12);
            let h = 1e-6 * r;
            let numeric = (transform.x(r + h) - transform.x(r - h)) / (2.0 * h);
            assert_relative_eq!(transform.dx_dr(r), numeric, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_linear() {
        check_round_trip_and_derivative(&Linear);
        assert_eq!(Linear.x(3.0), 3.0);
    }

    #[test]
    fn test_power() {
        check_round_trip_and_derivative(&Power { exponent: 2.0 });
        check_round_trip_and_derivative(&Power { exponent: 3.0 });
        assert_relative_eq!(Power { exponent: 2.0 }.x(3.0), 9.0);
    }

    #[test]
    fn test_logarithmic() {
        let log = Logarithmic { r0: 1.0 };
        check_round_trip_and_derivative(&log);
        assert_eq!(log.x(1.0), 0.0);
    }
}
