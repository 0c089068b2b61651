//! Solver configuration
//!
//! [`Options`] is fixed when a stepper is assembled. The combination of flags
//! determines the halo depth (see [`Options::n_halo`]) and the stage plan
//! built by [`super::StepBuilder`].

use crate::error::{MpdataError, Result};
use serde::{Deserialize, Serialize};

/// Default clamp threshold for near-zero denominators
pub const DEFAULT_EPSILON: f64 = 1e-15;

/// Largest accepted number of passes
pub const MAX_N_ITERS: usize = 64;

/// MPDATA configuration record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Number of passes; 1 is plain donor-cell (upwind), each extra pass adds
    /// one antidiffusive correction
    pub n_iters: usize,
    /// Add the divergent-flow correction term
    pub divergent_flow: bool,
    /// Limit corrective fluxes so no new extrema appear (non-oscillatory option)
    pub flux_corrected_transport: bool,
    /// Add third-order correction terms
    pub third_order_terms: bool,
    /// Dimensionless diffusion coefficient `nu * dt / dx^2`; `None` disables diffusion
    pub mu_coeff: Option<f64>,
    /// Denominators at or below this value are treated as zero
    pub epsilon: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            n_iters: 2,
            divergent_flow: false,
            flux_corrected_transport: false,
            third_order_terms: false,
            mu_coeff: None,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl Options {
    /// Plain first-order upwind (single pass, no options)
    pub fn upwind() -> Self {
        Self {
            n_iters: 1,
            ..Self::default()
        }
    }

    /// Set the number of passes
    pub fn with_n_iters(mut self, n_iters: usize) -> Self {
        self.n_iters = n_iters;
        self
    }

    /// Enable or disable flux-corrected transport
    pub fn with_fct(mut self, enabled: bool) -> Self {
        self.flux_corrected_transport = enabled;
        self
    }

    /// Enable or disable the divergent-flow term
    pub fn with_divergent_flow(mut self, enabled: bool) -> Self {
        self.divergent_flow = enabled;
        self
    }

    /// Enable or disable third-order terms
    pub fn with_third_order_terms(mut self, enabled: bool) -> Self {
        self.third_order_terms = enabled;
        self
    }

    /// Set the diffusion coefficient
    pub fn with_mu_coeff(mut self, mu_coeff: Option<f64>) -> Self {
        self.mu_coeff = mu_coeff;
        self
    }

    /// Halo depth implied by the options
    ///
    /// Two cells whenever a stage reaches beyond the nearest neighbour
    /// (divergent flow, FCT, third-order terms), otherwise one.
    pub fn n_halo(&self) -> usize {
        if self.divergent_flow || self.flux_corrected_transport || self.third_order_terms {
            2
        } else {
            1
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`MpdataError::InvalidOptions`] if `n_iters` is zero or above
    /// [`MAX_N_ITERS`], `mu_coeff`
    /// is negative or not finite, or `epsilon` is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if self.n_iters == 0 {
            return Err(MpdataError::InvalidOptions("n_iters must be at least 1".into()));
        }
        if self.n_iters > MAX_N_ITERS {
            return Err(MpdataError::InvalidOptions(format!(
                "n_iters must not exceed {MAX_N_ITERS}, got {}",
                self.n_iters
            )));
        }
        if let Some(mu) = self.mu_coeff {
            if !(mu.is_finite() && mu >= 0.0) {
                return Err(MpdataError::InvalidOptions(format!(
                    "mu_coeff must be finite and non-negative, got {mu}"
                )));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(MpdataError::InvalidOptions(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }

    /// Largest magnitude of the diffusive pseudo-velocity (`2 mu`)
    pub(crate) fn diffusive_courant_bound(&self) -> f64 {
        2.0 * self.mu_coeff.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halo_rule() {
        assert_eq!(Options::default().n_halo(), 1);
        assert_eq!(Options::upwind().n_halo(), 1);
        assert_eq!(Options::default().with_fct(true).n_halo(), 2);
        assert_eq!(Options::default().with_divergent_flow(true).n_halo(), 2);
        assert_eq!(Options::default().with_third_order_terms(true).n_halo(), 2);
        // Diffusion alone only needs nearest neighbours
        assert_eq!(Options::default().with_mu_coeff(Some(0.1)).n_halo(), 1);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(Options::default().validate().is_ok());
        assert!(Options::default().with_n_iters(0).validate().is_err());
        assert!(Options::default().with_n_iters(MAX_N_ITERS).validate().is_ok());
        assert!(Options::default().with_n_iters(MAX_N_ITERS + 1).validate().is_err());
        assert!(Options::default().with_mu_coeff(Some(-0.1)).validate().is_err());
        assert!(Options::default().with_mu_coeff(Some(f64::NAN)).validate().is_err());
        let mut options = Options::default();
        options.epsilon = 0.0;
        assert!(matches!(options.validate(), Err(MpdataError::InvalidOptions(_))));
    }

    #[test]
    fn test_diffusive_bound() {
        assert_eq!(Options::default().diffusive_courant_bound(), 0.0);
        assert_eq!(
            Options::default().with_mu_coeff(Some(0.125)).diffusive_courant_bound(),
            0.25
        );
    }
}
