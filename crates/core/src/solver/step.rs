//! Stage plan for one MPDATA timestep
//!
//! A [`Step`] is the immutable recipe shared by every stepper built from it:
//! the grid, the halo depth and the ordered list of [`Stage`]s executed by
//! each call to `step()`.

use super::formulae::CorrectionTerms;
use super::options::Options;
use crate::arakawa_c::Grid;
use crate::error::{MpdataError, Result};
use tracing::debug;

/// One stage of a timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// Fold the diffusive pseudo-velocity into the working advector
    Diffusion {
        /// Dimensionless diffusion coefficient
        mu_coeff: f64,
    },
    /// Donor-cell pass with the working advector
    Upwind,
    /// Replace the working advector by its antidiffusive velocity
    Antidiffusion(CorrectionTerms),
    /// Limit the working advector so the next pass creates no new extrema
    FluxLimiter,
}

/// Assembles a [`Step`] from [`Options`]
///
/// # Example
///
/// ```
/// use mpdata_core::{Grid, Options, StepBuilder};
///
/// let grid = Grid::new_1d(64).unwrap();
/// let options = Options::default().with_fct(true);
/// let step = StepBuilder::new(options).build(grid, options.n_halo()).unwrap();
/// assert_eq!(step.halo(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StepBuilder {
    options: Options,
    non_unit_g_factor: bool,
}

impl StepBuilder {
    /// Start from the given options with a unit g-factor
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            non_unit_g_factor: false,
        }
    }

    /// Declare whether steppers built from this plan carry a g-factor field
    #[must_use]
    pub fn non_unit_g_factor(mut self, enabled: bool) -> Self {
        self.non_unit_g_factor = enabled;
        self
    }

    /// Validate the options against the grid and produce the stage plan
    ///
    /// # Arguments
    ///
    /// * `grid` - Grid every field of the stepper will live on
    /// * `halo` - Halo depth of those fields; must equal [`Options::n_halo`]
    ///
    /// # Errors
    ///
    /// Returns [`MpdataError::InvalidOptions`] for out-of-range options and
    /// [`MpdataError::HaloMismatch`] when `halo` is not the required depth.
    pub fn build(self, grid: Grid, halo: usize) -> Result<Step> {
        let options = self.options;
        options.validate()?;
        let required = options.n_halo();
        if halo != required {
            return Err(MpdataError::HaloMismatch {
                what: "step".into(),
                expected: required,
                actual: halo,
            });
        }

        let terms = CorrectionTerms {
            divergent_flow: options.divergent_flow,
            third_order_terms: options.third_order_terms,
            non_unit_g_factor: self.non_unit_g_factor,
        };
        let mut stages = Vec::with_capacity(2 * options.n_iters + 1);
        if let Some(mu_coeff) = options.mu_coeff {
            stages.push(Stage::Diffusion { mu_coeff });
        }
        stages.push(Stage::Upwind);
        for _ in 1..options.n_iters {
            stages.push(Stage::Antidiffusion(terms));
            if options.flux_corrected_transport {
                stages.push(Stage::FluxLimiter);
            }
            stages.push(Stage::Upwind);
        }

        debug!(
            ?grid,
            halo,
            n_iters = options.n_iters,
            fct = options.flux_corrected_transport,
            n_stages = stages.len(),
            "Built MPDATA step"
        );

        Ok(Step {
            grid,
            halo,
            options,
            non_unit_g_factor: self.non_unit_g_factor,
            stages,
        })
    }
}

/// Validated stage plan
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    grid: Grid,
    halo: usize,
    options: Options,
    non_unit_g_factor: bool,
    stages: Vec<Stage>,
}

impl Step {
    /// Grid of the fields
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Halo depth of the fields
    pub fn halo(&self) -> usize {
        self.halo
    }

    /// Options the plan was built from
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether a g-factor field is expected
    pub fn non_unit_g_factor(&self) -> bool {
        self.non_unit_g_factor
    }

    /// Stages in execution order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Number of donor-cell passes per timestep
    pub fn n_passes(&self) -> usize {
        self.stages.iter().filter(|s| matches!(s, Stage::Upwind)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upwind_plan_is_single_pass() {
        let grid = Grid::new_1d(8).unwrap();
        let step = StepBuilder::new(Options::upwind()).build(grid, 1).unwrap();
        assert_eq!(step.stages(), &[Stage::Upwind]);
        assert_eq!(step.n_passes(), 1);
    }

    #[test]
    fn test_fct_plan_limits_every_corrective_pass() {
        let grid = Grid::new_2d(8, 8).unwrap();
        let options = Options::default().with_n_iters(3).with_fct(true);
        let step = StepBuilder::new(options).build(grid, 2).unwrap();
        let terms = CorrectionTerms::default();
        assert_eq!(
            step.stages(),
            &[
                Stage::Upwind,
                Stage::Antidiffusion(terms),
                Stage::FluxLimiter,
                Stage::Upwind,
                Stage::Antidiffusion(terms),
                Stage::FluxLimiter,
                Stage::Upwind,
            ]
        );
        assert_eq!(step.n_passes(), 3);
    }

    #[test]
    fn test_diffusion_comes_first_and_flags_propagate() {
        let grid = Grid::new_1d(8).unwrap();
        let options = Options::default()
            .with_mu_coeff(Some(0.05))
            .with_third_order_terms(true);
        let step = StepBuilder::new(options)
            .non_unit_g_factor(true)
            .build(grid, 2)
            .unwrap();
        assert_eq!(step.stages()[0], Stage::Diffusion { mu_coeff: 0.05 });
        assert_eq!(
            step.stages()[2],
            Stage::Antidiffusion(CorrectionTerms {
                divergent_flow: false,
                third_order_terms: true,
                non_unit_g_factor: true,
            })
        );
        assert!(step.non_unit_g_factor());
    }

    #[test]
    fn test_halo_must_match_options() {
        let grid = Grid::new_1d(8).unwrap();
        let err = StepBuilder::new(Options::default().with_fct(true))
            .build(grid, 1)
            .unwrap_err();
        assert_eq!(
            err,
            MpdataError::HaloMismatch {
                what: "step".into(),
                expected: 2,
                actual: 1
            }
        );
        assert!(StepBuilder::new(Options::default()).build(grid, 2).is_err());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let grid = Grid::new_1d(8).unwrap();
        let result = StepBuilder::new(Options::default().with_n_iters(0)).build(grid, 1);
        assert!(matches!(result, Err(MpdataError::InvalidOptions(_))));
        // Pass counts from a deserialised config are bounded before the plan is sized
        let result = StepBuilder::new(Options::default().with_n_iters(usize::MAX)).build(grid, 1);
        assert!(matches!(result, Err(MpdataError::InvalidOptions(_))));
    }
}
