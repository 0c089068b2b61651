//! Single-advectee MPDATA stepper
//!
//! [`Mpdata`] owns the advectee and its ping-pong buffers, shares the
//! advector and optional g-factor through [`Arc`], and replays the stage plan
//! of its [`Step`] on every call to [`TimeStepper::step`].

use super::formulae::{self, LimiterBuffers};
use super::options::Options;
use super::r#trait::TimeStepper;
use super::step::{Stage, Step};
use crate::arakawa_c::{Grid, Halo, ScalarField, VectorField};
use crate::error::{MpdataError, Result};
use std::sync::Arc;
use tracing::{info, trace};

/// Scratch buffers reused across timesteps
#[derive(Debug, Clone)]
struct Workspace {
    // Back buffer for the donor-cell pass (swapped with the advectee)
    psi_back: Vec<f64>,
    // Advectee at the start of the timestep, only kept for FCT
    psi_initial: Option<ScalarField>,
    // Velocity used by the next donor-cell pass
    gc_work: VectorField,
    // Antidiffusive velocity being assembled
    gc_next: VectorField,
    limiter: Option<LimiterBuffers>,
}

impl Workspace {
    fn new(step: &Step, advectee: &ScalarField, advector: &VectorField) -> Self {
        let fct = step.options().flux_corrected_transport;
        let len = advectee.padded().len();
        Self {
            psi_back: vec![0.0; len],
            psi_initial: fct.then(|| advectee.clone()),
            gc_work: advector.clone(),
            gc_next: advector.zeros_like(),
            limiter: fct.then(|| LimiterBuffers::new(len)),
        }
    }
}

fn check_grid(what: &str, step: &Step, grid: &Grid) -> Result<()> {
    if grid != step.grid() {
        return Err(MpdataError::shape(
            format!("{what} grid"),
            step.grid().shape(),
            grid.shape(),
        ));
    }
    Ok(())
}

fn check_halo(what: &str, step: &Step, halo: usize) -> Result<()> {
    if halo != step.halo() {
        return Err(MpdataError::HaloMismatch {
            what: what.into(),
            expected: step.halo(),
            actual: halo,
        });
    }
    Ok(())
}

fn check_advector(step: &Step, advector: &VectorField) -> Result<()> {
    check_grid("advector", step, advector.grid())?;
    check_halo("advector", step, advector.halo())?;
    advector.check_courant(step.options().diffusive_courant_bound())
}

fn check_g_factor(step: &Step, g_factor: Option<&ScalarField>) -> Result<()> {
    match (step.non_unit_g_factor(), g_factor) {
        (true, None) => Err(MpdataError::GFactorMismatch(
            "step expects a g-factor field but none was given".into(),
        )),
        (false, Some(_)) => Err(MpdataError::GFactorMismatch(
            "g-factor field given to a step built with a unit g-factor".into(),
        )),
        (true, Some(g)) => {
            check_grid("g-factor", step, g.grid())?;
            check_halo("g-factor", step, g.halo())?;
            match g.to_vec().into_iter().enumerate().find(|&(_, v)| v <= 0.0) {
                Some((index, v)) => Err(MpdataError::GFactorMismatch(format!(
                    "g-factor must be positive, got {v} at cell {index}"
                ))),
                None => Ok(()),
            }
        }
        (false, None) => Ok(()),
    }
}

/// MPDATA stepper for one advectee
#[derive(Debug, Clone)]
pub struct Mpdata {
    step: Step,
    advectee: ScalarField,
    advector: Arc<VectorField>,
    g_factor: Option<Arc<ScalarField>>,
    workspace: Workspace,
    step_count: u64,
}

impl Mpdata {
    /// Create a stepper with a unit g-factor
    ///
    /// # Arguments
    ///
    /// * `step` - Stage plan built for the advectee's grid
    /// * `advectee` - Initial scalar field
    /// * `advector` - Generalised Courant numbers on the faces
    ///
    /// # Errors
    ///
    /// See [`Mpdata::from_shared`].
    pub fn new(step: Step, advectee: ScalarField, advector: VectorField) -> Result<Self> {
        Self::from_shared(step, advectee, Arc::new(advector), None)
    }

    /// Create a stepper whose density/metric factor is `g_factor`
    ///
    /// # Errors
    ///
    /// See [`Mpdata::from_shared`].
    pub fn with_g_factor(
        step: Step,
        advectee: ScalarField,
        advector: VectorField,
        g_factor: ScalarField,
    ) -> Result<Self> {
        Self::from_shared(step, advectee, Arc::new(advector), Some(Arc::new(g_factor)))
    }

    /// Create a stepper from an advector (and g-factor) that may be shared
    /// with other steppers
    ///
    /// # Errors
    ///
    /// - [`MpdataError::ShapeMismatch`] if any field lives on another grid
    /// - [`MpdataError::HaloMismatch`] if any field's halo differs from the step's
    /// - [`MpdataError::GFactorMismatch`] if the g-factor's presence disagrees
    ///   with the step, or g is not strictly positive
    /// - [`MpdataError::CflViolation`] if `max |GC| + 2 mu >= 1`
    pub fn from_shared(
        step: Step,
        advectee: ScalarField,
        advector: Arc<VectorField>,
        g_factor: Option<Arc<ScalarField>>,
    ) -> Result<Self> {
        check_grid("advectee", &step, advectee.grid())?;
        check_halo("advectee", &step, advectee.halo())?;
        check_advector(&step, &advector)?;
        check_g_factor(&step, g_factor.as_deref())?;

        let workspace = Workspace::new(&step, &advectee, &advector);
        info!(
            shape = ?step.grid().shape(),
            halo = step.halo(),
            n_iters = step.options().n_iters,
            fct = step.options().flux_corrected_transport,
            g_factor = g_factor.is_some(),
            max_courant = advector.max_abs().0,
            "Created MPDATA stepper"
        );

        Ok(Self {
            step,
            advectee,
            advector,
            g_factor,
            workspace,
            step_count: 0,
        })
    }

    /// Current advectee
    pub fn advectee(&self) -> &ScalarField {
        &self.advectee
    }

    /// Advector in use
    pub fn advector(&self) -> &VectorField {
        &self.advector
    }

    /// G-factor field, if the step was built with one
    pub fn g_factor(&self) -> Option<&ScalarField> {
        self.g_factor.as_deref()
    }

    /// Stage plan
    pub fn plan(&self) -> &Step {
        &self.step
    }

    /// Options the plan was built from
    pub fn options(&self) -> &Options {
        self.step.options()
    }

    /// Swap in a new advector between timesteps
    ///
    /// # Errors
    ///
    /// Fails with the same grid, halo and CFL checks as construction; the
    /// current advector is kept on error.
    pub fn replace_advector(&mut self, advector: VectorField) -> Result<()> {
        self.check_advector(&advector)?;
        self.install_advector(Arc::new(advector));
        Ok(())
    }

    pub(crate) fn check_advector(&self, advector: &VectorField) -> Result<()> {
        check_advector(&self.step, advector)
    }

    /// Install an already validated advector
    pub(crate) fn install_advector(&mut self, advector: Arc<VectorField>) {
        self.workspace = Workspace::new(&self.step, &self.advectee, &advector);
        self.advector = advector;
    }

    pub(crate) fn shares_advector(&self, advector: &Arc<VectorField>) -> bool {
        Arc::ptr_eq(&self.advector, advector)
    }
}

impl TimeStepper for Mpdata {
    fn step(&mut self) {
        let Self {
            step,
            advectee,
            advector,
            g_factor,
            workspace,
            step_count,
        } = self;
        let epsilon = step.options().epsilon;
        let g = g_factor.as_deref();

        advectee.fill_halos();
        workspace.gc_work.copy_from(advector);
        if let Some(psi_initial) = workspace.psi_initial.as_mut() {
            psi_initial.copy_from(advectee);
        }

        for stage in step.stages() {
            match *stage {
                Stage::Diffusion { mu_coeff } => {
                    formulae::add_diffusive_velocity(advectee, mu_coeff, epsilon, &mut workspace.gc_work);
                    workspace.gc_work.fill_halos();
                }
                Stage::Upwind => {
                    formulae::upwind(advectee, &workspace.gc_work, g, &mut workspace.psi_back);
                    advectee.swap_data(&mut workspace.psi_back);
                    advectee.fill_halos();
                }
                Stage::Antidiffusion(terms) => {
                    formulae::antidiffusive_velocity(
                        advectee,
                        &workspace.gc_work,
                        g,
                        terms,
                        epsilon,
                        &mut workspace.gc_next,
                    );
                    workspace.gc_next.fill_halos();
                    std::mem::swap(&mut workspace.gc_work, &mut workspace.gc_next);
                }
                Stage::FluxLimiter => {
                    if let (Some(psi_initial), Some(buffers)) =
                        (workspace.psi_initial.as_ref(), workspace.limiter.as_mut())
                    {
                        formulae::limiter_coefficients(
                            advectee,
                            psi_initial,
                            &workspace.gc_work,
                            g,
                            epsilon,
                            buffers,
                        );
                        formulae::limit_fluxes(&mut workspace.gc_work, advectee.layout(), buffers);
                        workspace.gc_work.fill_halos();
                    }
                }
            }
        }

        *step_count += 1;
        trace!(step = *step_count, "MPDATA step complete");
    }

    fn step_count(&self) -> u64 {
        self.step_count
    }
}
