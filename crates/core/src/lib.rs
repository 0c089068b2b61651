//! MPDATA advection core library
//!
//! Multidimensional Positive Definite Advection Transport Algorithm on an
//! Arakawa-C staggered grid, after Smolarkiewicz (1984) and follow-ups.
//!
//! A scalar field (the *advectee*) lives at cell centres and is transported by
//! generalised Courant numbers (the *advector*) stored on the cell faces. Each
//! timestep is a first-order donor-cell pass followed by `n_iters - 1`
//! corrective passes driven by antidiffusive pseudo-velocities, optionally
//! limited so that no new extrema appear (flux-corrected transport).
//!
//! ## Layout
//!
//! - [`arakawa_c`]: grids, scalar/vector fields with halos, boundary conditions
//! - [`solver`]: options, stage plans, the [`Mpdata`] stepper and coupled
//!   [`EulerianFields`]
//! - [`coordinates`]: radius transforms for spectral grids
//! - [`factory`]: ready-made steppers for standard setups
//!
//! Constructors validate everything eagerly and return [`MpdataError`];
//! stepping itself cannot fail.

pub mod arakawa_c;
pub mod coordinates;
pub mod error;
pub mod factory;
pub mod solver;

pub use arakawa_c::{BoundaryCondition, Grid, Halo, ScalarField, VectorField};
pub use coordinates::{CoordinateTransform, Linear, Logarithmic, Power};
pub use error::{MpdataError, Result};
pub use factory::CondensationalGrowth;
pub use solver::{
    CorrectionTerms, EulerianFields, Mpdata, Options, Stage, Step, StepBuilder, TimeStepper,
};
