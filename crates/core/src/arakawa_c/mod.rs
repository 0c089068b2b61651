//! Arakawa-C staggered grid primitives
//!
//! Scalars live at cell centres ([`ScalarField`]), vector components on the
//! cell faces normal to their axis ([`VectorField`]). Both carry a halo that is
//! rebuilt from the physical values by a per-axis [`BoundaryCondition`].

mod boundary;
pub mod discretisation;
mod grid;
mod scalar_field;
mod vector_field;

pub use boundary::BoundaryCondition;
pub use grid::{Grid, MAX_DIMS};
pub use scalar_field::ScalarField;
pub use vector_field::VectorField;

pub(crate) use grid::{shift, Layout};

/// Fields whose halo is refreshed from their physical values
pub trait Halo {
    /// Halo depth on every active axis
    fn halo(&self) -> usize;

    /// Rebuild every halo cell from the physical values
    ///
    /// Axes are processed from last to first so that corner cells are
    /// consistent with both policies. Repeated calls without intervening
    /// mutation leave the buffer unchanged.
    fn fill_halos(&mut self);
}
