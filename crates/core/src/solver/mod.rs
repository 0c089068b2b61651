//! MPDATA solver
//!
//! The solver is assembled in three layers:
//!
//! 1. [`Options`] select the scheme variant (number of passes, FCT,
//!    divergent-flow and third-order terms, diffusion)
//! 2. [`StepBuilder`] validates the options against a grid and halo depth and
//!    produces an immutable [`Step`] plan
//! 3. [`Mpdata`] (one advectee) or [`EulerianFields`] (several advectees
//!    sharing one advector) own the fields and replay the plan every timestep
//!
//! # Example
//!
//! ```
//! use mpdata_core::{Grid, Mpdata, Options, ScalarField, StepBuilder, TimeStepper, VectorField};
//!
//! let grid = Grid::new_1d(32).unwrap();
//! let options = Options::default();
//! let halo = options.n_halo();
//! let step = StepBuilder::new(options).build(grid, halo).unwrap();
//! let advectee = ScalarField::new(grid, &[1.0; 32], halo).unwrap();
//! let advector = VectorField::new(grid, &[vec![0.5; 33]], halo).unwrap();
//! let mut solver = Mpdata::new(step, advectee, advector).unwrap();
//! solver.advance(10);
//! assert_eq!(solver.step_count(), 10);
//! ```

mod eulerian_fields;
mod formulae;
mod mpdata;
mod options;
mod step;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

pub use eulerian_fields::EulerianFields;
pub use formulae::CorrectionTerms;
pub use mpdata::Mpdata;
pub use options::{Options, DEFAULT_EPSILON, MAX_N_ITERS};
pub use r#trait::TimeStepper;
pub use step::{Stage, Step, StepBuilder};
