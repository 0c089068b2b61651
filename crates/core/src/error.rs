//! Error type shared by every constructor in the crate
//!
//! All validation is eager: grids, fields, options and steppers are checked
//! when they are built, so stepping itself never fails.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, MpdataError>;

/// Configuration errors detected while assembling a solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MpdataError {
    /// Grid shape is empty, has a zero-sized axis or too many dimensions
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Data length, component count or grid shape disagree
    #[error("shape mismatch: {what} (expected {expected}, got {actual})")]
    ShapeMismatch {
        /// Which quantity was being compared
        what: String,
        /// Expected extent
        expected: String,
        /// Extent actually supplied
        actual: String,
    },

    /// Halo depth does not match the one implied by the options
    #[error("halo mismatch for {what}: expected {expected}, got {actual}")]
    HaloMismatch {
        /// Which field or stage carried the wrong halo
        what: String,
        /// Halo depth required
        expected: usize,
        /// Halo depth supplied
        actual: usize,
    },

    /// Options are out of range
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Boundary condition cannot be applied on an axis of this size
    #[error("boundary condition {policy} on axis {axis} needs at least {required} cells, got {actual}")]
    BoundaryCondition {
        /// Policy name
        policy: &'static str,
        /// Axis index
        axis: usize,
        /// Minimum number of physical cells
        required: usize,
        /// Cells available
        actual: usize,
    },

    /// Generalised Courant number reaches or exceeds one
    #[error("CFL condition violated: |GC| = {value} >= {limit} on axis {axis} at face {face}")]
    CflViolation {
        /// Offending magnitude
        value: f64,
        /// Admissible upper bound (exclusive)
        limit: f64,
        /// Component axis
        axis: usize,
        /// Row-major index of the face within the component
        face: usize,
    },

    /// G-factor flag and g-factor field disagree, or g is not positive
    #[error("g-factor mismatch: {0}")]
    GFactorMismatch(String),

    /// Initial data contains NaN or infinity
    #[error("non-finite value in {what} at index {index}")]
    NonFinite {
        /// Which input carried the value
        what: String,
        /// Row-major index of the value
        index: usize,
    },

    /// Two fields of a coupled group share a name
    #[error("duplicate field name '{0}'")]
    DuplicateField(String),

    /// Physical geometry (domain size, timestep, radius bounds) is invalid
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl MpdataError {
    /// Shorthand for [`MpdataError::ShapeMismatch`]
    pub(crate) fn shape(
        what: impl Into<String>,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }
}

/// Reject NaN/infinite values in user supplied data
pub(crate) fn ensure_finite(what: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(MpdataError::NonFinite {
            what: what.to_string(),
            index,
        }),
        None => Ok(()),
    }
}
