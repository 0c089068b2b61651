//! Face-centred (staggered) vector field with halo
//!
//! Component `a` lives on the faces normal to axis `a`: it has one more entry
//! than the scalar grid along `a` and matches the scalar grid elsewhere. Face
//! `f` of component `a` separates cells `f - 1` and `f`, so face 0 is the
//! left edge of the domain and face `n` the right edge.

use super::boundary::BoundaryCondition;
use super::grid::{Grid, Layout};
use super::Halo;
use crate::error::{ensure_finite, MpdataError, Result};

/// One staggered array
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Component {
    layout: Layout,
    data: Vec<f64>,
}

impl Component {
    #[inline]
    pub(crate) fn at(&self, i: isize, j: isize) -> f64 {
        self.data[self.layout.idx(i, j)]
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Physical face values in row-major order
    pub(crate) fn values(&self) -> Vec<f64> {
        self.layout.physical_values(&self.data)
    }
}

/// Staggered vector field (velocity or generalised Courant number "GC")
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    grid: Grid,
    halo: usize,
    boundary_conditions: Vec<BoundaryCondition>,
    components: Vec<Component>,
}

impl VectorField {
    /// Create a field with periodic boundaries on every axis
    ///
    /// # Arguments
    ///
    /// * `grid` - Scalar grid the components are staggered against
    /// * `components` - One row-major array per axis; component `a` has shape
    ///   [`Grid::staggered_shape`]`(a)`
    /// * `halo` - Halo depth
    ///
    /// # Errors
    ///
    /// Fails on a component count/shape mismatch, non-finite data, or an axis
    /// too short for a periodic halo of this depth.
    pub fn new(grid: Grid, components: &[Vec<f64>], halo: usize) -> Result<Self> {
        let boundary_conditions = vec![BoundaryCondition::Periodic; grid.ndim()];
        Self::with_boundary_conditions(grid, components, halo, &boundary_conditions)
    }

    /// Create a field with explicit per-axis boundary conditions
    ///
    /// The policy for axis `b` is applied to the halo along `b` of every
    /// component.
    ///
    /// # Errors
    ///
    /// See [`VectorField::new`]; additionally fails if the boundary condition
    /// count differs from the number of axes.
    pub fn with_boundary_conditions(
        grid: Grid,
        components: &[Vec<f64>],
        halo: usize,
        boundary_conditions: &[BoundaryCondition],
    ) -> Result<Self> {
        if components.len() != grid.ndim() {
            return Err(MpdataError::shape("vector field components", grid.ndim(), components.len()));
        }
        if boundary_conditions.len() != grid.ndim() {
            return Err(MpdataError::shape(
                "vector field boundary conditions",
                grid.ndim(),
                boundary_conditions.len(),
            ));
        }
        for (axis, bc) in boundary_conditions.iter().enumerate() {
            bc.validate(axis, grid.extent(axis), halo)?;
        }

        let mut staggered = Vec::with_capacity(grid.ndim());
        for (axis, values) in components.iter().enumerate() {
            let layout = Layout::staggered(&grid, halo, axis);
            let expected: usize = grid.staggered_shape(axis).iter().product();
            if values.len() != expected {
                return Err(MpdataError::shape(
                    format!("vector field component {axis}"),
                    grid.staggered_shape(axis),
                    values.len(),
                ));
            }
            ensure_finite(&format!("vector field component {axis}"), values)?;
            let mut data = vec![0.0; layout.len()];
            layout.load_physical(&mut data, values);
            staggered.push(Component { layout, data });
        }

        let mut field = Self {
            grid,
            halo,
            boundary_conditions: boundary_conditions.to_vec(),
            components: staggered,
        };
        field.fill_halos();
        Ok(field)
    }

    /// Same value on every face of each component (`values[a]` for component `a`)
    ///
    /// # Errors
    ///
    /// See [`VectorField::with_boundary_conditions`].
    pub fn uniform(
        grid: Grid,
        values: &[f64],
        halo: usize,
        boundary_conditions: &[BoundaryCondition],
    ) -> Result<Self> {
        if values.len() != grid.ndim() {
            return Err(MpdataError::shape("vector field components", grid.ndim(), values.len()));
        }
        let components: Vec<Vec<f64>> = values
            .iter()
            .enumerate()
            .map(|(axis, &v)| vec![v; grid.staggered_shape(axis).iter().product()])
            .collect();
        Self::with_boundary_conditions(grid, &components, halo, boundary_conditions)
    }

    /// Zero-valued field sharing grid, halo and boundary conditions with `self`
    pub(crate) fn zeros_like(&self) -> Self {
        let mut field = self.clone();
        for component in &mut field.components {
            component.data.fill(0.0);
        }
        field
    }

    /// Scalar grid the field is staggered against
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Per-axis boundary conditions
    pub fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.boundary_conditions
    }

    /// Physical face values of component `axis` in row-major order
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not an active axis of the grid.
    pub fn component(&self, axis: usize) -> Vec<f64> {
        self.components[axis].values()
    }

    /// Whole padded buffer of component `axis`, halo included
    pub fn padded(&self, axis: usize) -> &[f64] {
        &self.components[axis].data
    }

    /// Largest `|GC|` over all physical faces, with its axis and face index
    pub fn max_abs(&self) -> (f64, usize, usize) {
        let mut best = (0.0, 0, 0);
        for (axis, component) in self.components.iter().enumerate() {
            for (face, v) in component.values().into_iter().enumerate() {
                if v.abs() > best.0 {
                    best = (v.abs(), axis, face);
                }
            }
        }
        best
    }

    /// Fail with [`MpdataError::CflViolation`] unless every `|GC| + reserve < 1`
    pub(crate) fn check_courant(&self, reserve: f64) -> Result<()> {
        let (value, axis, face) = self.max_abs();
        let limit = 1.0 - reserve;
        if value >= limit {
            return Err(MpdataError::CflViolation {
                value,
                limit,
                axis,
                face,
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn comp(&self, axis: usize) -> &Component {
        &self.components[axis]
    }

    pub(crate) fn comp_mut(&mut self, axis: usize) -> &mut Component {
        &mut self.components[axis]
    }

    /// Overwrite all values (halo included) from a field with the same layout
    pub(crate) fn copy_from(&mut self, other: &Self) {
        for (dst, src) in self.components.iter_mut().zip(&other.components) {
            dst.data.copy_from_slice(&src.data);
        }
    }
}

impl Halo for VectorField {
    fn halo(&self) -> usize {
        self.halo
    }

    fn fill_halos(&mut self) {
        for (component_axis, component) in self.components.iter_mut().enumerate() {
            for axis in (0..self.grid.ndim()).rev() {
                self.boundary_conditions[axis].fill_halo(
                    &mut component.data,
                    &component.layout,
                    axis,
                    axis == component_axis,
                );
            }
        }
    }
}
