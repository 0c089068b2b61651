//! Cell-centred scalar field with halo

use super::boundary::BoundaryCondition;
use super::grid::{Grid, Layout};
use super::Halo;
use crate::error::{ensure_finite, MpdataError, Result};

/// Cell-centred values on a [`Grid`] surrounded by a halo of fixed depth
///
/// Physical values are stored row-major (axis 0 outermost). The halo is
/// rebuilt from the physical cells by [`Halo::fill_halos`] according to one
/// [`BoundaryCondition`] per axis; refreshing never writes physical cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    grid: Grid,
    halo: usize,
    layout: Layout,
    boundary_conditions: Vec<BoundaryCondition>,
    data: Vec<f64>,
}

impl ScalarField {
    /// Create a field with periodic boundaries on every axis
    ///
    /// # Arguments
    ///
    /// * `grid` - Physical lattice
    /// * `values` - Physical values in row-major order, one per cell
    /// * `halo` - Halo depth (1 or 2 for MPDATA)
    ///
    /// # Errors
    ///
    /// Fails if `values` does not match the grid, contains non-finite numbers,
    /// or the grid is too small for a periodic halo of this depth.
    pub fn new(grid: Grid, values: &[f64], halo: usize) -> Result<Self> {
        let boundary_conditions = vec![BoundaryCondition::Periodic; grid.ndim()];
        Self::with_boundary_conditions(grid, values, halo, &boundary_conditions)
    }

    /// Create a field with explicit per-axis boundary conditions
    ///
    /// # Errors
    ///
    /// Fails on a data/grid mismatch, non-finite data, a boundary condition
    /// count different from the number of axes, or an axis too short for
    /// its policy.
    pub fn with_boundary_conditions(
        grid: Grid,
        values: &[f64],
        halo: usize,
        boundary_conditions: &[BoundaryCondition],
    ) -> Result<Self> {
        if values.len() != grid.n_cells() {
            return Err(MpdataError::shape("scalar field values", grid.n_cells(), values.len()));
        }
        if boundary_conditions.len() != grid.ndim() {
            return Err(MpdataError::shape(
                "scalar field boundary conditions",
                grid.ndim(),
                boundary_conditions.len(),
            ));
        }
        ensure_finite("scalar field", values)?;
        for (axis, bc) in boundary_conditions.iter().enumerate() {
            bc.validate(axis, grid.extent(axis), halo)?;
        }

        let layout = Layout::scalar(&grid, halo);
        let mut data = vec![0.0; layout.len()];
        layout.load_physical(&mut data, values);
        let mut field = Self {
            grid,
            halo,
            layout,
            boundary_conditions: boundary_conditions.to_vec(),
            data,
        };
        field.fill_halos();
        Ok(field)
    }

    /// Field of identical values
    ///
    /// # Errors
    ///
    /// See [`ScalarField::with_boundary_conditions`].
    pub fn uniform(
        grid: Grid,
        value: f64,
        halo: usize,
        boundary_conditions: &[BoundaryCondition],
    ) -> Result<Self> {
        Self::with_boundary_conditions(grid, &vec![value; grid.n_cells()], halo, boundary_conditions)
    }

    /// Grid the field lives on
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Per-axis boundary conditions
    pub fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.boundary_conditions
    }

    /// Physical value at cell `(i, j)`; use `j = 0` on a 1D grid
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the physical domain.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.grid.extent(0) && j < self.grid.extent(1),
            "Coordinates out of bounds"
        );
        self.data[self.layout.idx(i as isize, j as isize)]
    }

    /// Value at a signed position, halo included
    #[inline]
    pub(crate) fn at(&self, i: isize, j: isize) -> f64 {
        self.data[self.layout.idx(i, j)]
    }

    /// Physical values in row-major order
    pub fn to_vec(&self) -> Vec<f64> {
        self.layout.physical_values(&self.data)
    }

    /// Sum over physical cells
    pub fn sum(&self) -> f64 {
        self.to_vec().iter().sum()
    }

    /// Smallest and largest physical value
    pub fn min_max(&self) -> (f64, f64) {
        self.to_vec()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Whole padded buffer, halo included
    pub fn padded(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Exchange buffers with a field of the same layout
    pub(crate) fn swap_data(&mut self, other: &mut Vec<f64>) {
        debug_assert_eq!(other.len(), self.data.len());
        std::mem::swap(&mut self.data, other);
    }

    /// Overwrite all values (halo included) from a field with the same layout
    pub(crate) fn copy_from(&mut self, other: &Self) {
        self.data.copy_from_slice(&other.data);
    }
}

impl Halo for ScalarField {
    fn halo(&self) -> usize {
        self.halo
    }

    fn fill_halos(&mut self) {
        for axis in (0..self.grid.ndim()).rev() {
            self.boundary_conditions[axis].fill_halo(&mut self.data, &self.layout, axis, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length_and_nan() {
        let grid = Grid::new_1d(4).unwrap();
        assert!(matches!(
            ScalarField::new(grid, &[1.0, 2.0], 1),
            Err(MpdataError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            ScalarField::new(grid, &[1.0, f64::NAN, 0.0, 0.0], 1),
            Err(MpdataError::NonFinite { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_boundary_condition_count() {
        let grid = Grid::new_1d(4).unwrap();
        let bcs = [BoundaryCondition::Zero, BoundaryCondition::Zero];
        assert!(ScalarField::with_boundary_conditions(grid, &[0.0; 4], 1, &bcs).is_err());
    }

    #[test]
    fn test_halo_filled_on_construction() {
        let grid = Grid::new_1d(3).unwrap();
        let field = ScalarField::new(grid, &[1.0, 2.0, 3.0], 1).unwrap();
        assert_eq!(field.padded(), &[3.0, 1.0, 2.0, 3.0, 1.0]);
        assert_eq!(field.halo(), 1);
        assert_eq!(field.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(field.sum(), 6.0);
        assert_eq!(field.min_max(), (1.0, 3.0));
    }

    #[test]
    fn test_2d_corners_follow_both_axes() {
        let grid = Grid::new_2d(2, 3).unwrap();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let field = ScalarField::new(grid, &values, 1).unwrap();
        // Periodic on both axes: corner (-1, -1) wraps to (1, 2)
        assert_eq!(field.at(-1, -1), 6.0);
        assert_eq!(field.at(2, 3), 1.0);
        assert_eq!(field.at(-1, 1), 5.0);
        assert_eq!(field.at(0, 3), 1.0);
        assert_eq!(field.get(1, 2), 6.0);
    }

    #[test]
    fn test_mixed_boundary_conditions() {
        let grid = Grid::new_2d(3, 2).unwrap();
        let values = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        let bcs = [BoundaryCondition::Extrapolated, BoundaryCondition::Zero];
        let field = ScalarField::with_boundary_conditions(grid, &values, 2, &bcs).unwrap();
        assert_eq!(field.at(-2, 0), -1.0);
        assert_eq!(field.at(4, 1), 5.0);
        assert_eq!(field.at(1, -1), 0.0);
        assert_eq!(field.at(1, 3), 0.0);
        // Corner: zero along axis 1, then extrapolated along axis 0 from zeros
        assert_eq!(field.at(-1, -1), 0.0);
    }

    #[test]
    fn test_refresh_is_idempotent_in_2d() {
        let grid = Grid::new_2d(4, 3).unwrap();
        let values: Vec<f64> = (0..12).map(|v| f64::from(v) * 0.7 - 2.0).collect();
        for bcs in [
            [BoundaryCondition::Periodic, BoundaryCondition::Extrapolated],
            [BoundaryCondition::Zero, BoundaryCondition::Periodic],
            [BoundaryCondition::Extrapolated, BoundaryCondition::Extrapolated],
        ] {
            let mut field = ScalarField::with_boundary_conditions(grid, &values, 2, &bcs).unwrap();
            let before = field.padded().to_vec();
            field.fill_halos();
            assert_eq!(before, field.padded());
            assert_eq!(field.to_vec(), values);
        }
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_get_bounds_check() {
        let grid = Grid::new_1d(3).unwrap();
        let field = ScalarField::new(grid, &[0.0; 3], 1).unwrap();
        let _ = field.get(3, 0);
    }
}
