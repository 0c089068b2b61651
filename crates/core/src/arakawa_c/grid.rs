//! Grid geometry and padded storage layout
//!
//! A [`Grid`] describes the physical lattice (1D or 2D, row-major with axis 0
//! outermost). A [`Layout`] maps signed cell/face coordinates, including halo
//! positions, onto a flat padded buffer.

use crate::error::{MpdataError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Highest supported dimensionality
pub const MAX_DIMS: usize = 2;

/// Shape of the physical lattice shared by every field of a solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    shape: [usize; MAX_DIMS],
    ndim: usize,
}

impl Grid {
    /// One-dimensional grid of `n` cells
    ///
    /// # Errors
    ///
    /// Returns [`MpdataError::InvalidGrid`] if `n` is zero.
    pub fn new_1d(n: usize) -> Result<Self> {
        Self::from_shape(&[n])
    }

    /// Two-dimensional grid of `n0 x n1` cells
    ///
    /// # Errors
    ///
    /// Returns [`MpdataError::InvalidGrid`] if either extent is zero.
    pub fn new_2d(n0: usize, n1: usize) -> Result<Self> {
        Self::from_shape(&[n0, n1])
    }

    /// Build a grid from a shape slice of length 1 or 2
    ///
    /// # Errors
    ///
    /// Returns [`MpdataError::InvalidGrid`] for empty, zero-sized or
    /// higher-dimensional shapes.
    pub fn from_shape(shape: &[usize]) -> Result<Self> {
        if shape.is_empty() || shape.len() > MAX_DIMS {
            return Err(MpdataError::InvalidGrid(format!(
                "expected 1 to {MAX_DIMS} dimensions, got {}",
                shape.len()
            )));
        }
        if let Some(axis) = shape.iter().position(|&n| n == 0) {
            return Err(MpdataError::InvalidGrid(format!(
                "axis {axis} has zero cells"
            )));
        }
        let mut padded_shape = [1; MAX_DIMS];
        padded_shape[..shape.len()].copy_from_slice(shape);
        Ok(Self {
            shape: padded_shape,
            ndim: shape.len(),
        })
    }

    /// Number of active axes
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Cells per active axis
    pub fn shape(&self) -> &[usize] {
        &self.shape[..self.ndim]
    }

    /// Cells along `axis` (1 for an inactive axis)
    pub fn extent(&self, axis: usize) -> usize {
        self.shape[axis]
    }

    /// Total number of physical cells
    pub fn n_cells(&self) -> usize {
        self.shape.iter().product()
    }

    /// Physical extent of the vector component living on faces normal to `axis`
    pub fn staggered_shape(&self, axis: usize) -> Vec<usize> {
        let mut shape = self.shape().to_vec();
        shape[axis] += 1;
        shape
    }
}

/// Step `d` positions along `axis` from `(i, j)`
#[inline]
pub(crate) fn shift(i: isize, j: isize, axis: usize, d: isize) -> (isize, isize) {
    if axis == 0 {
        (i + d, j)
    } else {
        (i, j + d)
    }
}

/// Padded row-major storage layout for one array (scalar or one vector component)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    ext: [usize; MAX_DIMS],
    halo: [usize; MAX_DIMS],
    padded: [usize; MAX_DIMS],
}

impl Layout {
    fn new(ext: [usize; MAX_DIMS], ndim: usize, halo: usize) -> Self {
        let mut h = [0; MAX_DIMS];
        for axis_halo in h.iter_mut().take(ndim) {
            *axis_halo = halo;
        }
        Self {
            ext,
            halo: h,
            padded: [ext[0] + 2 * h[0], ext[1] + 2 * h[1]],
        }
    }

    /// Layout of a cell-centred array
    pub(crate) fn scalar(grid: &Grid, halo: usize) -> Self {
        Self::new(grid.shape, grid.ndim, halo)
    }

    /// Layout of the face-centred component normal to `axis`
    pub(crate) fn staggered(grid: &Grid, halo: usize, axis: usize) -> Self {
        let mut ext = grid.shape;
        ext[axis] += 1;
        Self::new(ext, grid.ndim, halo)
    }

    /// Flat index of a (possibly halo) position
    #[inline]
    pub(crate) fn idx(&self, i: isize, j: isize) -> usize {
        debug_assert!(
            i >= -(self.halo[0] as isize)
                && i < (self.ext[0] + self.halo[0]) as isize
                && j >= -(self.halo[1] as isize)
                && j < (self.ext[1] + self.halo[1]) as isize,
            "index ({i}, {j}) outside padded layout {self:?}"
        );
        (i + self.halo[0] as isize) as usize * self.padded[1] + (j + self.halo[1] as isize) as usize
    }

    /// Length of the padded buffer
    pub(crate) fn len(&self) -> usize {
        self.padded[0] * self.padded[1]
    }

    /// Physical extent along `axis`
    pub(crate) fn ext(&self, axis: usize) -> usize {
        self.ext[axis]
    }

    /// Halo depth along `axis` (0 on an inactive axis)
    pub(crate) fn halo(&self, axis: usize) -> usize {
        self.halo[axis]
    }

    /// Signed range of positions along `axis`, widened by `margin` on active axes
    pub(crate) fn range(&self, axis: usize, margin: usize) -> std::ops::Range<isize> {
        let m = margin.min(self.halo[axis]) as isize;
        -m..self.ext[axis] as isize + m
    }

    /// Evaluate `f` over the physical region widened by `margin` and store the
    /// results in `out`; rows along axis 0 are processed in parallel
    pub(crate) fn fill_region<F>(&self, out: &mut [f64], margin: usize, f: F)
    where
        F: Fn(isize, isize) -> f64 + Sync,
    {
        debug_assert_eq!(out.len(), self.len());
        let rows = self.range(0, margin);
        let cols = self.range(1, margin);
        let h0 = self.halo[0] as isize;
        let h1 = self.halo[1] as isize;
        out.par_chunks_mut(self.padded[1])
            .enumerate()
            .for_each(|(row, chunk)| {
                let i = row as isize - h0;
                if !rows.contains(&i) {
                    return;
                }
                for j in cols.clone() {
                    chunk[(j + h1) as usize] = f(i, j);
                }
            });
    }

    /// Replace each physical value `v` at `(i, j)` by `f(i, j, v)`, rows in parallel
    pub(crate) fn update_region<F>(&self, data: &mut [f64], f: F)
    where
        F: Fn(isize, isize, f64) -> f64 + Sync,
    {
        debug_assert_eq!(data.len(), self.len());
        let rows = self.range(0, 0);
        let cols = self.range(1, 0);
        let h0 = self.halo[0] as isize;
        let h1 = self.halo[1] as isize;
        data.par_chunks_mut(self.padded[1])
            .enumerate()
            .for_each(|(row, chunk)| {
                let i = row as isize - h0;
                if !rows.contains(&i) {
                    return;
                }
                for j in cols.clone() {
                    let k = (j + h1) as usize;
                    chunk[k] = f(i, j, chunk[k]);
                }
            });
    }

    /// Copy of the physical values in row-major order
    pub(crate) fn physical_values(&self, data: &[f64]) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.ext[0] * self.ext[1]);
        for i in 0..self.ext[0] as isize {
            let start = self.idx(i, 0);
            values.extend_from_slice(&data[start..start + self.ext[1]]);
        }
        values
    }

    /// Write row-major physical values into the padded buffer
    pub(crate) fn load_physical(&self, data: &mut [f64], values: &[f64]) {
        for (i, row) in values.chunks(self.ext[1]).enumerate() {
            let start = self.idx(i as isize, 0);
            data[start..start + self.ext[1]].copy_from_slice(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rejects_bad_shapes() {
        assert!(Grid::from_shape(&[]).is_err());
        assert!(Grid::from_shape(&[4, 4, 4]).is_err());
        assert!(matches!(
            Grid::new_2d(3, 0),
            Err(MpdataError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_grid_shape_queries() {
        let grid = Grid::new_2d(3, 5).unwrap();
        assert_eq!(grid.ndim(), 2);
        assert_eq!(grid.shape(), &[3, 5]);
        assert_eq!(grid.n_cells(), 15);
        assert_eq!(grid.staggered_shape(0), vec![4, 5]);
        assert_eq!(grid.staggered_shape(1), vec![3, 6]);

        let line = Grid::new_1d(7).unwrap();
        assert_eq!(line.shape(), &[7]);
        assert_eq!(line.extent(1), 1);
    }

    #[test]
    fn test_layout_indexing_1d_has_no_transverse_halo() {
        let grid = Grid::new_1d(4).unwrap();
        let layout = Layout::scalar(&grid, 2);
        assert_eq!(layout.len(), 8);
        assert_eq!(layout.idx(-2, 0), 0);
        assert_eq!(layout.idx(0, 0), 2);
        assert_eq!(layout.idx(5, 0), 7);
        assert_eq!(layout.range(1, 1), 0..1);
    }

    #[test]
    fn test_layout_staggered_extent() {
        let grid = Grid::new_2d(3, 4).unwrap();
        let layout = Layout::staggered(&grid, 1, 1);
        assert_eq!(layout.ext(0), 3);
        assert_eq!(layout.ext(1), 5);
        assert_eq!(layout.len(), 5 * 7);
        assert_eq!(layout.idx(-1, -1), 0);
    }

    #[test]
    fn test_layout_physical_round_trip() {
        let grid = Grid::new_2d(2, 3).unwrap();
        let layout = Layout::scalar(&grid, 1);
        let mut data = vec![-1.0; layout.len()];
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        layout.load_physical(&mut data, &values);
        assert_eq!(layout.physical_values(&data), values.to_vec());
        assert_eq!(data[layout.idx(-1, -1)], -1.0);
        assert_eq!(data[layout.idx(1, 2)], 6.0);
    }

    #[test]
    fn test_fill_region_with_margin() {
        let grid = Grid::new_1d(3).unwrap();
        let layout = Layout::scalar(&grid, 2);
        let mut out = vec![0.0; layout.len()];
        layout.fill_region(&mut out, 1, |i, _| i as f64 + 10.0);
        assert_eq!(out, vec![0.0, 9.0, 10.0, 11.0, 12.0, 13.0, 0.0]);
    }
}
