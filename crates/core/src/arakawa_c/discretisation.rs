//! Helpers turning continuous setups into discrete fields

use super::grid::Grid;
use super::vector_field::VectorField;
use crate::error::{MpdataError, Result};

/// Sub-intervals per bin used by [`discretised_analytical_solution`]
pub const QUADRATURE_INTERVALS: usize = 64;

/// `n` evenly spaced points from `start` to `stop` inclusive, plus the spacing
pub fn linspace(start: f64, stop: f64, n: usize) -> (Vec<f64>, f64) {
    if n < 2 {
        return (vec![start; n], 0.0);
    }
    let step = (stop - start) / (n - 1) as f64;
    let points = (0..n)
        .map(|k| if k == n - 1 { stop } else { start + k as f64 * step })
        .collect();
    (points, step)
}

/// Bin averages of `pdf` over consecutive intervals `[rh[i], rh[i + 1]]`
///
/// Integrates with composite Simpson quadrature using
/// [`QUADRATURE_INTERVALS`] sub-intervals per bin.
pub fn discretised_analytical_solution(rh: &[f64], pdf: impl Fn(f64) -> f64) -> Vec<f64> {
    rh.windows(2)
        .map(|bin| {
            let (a, b) = (bin[0], bin[1]);
            let h = (b - a) / QUADRATURE_INTERVALS as f64;
            let mut acc = pdf(a) + pdf(b);
            for k in 1..QUADRATURE_INTERVALS {
                let weight = if k % 2 == 1 { 4.0 } else { 2.0 };
                acc += weight * pdf(a + k as f64 * h);
            }
            acc * h / 3.0 / (b - a)
        })
        .collect()
}

/// Generalised Courant numbers of a 2D flow given by a stream function
///
/// Velocities are differences of `stream_function(x, z)` between the two
/// cell corners bounding each face, which makes the discrete divergence
/// vanish identically:
///
/// ```text
/// GC_x(i, j) = -(psi(x_i, z_j + dz/2) - psi(x_i, z_j - dz/2)) / dz * dt / dx
/// GC_z(i, j) =  (psi(x_i + dx/2, z_j) - psi(x_i - dx/2, z_j)) / dx * dt / dz
/// ```
///
/// with `x_i = i dx` on x-faces and `x_i = (i + 1/2) dx` at centres (likewise
/// for `z`).
///
/// # Arguments
///
/// * `grid` - 2D grid (axis 0 is `x`, axis 1 is `z`)
/// * `size` - Physical domain extent `[X, Z]`
/// * `dt` - Timestep
/// * `stream_function` - `psi(x, z)`
/// * `halo` - Halo depth of the resulting field
///
/// # Errors
///
/// Fails for a non-2D grid, non-positive geometry, or non-finite velocities.
pub fn nondivergent_vector_field_2d(
    grid: Grid,
    size: [f64; 2],
    dt: f64,
    stream_function: impl Fn(f64, f64) -> f64,
    halo: usize,
) -> Result<VectorField> {
    if grid.ndim() != 2 {
        return Err(MpdataError::InvalidGrid(format!(
            "stream function flow needs a 2D grid, got {} dimension(s)",
            grid.ndim()
        )));
    }
    if !(size.iter().all(|&s| s > 0.0 && s.is_finite()) && dt > 0.0 && dt.is_finite()) {
        return Err(MpdataError::InvalidGeometry(format!(
            "domain size {size:?} and timestep {dt} must be positive"
        )));
    }
    let (nx, nz) = (grid.extent(0), grid.extent(1));
    let dx = size[0] / nx as f64;
    let dz = size[1] / nz as f64;

    let mut gc_x = Vec::with_capacity((nx + 1) * nz);
    for i in 0..=nx {
        let x = i as f64 * dx;
        for j in 0..nz {
            let z = (j as f64 + 0.5) * dz;
            let velocity = -(stream_function(x, z + dz / 2.0) - stream_function(x, z - dz / 2.0)) / dz;
            gc_x.push(velocity * dt / dx);
        }
    }

    let mut gc_z = Vec::with_capacity(nx * (nz + 1));
    for i in 0..nx {
        let x = (i as f64 + 0.5) * dx;
        for j in 0..=nz {
            let z = j as f64 * dz;
            let velocity = (stream_function(x + dx / 2.0, z) - stream_function(x - dx / 2.0, z)) / dx;
            gc_z.push(velocity * dt / dz);
        }
    }

    VectorField::new(grid, &[gc_x, gc_z], halo)
}

/// Discrete divergence of a staggered field, one value per cell (row-major)
pub fn divergence(field: &VectorField) -> Vec<f64> {
    let grid = field.grid();
    let mut out = Vec::with_capacity(grid.n_cells());
    for i in 0..grid.extent(0) as isize {
        for j in 0..grid.extent(1) as isize {
            let mut div = 0.0;
            for axis in 0..grid.ndim() {
                let (ri, rj) = super::grid::shift(i, j, axis, 1);
                let component = field.comp(axis);
                div += component.at(ri, rj) - component.at(i, j);
            }
            out.push(div);
        }
    }
    out
}
