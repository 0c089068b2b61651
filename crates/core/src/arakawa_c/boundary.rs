//! Halo filling policies
//!
//! Each field carries one [`BoundaryCondition`] per axis. Before any stencil
//! is evaluated the halo along that axis is rebuilt from the physical values:
//!
//! - `Periodic`: the domain wraps around; halo cell `-k` mirrors cell `n - k`
//! - `Zero`: halo cells are held at zero
//! - `Extrapolated`: halo cells continue the line through the two outermost
//!   physical values
//!
//! For face-centred (staggered) arrays the first and last faces coincide under
//! periodicity, so the wrap period is one less than the number of faces.

use super::grid::Layout;
use crate::error::{MpdataError, Result};
use serde::{Deserialize, Serialize};

/// Per-axis halo policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// Wrap around the domain
    #[default]
    Periodic,
    /// Fixed zero halo
    Zero,
    /// Linear extrapolation from the interior
    Extrapolated,
}

impl BoundaryCondition {
    /// Human-readable policy name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::Zero => "zero",
            Self::Extrapolated => "extrapolated",
        }
    }

    /// Check that the policy can fill a halo of depth `halo` on an axis of `cells` cells
    pub(crate) fn validate(&self, axis: usize, cells: usize, halo: usize) -> Result<()> {
        let required = match self {
            Self::Periodic => halo,
            Self::Zero => 0,
            Self::Extrapolated => 2,
        };
        if halo > 0 && cells < required {
            return Err(MpdataError::BoundaryCondition {
                policy: self.name(),
                axis,
                required,
                actual: cells,
            });
        }
        Ok(())
    }

    /// Rebuild the halo of `data` along `axis`
    ///
    /// The transverse axis is walked over its full padded extent so that corner
    /// cells are filled as well; physical values are never written.
    pub(crate) fn fill_halo(&self, data: &mut [f64], layout: &Layout, axis: usize, staggered: bool) {
        let h = layout.halo(axis) as isize;
        if h == 0 {
            return;
        }
        let n = layout.ext(axis) as isize;
        let other = 1 - axis;
        for t in layout.range(other, usize::MAX) {
            let at = |p: isize| {
                if axis == 0 {
                    layout.idx(p, t)
                } else {
                    layout.idx(t, p)
                }
            };
            match self {
                Self::Periodic => {
                    let period = if staggered { n - 1 } else { n };
                    for k in 1..=h {
                        data[at(-k)] = data[at(period - k)];
                        data[at(n - 1 + k)] = data[at(n - 1 + k - period)];
                    }
                }
                Self::Zero => {
                    for k in 1..=h {
                        data[at(-k)] = 0.0;
                        data[at(n - 1 + k)] = 0.0;
                    }
                }
                Self::Extrapolated => {
                    let first = data[at(0)];
                    let second = data[at(1)];
                    let last = data[at(n - 1)];
                    let before_last = data[at(n - 2)];
                    for k in 1..=h {
                        let kf = k as f64;
                        data[at(-k)] = first + kf * (first - second);
                        data[at(n - 1 + k)] = last + kf * (last - before_last);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arakawa_c::grid::Grid;

    fn line(values: &[f64], halo: usize) -> (Layout, Vec<f64>) {
        let grid = Grid::new_1d(values.len()).unwrap();
        let layout = Layout::scalar(&grid, halo);
        let mut data = vec![f64::NAN; layout.len()];
        layout.load_physical(&mut data, values);
        (layout, data)
    }

    #[test]
    fn test_periodic_wraps_cells() {
        let (layout, mut data) = line(&[1.0, 2.0, 3.0, 4.0], 2);
        BoundaryCondition::Periodic.fill_halo(&mut data, &layout, 0, false);
        assert_eq!(data, vec![3.0, 4.0, 1.0, 2.0, 3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn test_periodic_wraps_faces_sharing_the_end_face() {
        // Four cells -> five faces; face 4 coincides with face 0
        let grid = Grid::new_1d(4).unwrap();
        let layout = Layout::staggered(&grid, 2, 0);
        let mut data = vec![f64::NAN; layout.len()];
        layout.load_physical(&mut data, &[10.0, 11.0, 12.0, 13.0, 10.0]);
        BoundaryCondition::Periodic.fill_halo(&mut data, &layout, 0, true);
        assert_eq!(data[layout.idx(-1, 0)], 13.0);
        assert_eq!(data[layout.idx(-2, 0)], 12.0);
        assert_eq!(data[layout.idx(5, 0)], 11.0);
        assert_eq!(data[layout.idx(6, 0)], 12.0);
    }

    #[test]
    fn test_zero_ignores_interior() {
        let (layout, mut data) = line(&[5.0, 6.0, 7.0], 1);
        BoundaryCondition::Zero.fill_halo(&mut data, &layout, 0, false);
        assert_eq!(data, vec![0.0, 5.0, 6.0, 7.0, 0.0]);
    }

    #[test]
    fn test_extrapolated_is_exact_for_linear_data() {
        let (layout, mut data) = line(&[1.0, 3.0, 5.0, 7.0], 2);
        BoundaryCondition::Extrapolated.fill_halo(&mut data, &layout, 0, false);
        assert_eq!(data, vec![-3.0, -1.0, 1.0, 3.0, 5.0, 7.0, 9.0, 11.0]);
    }

    #[test]
    fn test_fill_is_idempotent() {
        for bc in [
            BoundaryCondition::Periodic,
            BoundaryCondition::Zero,
            BoundaryCondition::Extrapolated,
        ] {
            let (layout, mut data) = line(&[0.3, 1.7, -2.0, 4.5, 0.1], 2);
            bc.fill_halo(&mut data, &layout, 0, false);
            let once = data.clone();
            bc.fill_halo(&mut data, &layout, 0, false);
            assert_eq!(once, data, "{} is not idempotent", bc.name());
        }
    }

    #[test]
    fn test_validate_axis_length() {
        assert!(BoundaryCondition::Periodic.validate(0, 1, 2).is_err());
        assert!(BoundaryCondition::Periodic.validate(0, 2, 2).is_ok());
        assert!(BoundaryCondition::Extrapolated.validate(1, 1, 1).is_err());
        assert!(BoundaryCondition::Zero.validate(0, 1, 2).is_ok());
        // Inactive axis never needs a halo
        assert!(BoundaryCondition::Extrapolated.validate(1, 1, 0).is_ok());
    }
}
