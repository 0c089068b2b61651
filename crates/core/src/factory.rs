//! Ready-made steppers for the standard advection setups
//!
//! Each factory derives the halo depth from the options, builds the
//! [`Step`](crate::Step) plan and wires advectee, advector and (where the
//! setup needs one) g-factor together, returning fully validated steppers.

use crate::arakawa_c::discretisation::{discretised_analytical_solution, linspace, nondivergent_vector_field_2d};
use crate::arakawa_c::{BoundaryCondition, Grid, ScalarField, VectorField};
use crate::coordinates::CoordinateTransform;
use crate::error::{MpdataError, Result};
use crate::solver::{EulerianFields, Mpdata, Options, StepBuilder};
use tracing::info;

/// Halo depth required by `options`
pub fn n_halo(options: &Options) -> usize {
    options.n_halo()
}

/// 1D periodic domain with the same Courant number on every face
///
/// # Errors
///
/// Fails for empty data, invalid options or `|courant| >= 1`.
pub fn constant_1d(data: &[f64], courant: f64, options: Options) -> Result<Mpdata> {
    let grid = Grid::new_1d(data.len())?;
    let halo = n_halo(&options);
    let step = StepBuilder::new(options).build(grid, halo)?;
    let advectee = ScalarField::new(grid, data, halo)?;
    let advector = VectorField::new(grid, &[vec![courant; data.len() + 1]], halo)?;
    Mpdata::new(step, advectee, advector)
}

/// 2D periodic domain with uniform Courant numbers `[c0, c1]`
///
/// # Arguments
///
/// * `data` - Row-major initial field of `shape[0] * shape[1]` cells
/// * `shape` - Grid shape
/// * `courant` - Courant number along each axis
/// * `options` - Scheme options
///
/// # Errors
///
/// Fails on a shape mismatch, invalid options or a CFL violation.
pub fn constant_2d(data: &[f64], shape: [usize; 2], courant: [f64; 2], options: Options) -> Result<Mpdata> {
    let grid = Grid::new_2d(shape[0], shape[1])?;
    let halo = n_halo(&options);
    let step = StepBuilder::new(options).build(grid, halo)?;
    let advectee = ScalarField::new(grid, data, halo)?;
    let advector = VectorField::uniform(grid, &courant, halo, &[BoundaryCondition::Periodic; 2])?;
    Mpdata::new(step, advectee, advector)
}

/// 2D periodic domain advected by the flow of a stream function
///
/// # Errors
///
/// Fails for a non-2D grid, invalid geometry or options, a field of the
/// wrong size, or a flow violating the CFL condition.
pub fn stream_function_2d_basic(
    grid: Grid,
    size: [f64; 2],
    dt: f64,
    stream_function: impl Fn(f64, f64) -> f64,
    field: &[f64],
    options: Options,
) -> Result<Mpdata> {
    let halo = n_halo(&options);
    let step = StepBuilder::new(options).build(grid, halo)?;
    let advector = nondivergent_vector_field_2d(grid, size, dt, stream_function, halo)?;
    let advectee = ScalarField::new(grid, field, halo)?;
    Mpdata::new(step, advectee, advector)
}

/// Coupled uniform tracers advected by one stream-function flow with a
/// shared g-factor
///
/// # Arguments
///
/// * `grid` - 2D grid
/// * `size` - Physical domain extent
/// * `dt` - Timestep
/// * `stream_function` - `psi(x, z)`
/// * `field_values` - `(name, initial value)` per tracer
/// * `g_factor` - Row-major g-factor, one value per cell
/// * `options` - Scheme options
///
/// # Errors
///
/// See [`stream_function_2d_basic`]; additionally fails for duplicate names
/// or a non-positive g-factor.
pub fn stream_function_2d(
    grid: Grid,
    size: [f64; 2],
    dt: f64,
    stream_function: impl Fn(f64, f64) -> f64,
    field_values: &[(&str, f64)],
    g_factor: &[f64],
    options: Options,
) -> Result<EulerianFields> {
    let halo = n_halo(&options);
    let step = StepBuilder::new(options)
        .non_unit_g_factor(true)
        .build(grid, halo)?;
    let advector = nondivergent_vector_field_2d(grid, size, dt, stream_function, halo)?;
    let g_factor = ScalarField::new(grid, g_factor, halo)?;
    let periodic = [BoundaryCondition::Periodic; 2];
    let advectees = field_values
        .iter()
        .map(|&(name, value)| Ok((name.to_string(), ScalarField::uniform(grid, value, halo, &periodic)?)))
        .collect::<Result<Vec<_>>>()?;
    EulerianFields::new(&step, advector, advectees, Some(g_factor))
}

/// 1D advection with a constant Courant number plus diffusion
///
/// # Arguments
///
/// * `options` - Scheme options; `mu_coeff` overrides `options.mu_coeff`
/// * `advectee` - Initial field
/// * `advector` - Courant number on every face
/// * `mu_coeff` - Dimensionless diffusion coefficient `nu dt / dx^2`
/// * `boundary_condition` - Policy for both advectee and advector
///
/// # Errors
///
/// Fails for invalid options, an axis too short for the policy, or
/// `|advector| + 2 mu_coeff >= 1`.
pub fn advection_diffusion_1d(
    options: Options,
    advectee: &[f64],
    advector: f64,
    mu_coeff: f64,
    boundary_condition: BoundaryCondition,
) -> Result<Mpdata> {
    let options = options.with_mu_coeff(Some(mu_coeff));
    let grid = Grid::new_1d(advectee.len())?;
    let halo = n_halo(&options);
    let step = StepBuilder::new(options).build(grid, halo)?;
    let bcs = [boundary_condition];
    let advectee = ScalarField::with_boundary_conditions(grid, advectee, halo, &bcs)?;
    let advector = VectorField::uniform(grid, &[advector], halo, &bcs)?;
    Mpdata::new(step, advectee, advector)
}

/// Droplet growth setup returned by [`condensational_growth`]
#[derive(Debug, Clone)]
pub struct CondensationalGrowth {
    /// Stepper advecting the size-spectrum density
    pub solver: Mpdata,
    /// Bin-centre radii
    pub r: Vec<f64>,
    /// Bin-edge radii (`r.len() + 1` values)
    pub rh: Vec<f64>,
    /// Bin width in the grid coordinate
    pub dx: f64,
}

/// Size-spectrum advection in a transformed radius coordinate
///
/// Bins are evenly spaced in `grid_layout` coordinates between `r_min` and
/// `r_max`. The advectee is the bin average of `pdf(r) / psi_coord.dx_dr(r)`,
/// the g-factor `psi_coord.dx_dr(r) / grid_layout.dx_dr(r)` and the Courant
/// numbers on the bin edges `drdt(rh) * psi_coord.dx_dr(rh) * dt / dx`.
/// Advectee and advector use zero boundaries (nothing enters from outside the
/// spectrum), the g-factor is extrapolated.
///
/// # Arguments
///
/// * `nr` - Number of bins (at least 2)
/// * `r_min`, `r_max` - Spectrum bounds, `0 < r_min < r_max`
/// * `dt` - Timestep
/// * `grid_layout` - Coordinate in which bins are evenly spaced
/// * `psi_coord` - Coordinate of the advected density
/// * `pdf_of_r` - Initial size distribution
/// * `drdt_of_r` - Growth rate
/// * `options` - Scheme options
///
/// # Errors
///
/// Returns [`MpdataError::InvalidGeometry`] for bad bounds or timestep,
/// [`MpdataError::InvalidGrid`] for fewer than two bins, and
/// [`MpdataError::CflViolation`] when the growth rate is too fast for `dt`.
pub fn condensational_growth(
    nr: usize,
    r_min: f64,
    r_max: f64,
    dt: f64,
    grid_layout: &dyn CoordinateTransform,
    psi_coord: &dyn CoordinateTransform,
    pdf_of_r: impl Fn(f64) -> f64,
    drdt_of_r: impl Fn(f64) -> f64,
    options: Options,
) -> Result<CondensationalGrowth> {
    if !(r_min > 0.0 && r_max > r_min && r_max.is_finite()) {
        return Err(MpdataError::InvalidGeometry(format!(
            "radius bounds must satisfy 0 < r_min < r_max, got [{r_min}, {r_max}]"
        )));
    }
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(MpdataError::InvalidGeometry(format!("timestep must be positive, got {dt}")));
    }
    if nr < 2 {
        return Err(MpdataError::InvalidGrid(format!("need at least 2 bins, got {nr}")));
    }

    let (xh, dx) = linspace(grid_layout.x(r_min), grid_layout.x(r_max), nr + 1);
    let rh: Vec<f64> = xh.iter().map(|&x| grid_layout.r(x)).collect();
    let (x, _) = linspace(xh[0] + dx / 2.0, xh[nr] - dx / 2.0, nr);
    let r: Vec<f64> = x.iter().map(|&x| grid_layout.r(x)).collect();

    let psi = discretised_analytical_solution(&rh, |r| pdf_of_r(r) / psi_coord.dx_dr(r));
    let gc_h: Vec<f64> = rh
        .iter()
        .map(|&r| drdt_of_r(r) * psi_coord.dx_dr(r) * dt / dx)
        .collect();
    let g: Vec<f64> = r
        .iter()
        .map(|&r| psi_coord.dx_dr(r) / grid_layout.dx_dr(r))
        .collect();

    let grid = Grid::new_1d(nr)?;
    let halo = n_halo(&options);
    let step = StepBuilder::new(options)
        .non_unit_g_factor(true)
        .build(grid, halo)?;
    let g_factor = ScalarField::with_boundary_conditions(grid, &g, halo, &[BoundaryCondition::Extrapolated])?;
    let advectee = ScalarField::with_boundary_conditions(grid, &psi, halo, &[BoundaryCondition::Zero])?;
    let advector = VectorField::with_boundary_conditions(grid, &[gc_h], halo, &[BoundaryCondition::Zero])?;
    let solver = Mpdata::with_g_factor(step, advectee, advector, g_factor)?;

    info!(nr, r_min, r_max, dx, "Created condensational growth setup");
    Ok(CondensationalGrowth { solver, r, rh, dx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::{Linear, Power};
    use crate::solver::TimeStepper;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_1d_uses_halo_rule() {
        let solver = constant_1d(&[1.0; 8], 0.25, Options::default().with_fct(true)).unwrap();
        assert_eq!(solver.plan().halo(), 2);
        assert_eq!(solver.advector().component(0), vec![0.25; 9]);
        assert!(constant_1d(&[1.0; 8], 1.25, Options::default()).is_err());
        assert!(constant_1d(&[], 0.25, Options::default()).is_err());
    }

    #[test]
    fn test_constant_2d_components() {
        let solver = constant_2d(&[0.0; 12], [3, 4], [0.1, -0.2], Options::default()).unwrap();
        assert_eq!(solver.advector().component(0), vec![0.1; 16]);
        assert_eq!(solver.advector().component(1), vec![-0.2; 15]);
        assert!(constant_2d(&[0.0; 11], [3, 4], [0.1, -0.2], Options::default()).is_err());
    }

    #[test]
    fn test_stream_function_2d_group() {
        let grid = Grid::new_2d(8, 6).unwrap();
        let fields = stream_function_2d(
            grid,
            [8.0, 6.0],
            0.1,
            |x, z| 0.5 * (x * 0.3).sin() * (z * 0.4).cos(),
            &[("th", 300.0), ("qv", 0.01)],
            &[1.2; 48],
            Options::default(),
        )
        .unwrap();
        assert_eq!(fields.names(), vec!["qv", "th"]);
        assert!(fields.get("th").unwrap().g_factor().is_some());

        let duplicate = stream_function_2d(
            grid,
            [8.0, 6.0],
            0.1,
            |_, _| 0.0,
            &[("th", 1.0), ("th", 2.0)],
            &[1.0; 48],
            Options::default(),
        );
        assert!(matches!(duplicate, Err(MpdataError::DuplicateField(_))));
    }

    #[test]
    fn test_advection_diffusion_sets_mu() {
        let solver = advection_diffusion_1d(
            Options::default(),
            &[0.0, 1.0, 2.0, 1.0, 0.0],
            0.2,
            0.05,
            BoundaryCondition::Zero,
        )
        .unwrap();
        assert_eq!(solver.options().mu_coeff, Some(0.05));
        assert_eq!(solver.advectee().boundary_conditions(), &[BoundaryCondition::Zero]);
        assert!(advection_diffusion_1d(Options::default(), &[1.0; 5], 0.7, 0.2, BoundaryCondition::Periodic).is_err());
    }

    #[test]
    fn test_growth_layout_linear() {
        let setup = condensational_growth(
            10,
            1.0,
            11.0,
            0.5,
            &Linear,
            &Linear,
            |_| 2.0,
            |_| 0.4,
            Options::default(),
        )
        .unwrap();
        assert_relative_eq!(setup.dx, 1.0, epsilon = 1e-12);
        assert_eq!(setup.rh.len(), 11);
        assert_relative_eq!(setup.r[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(setup.r[9], 10.5, epsilon = 1e-12);
        for v in setup.solver.advectee().to_vec() {
            assert_relative_eq!(v, 2.0, epsilon = 1e-12);
        }
        for c in setup.solver.advector().component(0) {
            assert_relative_eq!(c, 0.2, epsilon = 1e-12);
        }
        assert_eq!(setup.solver.g_factor().map(ScalarField::to_vec), Some(vec![1.0; 10]));
    }

    #[test]
    fn test_growth_g_factor_for_power_coordinate() {
        let setup = condensational_growth(
            8,
            1.0,
            3.0,
            0.01,
            &Linear,
            &Power { exponent: 2.0 },
            |r| (-(r - 2.0) * (r - 2.0)).exp(),
            |r| 1.0 / r,
            Options::default(),
        )
        .unwrap();
        let g = setup.solver.g_factor().unwrap().to_vec();
        for (g, r) in g.iter().zip(&setup.r) {
            assert_relative_eq!(*g, 2.0 * r, max_relative = 1e-12);
        }
        // drdt * dp/dr = 2 everywhere
        for c in setup.solver.advector().component(0) {
            assert_relative_eq!(c, 2.0 * 0.01 / setup.dx, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_growth_rejects_bad_input() {
        let run = |nr, r_min, r_max, dt, rate: f64| {
            condensational_growth(nr, r_min, r_max, dt, &Linear, &Linear, |_| 1.0, move |_| rate, Options::default())
        };
        assert!(matches!(run(10, 0.0, 1.0, 0.1, 0.1), Err(MpdataError::InvalidGeometry(_))));
        assert!(matches!(run(10, 2.0, 1.0, 0.1, 0.1), Err(MpdataError::InvalidGeometry(_))));
        assert!(matches!(run(10, 1.0, 2.0, -0.1, 0.1), Err(MpdataError::InvalidGeometry(_))));
        assert!(matches!(run(1, 1.0, 2.0, 0.1, 0.1), Err(MpdataError::InvalidGrid(_))));
        assert!(matches!(run(10, 1.0, 2.0, 0.1, 5.0), Err(MpdataError::CflViolation { .. })));
    }

    #[test]
    fn test_growth_translates_spectrum_in_linear_coordinates() {
        let mut setup = condensational_growth(
            40,
            1.0,
            41.0,
            1.0,
            &Linear,
            &Linear,
            |r| if (10.0..=14.0).contains(&r) { 1.0 } else { 0.0 },
            |_| 0.5,
            Options::upwind(),
        )
        .unwrap();
        let mean = |values: &[f64]| {
            let mass: f64 = values.iter().sum();
            values.iter().zip(&setup.r).map(|(v, r)| v * r).sum::<f64>() / mass
        };
        let initial = setup.solver.advectee().to_vec();
        let mean_before = mean(&initial);
        setup.solver.advance(10);
        let after = setup.solver.advectee().to_vec();
        // Nothing reaches the top bin yet, so mass is conserved
        assert_relative_eq!(after.iter().sum::<f64>(), initial.iter().sum::<f64>(), max_relative = 1e-12);
        let mean_after = mean(&after);
        assert_relative_eq!(mean_after - mean_before, 5.0, epsilon = 1e-6);
    }
}
