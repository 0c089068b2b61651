use clap::{Args, Parser, Subcommand, ValueEnum};
use mpdata_core::factory::{
    advection_diffusion_1d, condensational_growth, constant_1d, stream_function_2d, stream_function_2d_basic,
};
use mpdata_core::{
    BoundaryCondition, CoordinateTransform, Grid, Linear, Logarithmic, Mpdata, Options, Power, Result, ScalarField,
    TimeStepper,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// MPDATA advection demo running the reference scenarios
#[derive(Parser, Debug)]
#[command(name = "mpdata-demo")]
#[command(about = "Headless MPDATA advection scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Subcommand, Debug)]
enum Scenario {
    /// Translate a Gaussian pulse around a periodic line
    Gaussian {
        /// Number of cells
        #[arg(short, long, default_value_t = 100)]
        n: usize,

        /// Courant number on every face
        #[arg(short, long, default_value_t = 0.5, allow_hyphen_values = true)]
        courant: f64,

        /// Width of the pulse in cells
        #[arg(long, default_value_t = 5.0)]
        sigma: f64,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Rotate a cone in a solid-body stream-function flow, plus coupled uniform tracers
    Rotation {
        /// Cells per axis
        #[arg(short, long, default_value_t = 32)]
        n: usize,

        /// Angular velocity times timestep (radians per step)
        #[arg(long, default_value_t = 0.02)]
        omega_dt: f64,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Advect and diffuse a Gaussian pulse
    Diffusion {
        /// Number of cells
        #[arg(short, long, default_value_t = 100)]
        n: usize,

        /// Courant number on every face
        #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
        courant: f64,

        /// Dimensionless diffusion coefficient (nu dt / dx^2)
        #[arg(short, long, default_value_t = 0.05)]
        mu: f64,

        /// Boundary policy for both fields
        #[arg(short, long, value_enum, default_value_t = Boundary::Periodic)]
        boundary: Boundary,

        #[command(flatten)]
        run: RunArgs,
    },
    /// Grow an East & Marshall (1954) droplet spectrum with dr/dt = xi / r
    Growth {
        /// Number of bins
        #[arg(long, default_value_t = 64)]
        nr: usize,

        /// Smallest radius in micrometres
        #[arg(long, default_value_t = 1.0)]
        r_min: f64,

        /// Largest radius in micrometres
        #[arg(long, default_value_t = 25.0)]
        r_max: f64,

        /// Growth constant in square micrometres per second
        #[arg(long, default_value_t = 10.0)]
        xi: f64,

        /// Largest Courant number, sets the timestep
        #[arg(short, long, default_value_t = 0.5)]
        courant: f64,

        /// Coordinate in which bins are evenly spaced
        #[arg(short, long, value_enum, default_value_t = Layout::Surface)]
        layout: Layout,

        #[command(flatten)]
        run: RunArgs,
    },
}

/// Options shared by every scenario
#[derive(Args, Debug)]
struct RunArgs {
    /// Number of timesteps
    #[arg(short, long, default_value_t = 100)]
    steps: u64,

    /// Report interval in steps
    #[arg(short, long, default_value_t = 20)]
    report_interval: u64,

    /// Number of MPDATA passes (1 = upwind)
    #[arg(short = 'i', long, default_value_t = 2)]
    n_iters: usize,

    /// Flux-corrected transport (non-oscillatory option)
    #[arg(long)]
    fct: bool,

    /// Divergent-flow correction
    #[arg(long)]
    dfl: bool,

    /// Third-order terms
    #[arg(long)]
    tot: bool,
}

impl RunArgs {
    fn options(&self) -> Options {
        Options::default()
            .with_n_iters(self.n_iters)
            .with_fct(self.fct)
            .with_divergent_flow(self.dfl)
            .with_third_order_terms(self.tot)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Boundary {
    Periodic,
    Zero,
    Extrapolated,
}

impl From<Boundary> for BoundaryCondition {
    fn from(boundary: Boundary) -> Self {
        match boundary {
            Boundary::Periodic => BoundaryCondition::Periodic,
            Boundary::Zero => BoundaryCondition::Zero,
            Boundary::Extrapolated => BoundaryCondition::Extrapolated,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Layout {
    /// x = r
    Linear,
    /// x = r^2
    Surface,
    /// x = ln(r)
    Log,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    println!("=== MPDATA Advection Demo ===\n");

    let outcome = match cli.scenario {
        Scenario::Gaussian { n, courant, sigma, run } => run_gaussian(n, courant, sigma, &run),
        Scenario::Rotation { n, omega_dt, run } => run_rotation(n, omega_dt, &run),
        Scenario::Diffusion { n, courant, mu, boundary, run } => run_diffusion(n, courant, mu, boundary, &run),
        Scenario::Growth { nr, r_min, r_max, xi, courant, layout, run } => {
            run_growth(nr, r_min, r_max, xi, courant, layout, &run)
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Step `solver`, printing a table row every `report_interval` steps
fn run_with_report(solver: &mut Mpdata, run: &RunArgs) {
    println!(" Step   | Mass            | Min         | Max");
    println!("--------|-----------------|-------------|------------");
    report_row(solver);
    let interval = run.report_interval.max(1);
    let mut remaining = run.steps;
    while remaining > 0 {
        let n = interval.min(remaining);
        solver.advance(n);
        remaining -= n;
        report_row(solver);
    }
}

fn report_row(solver: &Mpdata) {
    let advectee = solver.advectee();
    let (min, max) = advectee.min_max();
    println!(
        "{:7} | {:15.9} | {:11.4e} | {:10.6}",
        solver.step_count(),
        weighted_mass(advectee, solver.g_factor()),
        min,
        max
    );
}

fn weighted_mass(advectee: &ScalarField, g_factor: Option<&ScalarField>) -> f64 {
    match g_factor {
        Some(g) => advectee.to_vec().iter().zip(g.to_vec()).map(|(psi, g)| psi * g).sum(),
        None => advectee.sum(),
    }
}

fn gaussian(n: usize, centre: f64, sigma: f64) -> Vec<f64> {
    (0..n)
        .map(|i| (-0.5 * ((i as f64 - centre) / sigma).powi(2)).exp())
        .collect()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

fn run_gaussian(n: usize, courant: f64, sigma: f64, run: &RunArgs) -> Result<()> {
    let centre = n as f64 / 4.0;
    let mut solver = constant_1d(&gaussian(n, centre, sigma), courant, run.options())?;
    println!("Gaussian pulse: {n} cells, C = {courant}, sigma = {sigma}");
    println!("Options: {:?}\n", solver.options());
    run_with_report(&mut solver, run);

    let result = solver.advectee().to_vec();
    let expected = (centre + courant * run.steps as f64).rem_euclid(n as f64);
    println!("\nPeak at cell {} (expected {expected:.1})", argmax(&result));
    Ok(())
}

fn run_rotation(n: usize, omega_dt: f64, run: &RunArgs) -> Result<()> {
    let grid = Grid::new_2d(n, n)?;
    let half = n as f64 / 2.0;
    let rotation = move |x: f64, z: f64| -0.5 * omega_dt * ((x - half).powi(2) + (z - half).powi(2));

    // Cone of radius n/8 halfway between the centre and the edge
    let (cx, cz, radius) = (1.5 * half, half, n as f64 / 8.0);
    let mut cone = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let r = (i as f64 + 0.5 - cx).hypot(j as f64 + 0.5 - cz);
            cone.push((1.0 - r / radius).max(0.0));
        }
    }

    let size = [n as f64, n as f64];
    let mut solver = stream_function_2d_basic(grid, size, 1.0, rotation, &cone, run.options())?;
    let (max_courant, axis, face) = solver.advector().max_abs();
    println!("Solid-body rotation: {n}x{n} cells, omega dt = {omega_dt}");
    println!("Max |C| = {max_courant:.3} (axis {axis}, face {face})\n");
    run_with_report(&mut solver, run);

    let values = solver.advectee().to_vec();
    let mass: f64 = values.iter().sum();
    let (mut x, mut z) = (0.0, 0.0);
    for (k, v) in values.iter().enumerate() {
        x += ((k / n) as f64 + 0.5) * v;
        z += ((k % n) as f64 + 0.5) * v;
    }
    let theta = omega_dt * run.steps as f64;
    let expected = (
        half + (cx - half) * theta.cos() + (cz - half) * theta.sin(),
        half - (cx - half) * theta.sin() + (cz - half) * theta.cos(),
    );
    println!(
        "\nCentre of mass ({:.3}, {:.3}), solid-body rotation gives ({:.3}, {:.3})",
        x / mass,
        z / mass,
        expected.0,
        expected.1
    );

    // Coupled tracers sharing the same flow
    let tracers = [("th", 300.0), ("qv", 0.01)];
    let mut fields = stream_function_2d(grid, size, 1.0, rotation, &tracers, &vec![1.0; n * n], run.options())?;
    fields.advance(run.steps);
    println!("\nCoupled tracers after {} steps:", fields.step_count());
    for (name, value) in tracers {
        if let Some(field) = fields.advectee(name) {
            let (min, max) = field.min_max();
            println!("  {name}: [{min:.12}, {max:.12}] (initial {value})");
        }
    }
    Ok(())
}

fn run_diffusion(n: usize, courant: f64, mu: f64, boundary: Boundary, run: &RunArgs) -> Result<()> {
    let initial = gaussian(n, n as f64 / 2.0, n as f64 / 20.0);
    let mut solver = advection_diffusion_1d(run.options(), &initial, courant, mu, boundary.into())?;
    println!("Advection-diffusion: {n} cells, C = {courant}, mu = {mu}, {boundary:?} boundaries\n");

    let variance = |values: &[f64]| {
        let mass: f64 = values.iter().sum();
        let mean = values.iter().enumerate().map(|(i, v)| i as f64 * v).sum::<f64>() / mass;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64 - mean).powi(2) * v)
            .sum::<f64>()
            / mass
    };
    let before = variance(&initial);
    run_with_report(&mut solver, run);
    let after = variance(&solver.advectee().to_vec());
    println!(
        "\nVariance {before:.3} -> {after:.3} (pure diffusion adds {:.3})",
        2.0 * mu * run.steps as f64
    );
    Ok(())
}

/// East & Marshall (1954) spectrum in droplets per cm^3 per micrometre
fn east_marshall_pdf(r: f64) -> f64 {
    700.0 / r * (-22.0 * (r / 7.0).log10().powi(2)).exp()
}

fn run_growth(
    nr: usize,
    r_min: f64,
    r_max: f64,
    xi: f64,
    courant: f64,
    layout: Layout,
    run: &RunArgs,
) -> Result<()> {
    let grid_layout: Box<dyn CoordinateTransform> = match layout {
        Layout::Linear => Box::new(Linear),
        Layout::Surface => Box::new(Power { exponent: 2.0 }),
        Layout::Log => Box::new(Logarithmic { r0: 1.0 }),
    };
    let psi_coord = Power { exponent: 2.0 };
    let drdt = move |r: f64| xi / r;

    // Largest Courant number over the bin edges sets the timestep
    let dx = (grid_layout.x(r_max) - grid_layout.x(r_min)) / nr as f64;
    let fastest = (0..=nr)
        .map(|k| grid_layout.r(grid_layout.x(r_min) + k as f64 * dx))
        .map(|r| drdt(r) * psi_coord.dx_dr(r))
        .fold(0.0, f64::max);
    let dt = courant * dx / fastest;

    let mut setup = condensational_growth(
        nr,
        r_min,
        r_max,
        dt,
        grid_layout.as_ref(),
        &psi_coord,
        east_marshall_pdf,
        drdt,
        run.options(),
    )?;
    println!("Condensational growth: {nr} bins over [{r_min}, {r_max}] um, {layout:?} layout");
    println!("xi = {xi} um^2/s, dt = {dt:.4} s, dx = {:.4}\n", setup.dx);

    let mean_radius = |solver: &Mpdata, r: &[f64]| {
        let psi = solver.advectee().to_vec();
        let g = solver.g_factor().map_or_else(|| vec![1.0; psi.len()], ScalarField::to_vec);
        let weights: Vec<f64> = psi.iter().zip(&g).map(|(p, g)| p * g).collect();
        weights.iter().zip(r).map(|(w, r)| w * r).sum::<f64>() / weights.iter().sum::<f64>()
    };
    let before = mean_radius(&setup.solver, &setup.r);
    run_with_report(&mut setup.solver, run);
    let after = mean_radius(&setup.solver, &setup.r);

    let t = dt * run.steps as f64;
    println!("\nMean radius {before:.3} um -> {after:.3} um after {t:.2} s");
    Ok(())
}
