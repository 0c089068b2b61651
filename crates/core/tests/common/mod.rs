//! Shared helpers for the integration tests
#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness once per test binary
#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// `exp(-((i - centre) / sigma)^2 / 2)` sampled at integer cell indices
pub fn gaussian(n: usize, centre: f64, sigma: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let s = (i as f64 - centre) / sigma;
            (-0.5 * s * s).exp()
        })
        .collect()
}

/// Index of the largest value
pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

/// Periodic local maxima above `threshold`
pub fn count_local_maxima(values: &[f64], threshold: f64) -> usize {
    let n = values.len();
    (0..n)
        .filter(|&i| {
            let v = values[i];
            v > threshold && v > values[(i + n - 1) % n] && v >= values[(i + 1) % n]
        })
        .count()
}

/// Mass-weighted mean and variance of cell indices
pub fn moments(values: &[f64]) -> (f64, f64, f64) {
    let mass: f64 = values.iter().sum();
    let mean = values.iter().enumerate().map(|(i, v)| i as f64 * v).sum::<f64>() / mass;
    let variance = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 - mean).powi(2) * v)
        .sum::<f64>()
        / mass;
    (mass, mean, variance)
}

/// Seeded uniform values in `[lo, hi)`
pub fn random_field(seed: u64, n: usize, lo: f64, hi: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(lo..hi)).collect()
}
