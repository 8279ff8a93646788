//! Seeded GBM path generation.
//!
//! Discretized log-normal recurrence at daily resolution:
//! `S[t+1] = S[t] * exp((drift - vol^2/2) * dt + vol * sqrt(dt) * Z)`,
//! `dt = 1/252`, `Z ~ N(0, 1)` from a ChaCha8 stream seeded from a `u64`.
//! ChaCha8 output is specified by the algorithm, not the platform, so an
//! identical seed is bit-reproducible across runs and machines. Nothing in
//! here may touch wall-clock time or OS entropy.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use thiserror::Error;

use crate::calibrate::{GbmParams, PERIODS_PER_YEAR};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("initial price {0} is not strictly positive")]
    InvalidInitialPrice(f64),

    #[error(
        "generated path {path} contains a non-finite or non-positive price \
         {value} at step {step}; calibration parameters are pathological"
    )]
    NonFinitePath { path: usize, step: usize, value: f64 },
}

/// Sub-seed for one instrument, so adding or removing an instrument never
/// perturbs another instrument's path set.
pub fn instrument_seed(master_seed: u64, instrument_index: usize) -> u64 {
    master_seed.wrapping_add(instrument_index as u64)
}

/// Generate `n_paths` independent price paths of `n_periods` steps each.
///
/// Each path holds `n_periods + 1` prices starting at `s0`. Draws are
/// consumed sequentially from a single seeded stream, so output never
/// depends on thread scheduling; parallelism belongs to the engine re-runs
/// downstream, not to generation.
pub fn generate_paths(
    params: &GbmParams,
    s0: f64,
    n_paths: usize,
    n_periods: usize,
    seed: u64,
) -> Result<Vec<Vec<f64>>, SimulationError> {
    if !(s0.is_finite() && s0 > 0.0) {
        return Err(SimulationError::InvalidInitialPrice(s0));
    }

    let dt = 1.0 / PERIODS_PER_YEAR;
    let step_drift = (params.drift_annual - params.vol_annual * params.vol_annual / 2.0) * dt;
    let step_vol = params.vol_annual * dt.sqrt();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut paths = Vec::with_capacity(n_paths);
    for path_index in 0..n_paths {
        let mut path = Vec::with_capacity(n_periods + 1);
        let mut price = s0;
        path.push(price);
        for step in 1..=n_periods {
            let z: f64 = StandardNormal.sample(&mut rng);
            price *= (step_drift + step_vol * z).exp();
            if !(price.is_finite() && price > 0.0) {
                return Err(SimulationError::NonFinitePath {
                    path: path_index,
                    step,
                    value: price,
                });
            }
            path.push(price);
        }
        paths.push(path);
    }
    Ok(paths)
}
