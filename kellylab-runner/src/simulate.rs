//! Empirical ruin estimation: re-run the engine over synthetic paths.
//!
//! Each path is a fully independent engine invocation — no shared mutable
//! state, no ordering dependency — so the re-runs fan out over rayon while
//! path *generation* stays sequential and seed-determined. The empirical
//! ruin rate is reported next to the analyzer's closed-form prediction at
//! the same leverage; a gap between the two is the signal that the
//! Gaussian/i.i.d. model is inadequate, and it is never hidden.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use kellylab_core::domain::PriceSeries;
use kellylab_core::engine::ReturnEngine;
use kellylab_core::kelly::{self, EdgeAssessment};
use kellylab_core::strategy::Strategy;

use crate::calibrate::GbmParams;
use crate::config::{RunId, SimConfig};
use crate::paths::{generate_paths, instrument_seed};

/// Calibrated parameters for one instrument, reported for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentCalibration {
    pub symbol: String,
    pub params: GbmParams,
}

/// Output of one Monte-Carlo stress run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: RunId,
    pub n_paths: usize,
    pub seed: u64,
    pub calibrations: Vec<InstrumentCalibration>,
    /// Reference leverage: the half-Kelly fraction from the historical run.
    pub reference_fraction: f64,
    /// Closed-form ruin probability at the reference leverage.
    pub theoretical_ruin_rate: f64,
    /// Fraction of synthetic paths that hit the drawdown threshold.
    pub empirical_ruin_rate: f64,
    pub ruined_paths: usize,
}

/// Calibrate from history, generate seeded paths, re-run the engine on each
/// path at the historical half-Kelly leverage, and count ruined paths.
pub fn run_simulation(
    historical: &[PriceSeries],
    strategy: &(dyn Strategy + Sync),
    config: &SimConfig,
) -> Result<SimulationResult> {
    let engine = ReturnEngine::new(config.cost);

    let hist = engine
        .run_strategy(historical, strategy)
        .context("historical backtest failed")?;
    let analysis = kelly::analyze(
        &hist.net,
        hist.warmup_end,
        config.ruin_target,
        config.drawdown,
    )
    .context("historical Kelly estimation failed")?;

    let reference_fraction = match analysis.assessment {
        EdgeAssessment::Tradeable { half_fraction, .. } => half_fraction,
        EdgeAssessment::NonTradeable => {
            bail!("historical edge is non-tradeable (f* <= 0); no reference leverage to stress-test")
        }
    };
    // Half-Kelly is alpha = 0.5 by construction.
    let theoretical_ruin_rate = kelly::ruin_probability(0.5, config.drawdown)?;

    let calibrations: Vec<InstrumentCalibration> = historical
        .iter()
        .map(|series| InstrumentCalibration {
            symbol: series.symbol().to_string(),
            params: GbmParams::calibrate(series),
        })
        .collect();

    // One path set per instrument, each from its own sub-seed, generated
    // up front so the engine re-runs can be reordered freely.
    let mut instrument_paths = Vec::with_capacity(historical.len());
    for (index, (series, calibration)) in
        historical.iter().zip(&calibrations).enumerate()
    {
        let s0 = series.close(series.len() - 1);
        let paths = generate_paths(
            &calibration.params,
            s0,
            config.n_paths,
            config.n_periods,
            instrument_seed(config.seed, index),
        )?;
        instrument_paths.push(paths);
    }

    // Synthetic calendar: dates only need to be strictly increasing.
    let synthetic_start = NaiveDate::from_ymd_opt(2000, 1, 3).expect("valid date");

    let ruin_flags: Vec<bool> = (0..config.n_paths)
        .into_par_iter()
        .map(|path_index| -> Result<bool> {
            let synthetic: Vec<PriceSeries> = historical
                .iter()
                .zip(&instrument_paths)
                .map(|(series, paths)| {
                    PriceSeries::from_closes(
                        series.symbol(),
                        synthetic_start,
                        &paths[path_index],
                    )
                })
                .collect::<std::result::Result<_, _>>()?;

            let result = engine.run_strategy(&synthetic, strategy)?;
            Ok(is_ruined(
                result.traded_net(),
                reference_fraction,
                config.drawdown,
            ))
        })
        .collect::<Result<_>>()?;

    let ruined_paths = ruin_flags.iter().filter(|&&r| r).count();

    Ok(SimulationResult {
        run_id: config.run_id(),
        n_paths: config.n_paths,
        seed: config.seed,
        calibrations,
        reference_fraction,
        theoretical_ruin_rate,
        empirical_ruin_rate: ruined_paths as f64 / config.n_paths.max(1) as f64,
        ruined_paths,
    })
}

/// True if the leveraged cumulative value curve ever drops below
/// `(1 - drawdown)` of its running peak.
///
/// Net log returns are scaled linearly by the leverage fraction without
/// recomputing costs at the scaled position size. That understates costs at
/// leverage above 1.0 and is the source system's documented approximation,
/// preserved deliberately.
pub fn is_ruined(net_returns: &[f64], fraction: f64, drawdown: f64) -> bool {
    let floor = 1.0 - drawdown;
    let mut log_equity = 0.0;
    let mut log_peak = 0.0;
    for &r in net_returns {
        log_equity += fraction * r;
        if log_equity > log_peak {
            log_peak = log_equity;
        }
        if (log_equity - log_peak).exp() < floor {
            return true;
        }
    }
    false
}
