//! Known-answer verification battery.
//!
//! A fixed set of checks, each comparing an analytically precomputed value
//! against the live pipeline's output. Passing certifies that the engine,
//! cost model, analyzer, and path generator are wired together correctly —
//! not merely that they run without panicking. Re-running the battery is
//! the only retry concept anywhere in the core, and it is caller-initiated.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use kellylab_core::domain::{PriceSeries, TargetWeights};
use kellylab_core::engine::{CostParams, ReturnEngine};
use kellylab_core::kelly::{self, CriticalFraction, EdgeAssessment};
use kellylab_core::stats::{mean, sample_std};

use crate::calibrate::GbmParams;
use crate::paths::generate_paths;

/// One known-answer check: expected vs. actual, both always reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub expected: f64,
    pub actual: f64,
    pub tolerance: f64,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        (self.expected - self.actual).abs() <= self.tolerance
    }
}

fn series(symbol: &str, closes: &[f64]) -> Result<PriceSeries> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date");
    Ok(PriceSeries::from_closes(symbol, start, closes)?)
}

fn constant_weights(symbols: &[&str], weight: f64, n_rows: usize) -> Result<TargetWeights> {
    let rows = vec![vec![Some(weight); symbols.len()]; n_rows];
    Ok(TargetWeights::new(
        symbols.iter().map(|s| s.to_string()).collect(),
        rows,
    )?)
}

/// Synthetic return series with exact population moments `(mu, sigma)`.
fn two_point_returns(mu: f64, sigma: f64, n_pairs: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(2 * n_pairs);
    for _ in 0..n_pairs {
        out.push(mu + sigma);
        out.push(mu - sigma);
    }
    out
}

/// An instrument rising exactly 1% per period for 10 periods, held at full
/// weight with zero cost, must compound to `1.01^10 - 1`.
fn check_deterministic_compounding() -> Result<CheckOutcome> {
    let closes: Vec<f64> = (0..=10).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
    let prices = [series("CMP", &closes)?];
    let targets = constant_weights(&["CMP"], 1.0, closes.len())?;
    let result = ReturnEngine::frictionless().run(&prices, &targets)?;
    Ok(CheckOutcome {
        name: "deterministic_compounding",
        expected: 1.01_f64.powi(10) - 1.0,
        actual: result.equity.last().copied().unwrap_or(f64::NAN) - 1.0,
        tolerance: 1e-10,
    })
}

/// Equal weights on +5% and -5% must aggregate to exactly 0% — a small
/// negative number here is the signature of log-return aggregation.
fn check_cross_sectional_aggregation() -> Result<CheckOutcome> {
    let prices = [series("UP", &[100.0, 105.0])?, series("DN", &[100.0, 95.0])?];
    let targets = constant_weights(&["UP", "DN"], 0.5, 2)?;
    let result = ReturnEngine::frictionless().run(&prices, &targets)?;
    Ok(CheckOutcome {
        name: "cross_sectional_aggregation",
        expected: 0.0,
        actual: result.gross_simple[1],
        tolerance: 1e-15,
    })
}

/// Population mean 0.0005 and population std 0.01 must give `f* = 5`.
fn check_kelly_closed_form() -> Result<CheckOutcome> {
    let returns = two_point_returns(0.0005, 0.01, 50);
    let result = kelly::analyze(&returns, 0, 0.05, 0.5)?;
    let actual = match result.assessment {
        EdgeAssessment::Tradeable {
            optimal_fraction, ..
        } => optimal_fraction,
        EdgeAssessment::NonTradeable => f64::NAN,
    };
    Ok(CheckOutcome {
        name: "kelly_closed_form",
        expected: 5.0,
        actual,
        tolerance: 1e-6,
    })
}

fn check_growth_share_full_kelly() -> CheckOutcome {
    CheckOutcome {
        name: "growth_share_at_full_kelly",
        expected: 1.0,
        actual: kelly::growth_share(1.0),
        tolerance: 0.0,
    }
}

fn check_growth_share_double_kelly() -> CheckOutcome {
    CheckOutcome {
        name: "growth_share_at_double_kelly",
        expected: 0.0,
        actual: kelly::growth_share(2.0),
        tolerance: 0.0,
    }
}

fn check_ruin_certain_at_double_kelly() -> Result<CheckOutcome> {
    Ok(CheckOutcome {
        name: "ruin_certain_at_double_kelly",
        expected: 1.0,
        actual: kelly::ruin_probability(2.0, 0.5)?,
        tolerance: 0.0,
    })
}

/// Substituting the closed-form critical fraction back into the ruin
/// formula must reproduce the target probability.
fn check_critical_fraction_round_trip() -> Result<CheckOutcome> {
    let (mu, sigma, target, drawdown) = (0.0005, 0.01, 0.05, 0.5);
    let optimal = mu / (sigma * sigma);
    let actual = match kelly::critical_fraction(mu, sigma, target, drawdown)? {
        CriticalFraction::Feasible(f) => kelly::ruin_probability(f / optimal, drawdown)?,
        CriticalFraction::NoSafeFraction => f64::NAN,
    };
    Ok(CheckOutcome {
        name: "critical_fraction_round_trip",
        expected: target,
        actual,
        tolerance: 1e-9,
    })
}

/// A static book trades once on entry and never again; with positive cost
/// coefficients the post-entry cost series must be identically zero.
fn check_static_book_zero_cost() -> Result<CheckOutcome> {
    let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64) * 0.5).collect();
    let prices = [series("HLD", &closes)?];
    let targets = constant_weights(&["HLD"], 1.0, closes.len())?;
    let engine = ReturnEngine::new(CostParams::new(1.0, 0.05));
    let result = engine.run(&prices, &targets)?;
    let entry = result.warmup_end;
    let post_entry_cost: f64 = (entry + 1..closes.len())
        .map(|t| result.costs.total(t))
        .sum();
    Ok(CheckOutcome {
        name: "static_book_zero_cost_after_entry",
        expected: 0.0,
        actual: post_entry_cost,
        tolerance: 0.0,
    })
}

/// Terminal log-return moments of 200 seeded GBM paths must match
/// `(drift - vol^2/2)` and `vol` within two standard errors.
fn check_gbm_moments(seed: u64) -> Result<[CheckOutcome; 2]> {
    let (drift, vol) = (0.10, 0.20);
    let (n_paths, n_periods) = (200, 252);
    let params = GbmParams::new(drift, vol);
    let paths = generate_paths(&params, 100.0, n_paths, n_periods, seed)?;

    let terminal_logs: Vec<f64> = paths.iter().map(|p| (p[n_periods] / p[0]).ln()).collect();
    let mean_se = vol / (n_paths as f64).sqrt();
    let std_se = vol / (2.0 * n_paths as f64).sqrt();

    Ok([
        CheckOutcome {
            name: "gbm_terminal_log_mean",
            expected: drift - vol * vol / 2.0,
            actual: mean(&terminal_logs),
            tolerance: 2.0 * mean_se,
        },
        CheckOutcome {
            name: "gbm_terminal_log_std",
            expected: vol,
            actual: sample_std(&terminal_logs),
            tolerance: 2.0 * std_se,
        },
    ])
}

/// Run the full battery. Every outcome carries its expected and actual
/// values so a failure is diagnosable without re-running anything.
pub fn run_battery(seed: u64) -> Result<Vec<CheckOutcome>> {
    let mut outcomes = vec![
        check_deterministic_compounding()?,
        check_cross_sectional_aggregation()?,
        check_kelly_closed_form()?,
        check_growth_share_full_kelly(),
        check_growth_share_double_kelly(),
        check_ruin_certain_at_double_kelly()?,
        check_critical_fraction_round_trip()?,
        check_static_book_zero_cost()?,
    ];
    outcomes.extend(check_gbm_moments(seed)?);
    Ok(outcomes)
}
