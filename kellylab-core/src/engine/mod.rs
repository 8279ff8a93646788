//! Vectorized return-aggregation engine.
//!
//! The pipeline runs in a fixed order: shift targets into executed weights,
//! compute per-instrument simple returns, aggregate cross-sectionally on
//! *simple* returns, convert the portfolio return to log form, subtract
//! costs, compound into an equity curve anchored at 1.0 on the first traded
//! period. A weighted sum of log returns is not the log of the weighted sum,
//! so the aggregation convention is load-bearing, not stylistic.

mod costs;

pub use costs::{compute_costs, CostParams, CostSeries, VOL_WINDOW};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ExecutedWeights, PriceSeries, TargetWeights, WeightError};
use crate::strategy::{Strategy, StrategyError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no instruments supplied")]
    EmptyUniverse,

    #[error("price history for {symbol} has {len} rows, expected {expected}")]
    LengthMismatch {
        symbol: String,
        len: usize,
        expected: usize,
    },

    #[error("price histories are date-misaligned: {symbol} differs at row {row}")]
    DateMisaligned { symbol: String, row: usize },

    #[error("target weights have {found} rows, expected {expected}")]
    WeightRowMismatch { found: usize, expected: usize },

    #[error("target weight columns {found:?} do not match instruments {expected:?}")]
    SymbolMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("strategy output invalid: {0}")]
    StrategyOutput(#[from] WeightError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("portfolio simple return at row {row} is {value}, cannot take log of a wiped-out portfolio")]
    NonFiniteReturn { row: usize, value: f64 },
}

/// Immutable output bundle of one engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Gross portfolio simple return per period: `sum_i w_i * R_i`.
    pub gross_simple: Vec<f64>,
    /// Gross portfolio log return per period: `ln(1 + gross_simple)`.
    pub gross_log: Vec<f64>,
    /// Net portfolio log return per period: gross log minus both costs.
    pub net: Vec<f64>,
    /// The shifted weight matrix actually held each period.
    pub executed: ExecutedWeights,
    /// Impact and per-unit cost series.
    pub costs: CostSeries,
    /// Cumulative value curve, 1.0 at `warmup_end`.
    pub equity: Vec<f64>,
    /// First period with any non-zero executed position.
    pub warmup_end: usize,
}

impl BacktestResult {
    /// Net log returns from the warm-up boundary on — the slice the Kelly
    /// analyzer is allowed to see.
    pub fn traded_net(&self) -> &[f64] {
        &self.net[self.warmup_end.min(self.net.len())..]
    }
}

/// The return engine. Stateless apart from its cost coefficients; every
/// call to [`ReturnEngine::run`] is an independent, pure transformation.
#[derive(Debug, Clone)]
pub struct ReturnEngine {
    cost: CostParams,
}

impl ReturnEngine {
    pub fn new(cost: CostParams) -> Self {
        Self { cost }
    }

    pub fn frictionless() -> Self {
        Self::new(CostParams::frictionless())
    }

    pub fn cost_params(&self) -> &CostParams {
        &self.cost
    }

    /// Invoke the strategy on the (immutable) price histories, then run.
    pub fn run_strategy(
        &self,
        prices: &[PriceSeries],
        strategy: &dyn Strategy,
    ) -> Result<BacktestResult, EngineError> {
        let targets = strategy.target_weights(prices)?;
        self.run(prices, &targets)
    }

    /// Run the full pipeline on pre-computed target weights.
    pub fn run(
        &self,
        prices: &[PriceSeries],
        targets: &TargetWeights,
    ) -> Result<BacktestResult, EngineError> {
        let n = validate_shapes(prices, targets)?;

        let executed = ExecutedWeights::from_targets(targets)?;
        let warmup_end = executed.warmup_end();

        let instrument_returns: Vec<Vec<f64>> =
            prices.iter().map(|p| p.simple_returns()).collect();

        // Cross-sectional aggregation happens on simple returns.
        let mut gross_simple = vec![0.0; n];
        for t in 0..n {
            let mut acc = 0.0;
            for (col, returns) in instrument_returns.iter().enumerate() {
                acc += executed.weight(t, col) * returns[t];
            }
            gross_simple[t] = acc;
        }

        // Log form is adopted only after aggregation, for additive
        // compounding over time.
        let mut gross_log = vec![0.0; n];
        for t in 0..n {
            if gross_simple[t] <= -1.0 {
                return Err(EngineError::NonFiniteReturn {
                    row: t,
                    value: gross_simple[t],
                });
            }
            gross_log[t] = (1.0 + gross_simple[t]).ln();
        }

        let costs = compute_costs(prices, &executed, &self.cost);
        let net: Vec<f64> = (0..n).map(|t| gross_log[t] - costs.total(t)).collect();

        let equity = equity_curve(&net, warmup_end);

        Ok(BacktestResult {
            gross_simple,
            gross_log,
            net,
            executed,
            costs,
            equity,
            warmup_end,
        })
    }
}

/// Exponential of the cumulative net log return, renormalized so the curve
/// sits at exactly 1.0 until trading begins and compounds from `warmup_end`
/// (inclusive — the entry cost on the first traded period counts).
///
/// Net returns before `warmup_end` are structurally zero (no positions, no
/// weight changes), so the renormalization base is the cumulative sum just
/// before the first traded period.
fn equity_curve(net: &[f64], warmup_end: usize) -> Vec<f64> {
    let mut cum = Vec::with_capacity(net.len());
    let mut acc = 0.0;
    for &r in net {
        acc += r;
        cum.push(acc);
    }
    let base = match warmup_end {
        0 => 0.0,
        w if w <= cum.len() => cum[w - 1],
        _ => acc,
    };
    cum.into_iter().map(|c| (c - base).exp()).collect()
}

fn validate_shapes(
    prices: &[PriceSeries],
    targets: &TargetWeights,
) -> Result<usize, EngineError> {
    let first = prices.first().ok_or(EngineError::EmptyUniverse)?;
    let n = first.len();

    for series in &prices[1..] {
        if series.len() != n {
            return Err(EngineError::LengthMismatch {
                symbol: series.symbol().to_string(),
                len: series.len(),
                expected: n,
            });
        }
        for row in 0..n {
            if series.bars()[row].date != first.bars()[row].date {
                return Err(EngineError::DateMisaligned {
                    symbol: series.symbol().to_string(),
                    row,
                });
            }
        }
    }

    if targets.n_rows() != n {
        return Err(EngineError::WeightRowMismatch {
            found: targets.n_rows(),
            expected: n,
        });
    }

    let price_symbols: Vec<String> = prices.iter().map(|p| p.symbol().to_string()).collect();
    if targets.symbols() != price_symbols.as_slice() {
        return Err(EngineError::SymbolMismatch {
            found: targets.symbols().to_vec(),
            expected: price_symbols,
        });
    }

    Ok(n)
}
