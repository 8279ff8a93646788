//! Transaction-cost model: market-impact proxy plus per-unit cost.
//!
//! Both components are expressed in the same fractional units as returns so
//! the engine can subtract them from the portfolio log return directly.
//! Both are zero wherever the executed weight does not change.

use serde::{Deserialize, Serialize};

use crate::domain::{ExecutedWeights, PriceSeries};
use crate::stats::trailing_std;

/// Trailing window, in periods, for the volatility used by the impact term.
pub const VOL_WINDOW: usize = 20;

/// Cost coefficients for one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    /// Market-impact proxy coefficient `k`: cost per unit of traded weight
    /// per unit of trailing volatility.
    pub impact_coeff: f64,
    /// Absolute cost per share, converted to a fraction by dividing by the
    /// period's close.
    pub per_unit_cost: f64,
}

impl CostParams {
    pub fn new(impact_coeff: f64, per_unit_cost: f64) -> Self {
        Self {
            impact_coeff,
            per_unit_cost,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn is_frictionless(&self) -> bool {
        self.impact_coeff == 0.0 && self.per_unit_cost == 0.0
    }
}

/// Per-period portfolio-level cost pair, summed across instruments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSeries {
    /// Volatility-proportional impact cost: `k * vol20 * |dw|`.
    pub slippage: Vec<f64>,
    /// Per-unit cost: `(per_unit / close) * |dw|`.
    pub unit: Vec<f64>,
}

impl CostSeries {
    pub fn zeros(len: usize) -> Self {
        Self {
            slippage: vec![0.0; len],
            unit: vec![0.0; len],
        }
    }

    /// Combined cost for one period.
    pub fn total(&self, row: usize) -> f64 {
        self.slippage[row] + self.unit[row]
    }
}

/// Compute both cost series for an executed-weight matrix.
///
/// For instrument `i` at period `t`:
/// - impact: `k * trailing_std(log returns, 20) * |dw[t,i]|`, where the
///   volatility window expands from 2 observations at the start of history
///   and is 0 below that;
/// - unit: `(per_unit_cost / close[t,i]) * |dw[t,i]|`.
///
/// The caller guarantees `prices` and `executed` are row-aligned; the
/// engine validates shapes before calling in here.
pub fn compute_costs(
    prices: &[PriceSeries],
    executed: &ExecutedWeights,
    params: &CostParams,
) -> CostSeries {
    let n_rows = executed.n_rows();
    let mut out = CostSeries::zeros(n_rows);
    if params.is_frictionless() {
        return out;
    }

    let log_returns: Vec<Vec<f64>> = prices.iter().map(|p| p.log_returns()).collect();

    for t in 0..n_rows {
        for (col, series) in prices.iter().enumerate() {
            let dw = executed.delta(t, col).abs();
            if dw == 0.0 {
                continue;
            }
            // Row 0 of log_returns is the defined-as-zero placeholder; the
            // trailing window only ever sees real observations from row 1 on.
            let vol = if t >= 1 {
                trailing_std(&log_returns[col][1..], t - 1, VOL_WINDOW)
            } else {
                0.0
            };
            out.slippage[t] += params.impact_coeff * vol * dw;
            out.unit[t] += (params.per_unit_cost / series.close(t)) * dw;
        }
    }
    out
}
