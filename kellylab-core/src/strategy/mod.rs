//! Strategy seam: turn price history into intended target weights.
//!
//! Strategies produce *intentions* as of each close; the engine applies the
//! one-period execution delay. A strategy must never shift its own output —
//! that contract is the whole point of the seam.

use thiserror::Error;

use crate::domain::{PriceSeries, TargetWeights, WeightError};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy {name} requires {required} rows of history, got {got}")]
    InsufficientHistory {
        name: String,
        required: usize,
        got: usize,
    },

    #[error(transparent)]
    Weights(#[from] WeightError),
}

/// Capability interface for weight-producing strategies.
///
/// Two operations: produce target weights, and declare how many leading
/// periods of history are needed before a signal is defined. The engine
/// never branches on a concrete strategy type.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Number of leading periods with no defined signal.
    fn warmup_len(&self) -> usize;

    /// Produce the full target-weight matrix, one row per price row.
    /// Rows inside the warm-up must be `None`, never zero-filled — the
    /// shift step resolves them deterministically.
    fn target_weights(&self, prices: &[PriceSeries]) -> Result<TargetWeights, StrategyError>;
}

/// Equal-weight long exposure on every instrument from the first period.
#[derive(Debug, Clone, Default)]
pub struct BuyAndHold;

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn warmup_len(&self) -> usize {
        0
    }

    fn target_weights(&self, prices: &[PriceSeries]) -> Result<TargetWeights, StrategyError> {
        let symbols: Vec<String> = prices.iter().map(|p| p.symbol().to_string()).collect();
        let n_rows = prices.first().map_or(0, |p| p.len());
        let weight = 1.0 / symbols.len().max(1) as f64;
        let rows = vec![vec![Some(weight); symbols.len()]; n_rows];
        Ok(TargetWeights::new(symbols, rows)?)
    }
}

/// Long an instrument (equal weight) while its close sits above its
/// `period`-bar simple moving average, flat otherwise.
#[derive(Debug, Clone)]
pub struct MaMomentum {
    period: usize,
}

impl MaMomentum {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "period must be >= 2");
        Self { period }
    }
}

impl Strategy for MaMomentum {
    fn name(&self) -> &str {
        "ma_momentum"
    }

    fn warmup_len(&self) -> usize {
        self.period - 1
    }

    fn target_weights(&self, prices: &[PriceSeries]) -> Result<TargetWeights, StrategyError> {
        let symbols: Vec<String> = prices.iter().map(|p| p.symbol().to_string()).collect();
        let n_rows = prices.first().map_or(0, |p| p.len());
        if n_rows < self.period {
            return Err(StrategyError::InsufficientHistory {
                name: self.name().to_string(),
                required: self.period,
                got: n_rows,
            });
        }

        let weight = 1.0 / symbols.len().max(1) as f64;
        let mut rows = vec![vec![None; symbols.len()]; n_rows];
        for (col, series) in prices.iter().enumerate() {
            let mut window_sum: f64 = series.bars()[..self.period - 1]
                .iter()
                .map(|b| b.close)
                .sum();
            for t in (self.period - 1)..n_rows {
                window_sum += series.close(t);
                let sma = window_sum / self.period as f64;
                rows[t][col] = Some(if series.close(t) > sma { weight } else { 0.0 });
                window_sum -= series.close(t + 1 - self.period);
            }
        }
        Ok(TargetWeights::new(symbols, rows)?)
    }
}
