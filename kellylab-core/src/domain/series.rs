//! PriceSeries — an immutable, validated, date-ordered series of bars.
//!
//! Every consumer receives this by shared reference; there is no mutating
//! API, so "operate on a private copy" (the source system's defensive-copy
//! rule) is enforced by the borrow checker instead of by cloning.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("price series for {symbol} is empty")]
    Empty { symbol: String },

    #[error("price series for {symbol} has non-increasing dates at row {row}")]
    UnorderedDates { symbol: String, row: usize },

    #[error("price series for {symbol} has an invalid bar at row {row} ({date})")]
    InsaneBar {
        symbol: String,
        row: usize,
        date: NaiveDate,
    },

    #[error("bar at row {row} carries symbol {found}, expected {expected}")]
    MixedSymbols {
        expected: String,
        found: String,
        row: usize,
    },
}

/// Validated price history for a single instrument.
///
/// Invariants, checked once at construction and never re-checked:
/// - non-empty
/// - strictly increasing date index
/// - every bar passes [`Bar::is_sane`] (in particular `close > 0`)
/// - every bar carries the same symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, DataError> {
        let symbol = match bars.first() {
            Some(bar) => bar.symbol.clone(),
            None => {
                return Err(DataError::Empty {
                    symbol: "<unknown>".into(),
                })
            }
        };
        for (row, bar) in bars.iter().enumerate() {
            if bar.symbol != symbol {
                return Err(DataError::MixedSymbols {
                    expected: symbol,
                    found: bar.symbol.clone(),
                    row,
                });
            }
            if !bar.is_sane() {
                return Err(DataError::InsaneBar {
                    symbol,
                    row,
                    date: bar.date,
                });
            }
            if row > 0 && bars[row - 1].date >= bar.date {
                return Err(DataError::UnorderedDates { symbol, row });
            }
        }
        Ok(Self { symbol, bars })
    }

    /// Build a series from close prices alone, on a synthetic daily calendar.
    ///
    /// Used by the Monte-Carlo simulator to lift generated paths back into
    /// the engine's input type.
    pub fn from_closes(
        symbol: &str,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, DataError> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar::flat(symbol, start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn close(&self, row: usize) -> f64 {
        self.bars[row].close
    }

    /// Per-period simple returns: `close[t] / close[t-1] - 1`.
    ///
    /// Index 0 has no prior close and is defined as 0.0, so the output is
    /// the same length as the series and row-aligned with it.
    pub fn simple_returns(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.bars.len()];
        for t in 1..self.bars.len() {
            out[t] = self.bars[t].close / self.bars[t - 1].close - 1.0;
        }
        out
    }

    /// Per-period log returns: `ln(close[t] / close[t-1])`, index 0 = 0.0.
    pub fn log_returns(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.bars.len()];
        for t in 1..self.bars.len() {
            out[t] = (self.bars[t].close / self.bars[t - 1].close).ln();
        }
        out
    }
}
