//! Target and executed weight matrices.
//!
//! `TargetWeights` holds what a strategy *wants* to hold as of each close;
//! `ExecutedWeights` is that matrix shifted forward one period, which is the
//! only place temporal alignment happens anywhere in the system. A weight
//! the strategy could not yet produce is `None` — an explicit warm-up
//! state, never a NaN sentinel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeightError {
    #[error("weight row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("strategy produced a NaN weight for {symbol} at row {row}")]
    NanWeight { symbol: String, row: usize },

    #[error(
        "strategy produced an undefined weight for {symbol} at row {row}, \
         after already emitting a defined weight (undefined entries must be \
         a leading warm-up prefix)"
    )]
    UndefinedAfterSignal { symbol: String, row: usize },
}

/// Intended portfolio weights, one column per instrument, one row per period.
///
/// `None` cells are the strategy's declared warm-up: periods where it does
/// not yet have enough history to produce a signal. They must form a
/// leading prefix per column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetWeights {
    symbols: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl TargetWeights {
    pub fn new(symbols: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self, WeightError> {
        let n_cols = symbols.len();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != n_cols {
                return Err(WeightError::RaggedRow {
                    row,
                    found: cells.len(),
                    expected: n_cols,
                });
            }
        }
        Ok(Self { symbols, rows })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.symbols.len()
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }
}

/// Executed portfolio weights: the target matrix delayed by exactly one
/// period, with warm-up cells resolved to zero exposure.
///
/// Invariant: `executed[t]` depends only on `target[t-1]`. Nothing else in
/// the engine is allowed to look at weights without having passed through
/// this constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedWeights {
    symbols: Vec<String>,
    rows: Vec<Vec<f64>>,
    warmup_end: usize,
}

impl ExecutedWeights {
    /// Shift targets forward one period and resolve warm-up cells to 0.0.
    ///
    /// Validates the strategy's output while shifting: a NaN weight, or an
    /// undefined weight appearing after the column has already produced a
    /// signal, is a strategy bug and fails loudly here instead of flowing
    /// into the return arithmetic as a corrupted value.
    pub fn from_targets(targets: &TargetWeights) -> Result<Self, WeightError> {
        let n_rows = targets.n_rows();
        let n_cols = targets.n_cols();

        for (col, symbol) in targets.symbols().iter().enumerate() {
            let mut signal_seen = false;
            for (row, cells) in targets.rows().iter().enumerate() {
                match cells[col] {
                    Some(w) if w.is_nan() => {
                        return Err(WeightError::NanWeight {
                            symbol: symbol.clone(),
                            row,
                        })
                    }
                    Some(_) => signal_seen = true,
                    None if signal_seen => {
                        return Err(WeightError::UndefinedAfterSignal {
                            symbol: symbol.clone(),
                            row,
                        })
                    }
                    None => {}
                }
            }
        }

        let mut rows = vec![vec![0.0; n_cols]; n_rows];
        for t in 1..n_rows {
            for col in 0..n_cols {
                rows[t][col] = targets.rows()[t - 1][col].unwrap_or(0.0);
            }
        }

        let warmup_end = rows
            .iter()
            .position(|row| row.iter().any(|&w| w != 0.0))
            .unwrap_or(n_rows);

        Ok(Self {
            symbols: targets.symbols().to_vec(),
            rows,
            warmup_end,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.symbols.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Weight change for one instrument between consecutive periods.
    /// Row 0 changes from a flat (all-zero) book.
    pub fn delta(&self, row: usize, col: usize) -> f64 {
        if row == 0 {
            self.rows[0][col]
        } else {
            self.rows[row][col] - self.rows[row - 1][col]
        }
    }

    /// First row with any non-zero executed weight; equals `n_rows` when
    /// the strategy never takes a position.
    pub fn warmup_end(&self) -> usize {
        self.warmup_end
    }
}
