//! KellyLab Core — return engine, cost model, Kelly/ruin analyzer.
//!
//! The computational core of a single-portfolio backtester:
//! - Domain types (bars, validated price series, target/executed weights)
//! - Vectorized return engine with a hard one-period execution delay
//! - Transaction-cost model (volatility-scaled impact + per-unit cost)
//! - Kelly-criterion analyzer with a closed-form ruin inversion
//!
//! Every operation is a pure, synchronous transformation over in-memory
//! arrays; all result records are immutable once constructed.

pub mod domain;
pub mod engine;
pub mod kelly;
pub mod stats;
pub mod strategy;
