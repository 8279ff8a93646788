//! KellyLab Runner — Monte-Carlo orchestration over the core engine.
//!
//! Calibrates a GBM price model from history, generates seeded synthetic
//! paths, re-runs the return engine per path to estimate an empirical ruin
//! rate at the historical half-Kelly leverage, and carries the known-answer
//! verification battery that certifies the whole pipeline.

pub mod calibrate;
pub mod config;
pub mod paths;
pub mod simulate;
pub mod verify;

pub use calibrate::GbmParams;
pub use config::SimConfig;
pub use paths::{generate_paths, instrument_seed, SimulationError};
pub use simulate::{run_simulation, SimulationResult};
pub use verify::{run_battery, CheckOutcome};
