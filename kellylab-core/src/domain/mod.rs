//! Domain types: bars, price series, weight matrices.

mod bar;
mod series;
mod weights;

pub use bar::Bar;
pub use series::{DataError, PriceSeries};
pub use weights::{ExecutedWeights, TargetWeights, WeightError};
