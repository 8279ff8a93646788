//! GBM calibration from historical prices.
//!
//! Daily log-return mean and *sample* standard deviation, annualized with
//! the 252-day convention. The sample divisor here is deliberate and
//! distinct from the analyzer's population divisor.

use kellylab_core::domain::PriceSeries;
use kellylab_core::stats::{mean, sample_std};
use serde::{Deserialize, Serialize};

/// Trading periods per year.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Calibrated geometric-Brownian-motion parameters for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbmParams {
    /// Annualized drift: daily log-return mean x 252.
    pub drift_annual: f64,
    /// Annualized volatility: daily log-return sample std x sqrt(252).
    pub vol_annual: f64,
}

impl GbmParams {
    pub fn new(drift_annual: f64, vol_annual: f64) -> Self {
        Self {
            drift_annual,
            vol_annual,
        }
    }

    /// Calibrate from a price history. The placeholder zero at return row 0
    /// is excluded from the estimate.
    pub fn calibrate(series: &PriceSeries) -> Self {
        let log_returns = series.log_returns();
        let observed = &log_returns[1.min(log_returns.len())..];
        Self {
            drift_annual: mean(observed) * PERIODS_PER_YEAR,
            vol_annual: sample_std(observed) * PERIODS_PER_YEAR.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn calibration_recovers_constant_growth() {
        // 1% per day, zero variance.
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let series = PriceSeries::from_closes("X", start, &closes).unwrap();
        let params = GbmParams::calibrate(&series);
        assert!((params.drift_annual - 1.01_f64.ln() * 252.0).abs() < 1e-9);
        assert!(params.vol_annual.abs() < 1e-9);
    }

    #[test]
    fn calibration_uses_sample_divisor() {
        // Alternating +1%/-1% log returns around zero.
        let mut closes = vec![100.0];
        for i in 0..40 {
            let r: f64 = if i % 2 == 0 { 0.01 } else { -0.01 };
            closes.push(closes.last().unwrap() * r.exp());
        }
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let series = PriceSeries::from_closes("X", start, &closes).unwrap();
        let params = GbmParams::calibrate(&series);
        let expected_daily = kellylab_core::stats::sample_std(
            &(0..40)
                .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
                .collect::<Vec<f64>>(),
        );
        assert!((params.vol_annual - expected_daily * 252.0_f64.sqrt()).abs() < 1e-12);
    }
}
