//! Small numeric helpers shared by the engine, cost model, and analyzer.
//!
//! Population vs. sample standard deviation is not interchangeable here:
//! the Kelly analyzer requires the population convention (divisor N) and
//! GBM calibration requires the sample convention (divisor N-1). Both are
//! exported under explicit names so call sites say which one they mean.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor N). 0.0 for fewer than 1 value.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Sample standard deviation (divisor N-1). 0.0 for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Sample standard deviation of the trailing `window` values ending at
/// `end` (inclusive), expanding from the start of the slice.
///
/// Defined as 0.0 when fewer than 2 observations are available.
pub fn trailing_std(values: &[f64], end: usize, window: usize) -> f64 {
    let stop = end + 1;
    let start = stop.saturating_sub(window);
    let slice = &values[start..stop];
    if slice.len() < 2 {
        return 0.0;
    }
    sample_std(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_vs_sample_divisor() {
        let v = [1.0, 2.0, 3.0, 4.0];
        // var_pop = 1.25, var_sample = 5/3
        assert!((population_std(&v) - 1.25_f64.sqrt()).abs() < 1e-12);
        assert!((sample_std(&v) - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
        assert_eq!(sample_std(&[7.0]), 0.0);
        assert_eq!(trailing_std(&[7.0], 0, 20), 0.0);
    }

    #[test]
    fn trailing_std_expands_then_rolls() {
        let v = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        // At end=1 the window holds 2 values.
        assert!(trailing_std(&v, 1, 3) > 0.0);
        // Rolling window of 3 over an alternating series is constant.
        let a = trailing_std(&v, 3, 3);
        let b = trailing_std(&v, 5, 3);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn constant_series_has_zero_std() {
        let v = [3.0; 25];
        assert_eq!(population_std(&v), 0.0);
        assert_eq!(trailing_std(&v, 24, 20), 0.0);
    }
}
