//! Kelly-criterion and ruin-probability analyzer.
//!
//! Works on the net log-return series from the warm-up boundary onward.
//! Edge and volatility use the *population* convention (divisor N): the
//! continuous-time growth formula below is derived under population
//! parameters, and a sample correction would bias the optimal fraction
//! downward on short histories.
//!
//! With edge `mu` and variance `sigma^2`:
//! - growth-optimal fraction `f* = mu / sigma^2`
//! - growth rate `g(f) = mu*f - sigma^2 * f^2 / 2`
//! - at `alpha = f / f*`, growth relative to the optimum is `2*alpha - alpha^2`
//! - probability of hitting drawdown `D` before indefinite growth is
//!   `D^(2/alpha - 1)`, with certain ruin at `alpha >= 2`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::{mean, population_std};

/// Minimum post-warm-up observations before an estimate is reportable.
pub const MIN_OBSERVATIONS: usize = 30;

/// Reference multiples of `f*` tabulated in the frontier.
pub const FRONTIER_MULTIPLES: [f64; 6] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0];

/// Back-substitution tolerance for the closed-form critical fraction.
const INVERSION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum KellyError {
    #[error("need at least {min} post-warm-up observations for Kelly estimation, got {got}")]
    InsufficientData { got: usize, min: usize },

    #[error("net return series has zero variance; Kelly fraction is undefined")]
    ZeroVariance,

    #[error("{name} must lie strictly inside (0, 1), got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
}

fn require_unit_interval(name: &'static str, value: f64) -> Result<(), KellyError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(KellyError::InvalidProbability { name, value })
    }
}

/// One row of the risk/return frontier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierRow {
    /// Multiple of the optimal fraction.
    pub alpha: f64,
    /// Absolute leverage fraction `alpha * f*`.
    pub fraction: f64,
    /// Growth rate as a share of the maximum: `2*alpha - alpha^2`.
    pub growth_share: f64,
    /// Probability of hitting the drawdown threshold at this leverage.
    pub ruin_probability: f64,
}

/// Whether any leverage fraction achieves the target ruin probability.
///
/// An expected, recoverable outcome the caller must branch on — not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CriticalFraction {
    /// The largest fraction whose ruin probability equals the target.
    Feasible(f64),
    /// No fraction below certain-ruin meets the target.
    NoSafeFraction,
}

/// Tradeability of the estimated edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EdgeAssessment {
    /// `f* <= 0`: there is nothing to lever. Frontier intentionally empty.
    NonTradeable,
    Tradeable {
        /// Growth-optimal fraction `f* = mu / sigma^2`.
        optimal_fraction: f64,
        /// Half-Kelly, the conventional practical operating point.
        half_fraction: f64,
        /// Largest fraction meeting the configured ruin target.
        critical_fraction: CriticalFraction,
        /// Ordered risk/return table at [`FRONTIER_MULTIPLES`].
        frontier: Vec<FrontierRow>,
    },
}

/// Output of one analyzer invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyResult {
    /// Per-period edge estimate (arithmetic mean, population convention).
    pub edge: f64,
    /// Per-period volatility estimate (population standard deviation).
    pub volatility: f64,
    /// Drawdown threshold the ruin numbers refer to.
    pub drawdown: f64,
    /// Target ruin probability used for the critical fraction.
    pub ruin_target: f64,
    pub assessment: EdgeAssessment,
}

/// Growth rate at leverage fraction `f`: `mu*f - sigma^2 * f^2 / 2`.
pub fn growth_rate(edge: f64, volatility: f64, fraction: f64) -> f64 {
    edge * fraction - volatility * volatility * fraction * fraction / 2.0
}

/// Growth rate relative to the optimum at multiple `alpha` of `f*`.
pub fn growth_share(alpha: f64) -> f64 {
    2.0 * alpha - alpha * alpha
}

/// Probability of hitting drawdown `drawdown` before indefinite growth,
/// at multiple `alpha` of the optimal fraction: `drawdown^(2/alpha - 1)`.
///
/// Domain guards: `alpha <= 0` never trades (ruin 0); `alpha >= 2` has
/// non-positive growth rate (ruin certain). A drawdown outside (0, 1) is
/// a caller error, not a formula input.
pub fn ruin_probability(alpha: f64, drawdown: f64) -> Result<f64, KellyError> {
    require_unit_interval("drawdown", drawdown)?;
    if alpha <= 0.0 {
        return Ok(0.0);
    }
    if alpha >= 2.0 {
        return Ok(1.0);
    }
    Ok(drawdown.powf(2.0 / alpha - 1.0))
}

/// Closed-form inversion of the ruin formula: the largest fraction whose
/// ruin probability equals `ruin_target`.
///
/// `f_crit = 2*mu / (sigma^2 * (ln(P)/ln(D) + 1))`. No iterative search.
/// Only meaningful for a positive edge; callers reach this through
/// [`analyze`], which has already ruled out `f* <= 0`.
pub fn critical_fraction(
    edge: f64,
    volatility: f64,
    ruin_target: f64,
    drawdown: f64,
) -> Result<CriticalFraction, KellyError> {
    require_unit_interval("ruin target", ruin_target)?;
    require_unit_interval("drawdown", drawdown)?;

    let optimal = edge / (volatility * volatility);
    let ratio = ruin_target.ln() / drawdown.ln();
    let f_crit = 2.0 * edge / (volatility * volatility * (ratio + 1.0));

    if f_crit >= 2.0 * optimal {
        return Ok(CriticalFraction::NoSafeFraction);
    }

    // Substitute back into the ruin formula; disagreement here means the
    // inversion algebra is wrong, which must never ship. Active in every
    // build profile.
    let check = ruin_probability(f_crit / optimal, drawdown)?;
    assert!(
        (check - ruin_target).abs() < INVERSION_TOLERANCE,
        "critical-fraction inversion drifted: {check} vs {ruin_target}"
    );

    Ok(CriticalFraction::Feasible(f_crit))
}

/// Analyze a net return series from `warmup_end` onward.
pub fn analyze(
    net_returns: &[f64],
    warmup_end: usize,
    ruin_target: f64,
    drawdown: f64,
) -> Result<KellyResult, KellyError> {
    require_unit_interval("ruin target", ruin_target)?;
    require_unit_interval("drawdown", drawdown)?;

    let slice = &net_returns[warmup_end.min(net_returns.len())..];
    if slice.len() < MIN_OBSERVATIONS {
        return Err(KellyError::InsufficientData {
            got: slice.len(),
            min: MIN_OBSERVATIONS,
        });
    }

    let edge = mean(slice);
    let volatility = population_std(slice);
    if volatility <= 0.0 {
        return Err(KellyError::ZeroVariance);
    }

    let optimal = edge / (volatility * volatility);
    let assessment = if optimal <= 0.0 {
        EdgeAssessment::NonTradeable
    } else {
        let frontier = FRONTIER_MULTIPLES
            .iter()
            .map(|&alpha| {
                Ok(FrontierRow {
                    alpha,
                    fraction: alpha * optimal,
                    growth_share: growth_share(alpha),
                    ruin_probability: ruin_probability(alpha, drawdown)?,
                })
            })
            .collect::<Result<Vec<_>, KellyError>>()?;
        EdgeAssessment::Tradeable {
            optimal_fraction: optimal,
            half_fraction: optimal / 2.0,
            critical_fraction: critical_fraction(edge, volatility, ruin_target, drawdown)?,
            frontier,
        }
    };

    Ok(KellyResult {
        edge,
        volatility,
        drawdown,
        ruin_target,
        assessment,
    })
}
