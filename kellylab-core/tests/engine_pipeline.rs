//! End-to-end pipeline tests: strategy -> engine -> analyzer.

use chrono::NaiveDate;
use kellylab_core::domain::PriceSeries;
use kellylab_core::engine::{CostParams, ReturnEngine};
use kellylab_core::kelly::{self, EdgeAssessment, KellyError};
use kellylab_core::strategy::{BuyAndHold, MaMomentum, Strategy};

/// Upward-drifting walk with deterministic LCG noise.
fn make_drifting_walk(n: usize) -> Vec<f64> {
    let mut closes = Vec::with_capacity(n);
    let mut price = 100.0;
    for i in 0..n {
        let seed = (i as u64)
            .wrapping_mul(2862933555777941757)
            .wrapping_add(3037000493);
        let noise = ((seed >> 32) % 1000) as f64 / 1000.0 - 0.5; // [-0.5, 0.5)
        price *= (0.003 + noise * 0.02).exp();
        closes.push(price);
    }
    closes
}

fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    PriceSeries::from_closes(symbol, start, closes).unwrap()
}

#[test]
fn buy_and_hold_full_pipeline_produces_tradeable_kelly() {
    let prices = [series("DRIFT", &make_drifting_walk(150))];
    let result = ReturnEngine::frictionless()
        .run_strategy(&prices, &BuyAndHold)
        .unwrap();

    assert_eq!(result.warmup_end, 1);
    assert_eq!(result.net.len(), 150);

    let analysis = kelly::analyze(&result.net, result.warmup_end, 0.05, 0.5).unwrap();
    assert!(analysis.edge > 0.0, "drifting walk should show positive edge");
    match analysis.assessment {
        EdgeAssessment::Tradeable {
            optimal_fraction,
            half_fraction,
            ref frontier,
            ..
        } => {
            assert!(optimal_fraction > 0.0);
            assert!((half_fraction - optimal_fraction / 2.0).abs() < 1e-12);
            assert_eq!(frontier.len(), kelly::FRONTIER_MULTIPLES.len());
        }
        EdgeAssessment::NonTradeable => panic!("expected tradeable edge"),
    }
}

#[test]
fn costs_strictly_reduce_net_performance() {
    let prices = [series("DRIFT", &make_drifting_walk(200))];
    let strategy = MaMomentum::new(10);

    let frictionless = ReturnEngine::frictionless()
        .run_strategy(&prices, &strategy)
        .unwrap();
    let costly = ReturnEngine::new(CostParams::new(0.5, 0.05))
        .run_strategy(&prices, &strategy)
        .unwrap();

    // Same gross series, strictly lower net wherever a trade occurred.
    assert_eq!(frictionless.gross_log, costly.gross_log);
    let mut traded_rows = 0;
    for t in 0..costly.net.len() {
        let trade = (0..costly.executed.n_cols()).any(|c| costly.executed.delta(t, c) != 0.0);
        if trade {
            traded_rows += 1;
            assert!(costly.costs.total(t) > 0.0);
            assert!(costly.net[t] < costly.gross_log[t]);
        } else {
            assert_eq!(costly.costs.total(t), 0.0);
            assert_eq!(costly.net[t], costly.gross_log[t]);
        }
    }
    assert!(traded_rows > 1, "momentum over a noisy walk must trade");
    assert!(costly.equity.last().unwrap() < frictionless.equity.last().unwrap());
}

#[test]
fn momentum_warmup_flows_through_to_result() {
    let prices = [series("DRIFT", &make_drifting_walk(100))];
    let strategy = MaMomentum::new(20);
    let result = ReturnEngine::frictionless()
        .run_strategy(&prices, &strategy)
        .unwrap();
    // First executable signal row is warmup_len, shifted by one period.
    assert!(result.warmup_end > strategy.warmup_len());
    for t in 0..result.warmup_end {
        assert_eq!(result.gross_simple[t], 0.0);
        assert_eq!(result.equity[t], 1.0);
    }
}

#[test]
fn short_history_fails_kelly_not_engine() {
    let prices = [series("DRIFT", &make_drifting_walk(20))];
    let result = ReturnEngine::frictionless()
        .run_strategy(&prices, &BuyAndHold)
        .unwrap();
    let err = kelly::analyze(&result.net, result.warmup_end, 0.05, 0.5);
    assert!(matches!(err, Err(KellyError::InsufficientData { .. })));
}

#[test]
fn two_instrument_portfolio_aggregates_on_simple_returns() {
    // One instrument up 5%, one down 5% on the same period, equal weight:
    // the portfolio must be flat through that period, not slightly down.
    let up = series("UP", &[100.0, 100.0, 105.0]);
    let down = series("DN", &[100.0, 100.0, 95.0]);
    let result = ReturnEngine::frictionless()
        .run_strategy(&[up, down], &BuyAndHold)
        .unwrap();
    assert_eq!(result.gross_simple[2], 0.0);
    assert_eq!(result.gross_log[2], 0.0);
    assert!((result.equity[2] - 1.0).abs() < 1e-15);
}
