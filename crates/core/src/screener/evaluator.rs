use crate::domain::metrics::RawMetrics;
use crate::domain::verdict::{Criterion, EvaluationVerdict};

const MIN_RSI: f64 = 50.0;
const MIN_RELATIVE_VOLUME: f64 = 1.5;
/// Price must be within 5% of the recent high.
const NEAR_HIGH_RATIO: f64 = 0.95;

/// Evaluates the four criteria independently. Total: every input, including zero or
/// negative values, yields a verdict.
pub fn evaluate(metrics: &RawMetrics) -> EvaluationVerdict {
    // Price above the 200-day MA is implied by the two comparisons; it is not a
    // separate check.
    let trend = metrics.price > metrics.fifty_day_ma
        && metrics.fifty_day_ma > metrics.two_hundred_day_ma;

    // MACD is informational only.
    let momentum = metrics.rsi > MIN_RSI;

    let volume_sufficient = metrics.relative_volume() > MIN_RELATIVE_VOLUME;

    let price_action = metrics.price >= metrics.recent_high * NEAR_HIGH_RATIO;

    let results = [trend, momentum, volume_sufficient, price_action];
    let fails: Vec<Criterion> = Criterion::ALL
        .iter()
        .zip(results)
        .filter(|(_, passed)| !passed)
        .map(|(criterion, _)| *criterion)
        .collect();
    let score = results.iter().filter(|passed| **passed).count() as u8;

    EvaluationVerdict {
        trend,
        momentum,
        volume_sufficient,
        price_action,
        score,
        fails,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong() -> RawMetrics {
        RawMetrics {
            price: 110.0,
            fifty_day_ma: 100.0,
            two_hundred_day_ma: 90.0,
            rsi: 60.0,
            volume: 2_000_000.0,
            avg_volume: 1_000_000.0,
            recent_high: 112.0,
            recent_low: 95.0,
        }
    }

    fn weak() -> RawMetrics {
        RawMetrics {
            price: 50.0,
            fifty_day_ma: 55.0,
            two_hundred_day_ma: 60.0,
            rsi: 40.0,
            volume: 100_000.0,
            avg_volume: 1_000_000.0,
            recent_high: 70.0,
            recent_low: 45.0,
        }
    }

    #[test]
    fn strong_setup_passes_everything() {
        let v = evaluate(&strong());
        assert!(v.trend && v.momentum && v.volume_sufficient && v.price_action);
        assert_eq!(v.score, 4);
        assert!(v.fails.is_empty());
    }

    #[test]
    fn weak_setup_fails_everything_in_order() {
        let v = evaluate(&weak());
        assert_eq!(v.score, 0);
        assert_eq!(
            v.fails,
            vec![
                Criterion::Trend,
                Criterion::Momentum,
                Criterion::Volume,
                Criterion::PriceAction
            ]
        );
    }

    #[test]
    fn zero_average_volume_is_not_sufficient() {
        let mut m = strong();
        m.avg_volume = 0.0;
        let v = evaluate(&m);
        assert!(!v.volume_sufficient);
        assert_eq!(v.score, 3);
        assert_eq!(v.fails, vec![Criterion::Volume]);
    }

    #[test]
    fn price_action_boundary_is_inclusive() {
        let mut m = strong();
        m.recent_high = 100.0;
        m.price = m.recent_high * 0.95;
        assert!(evaluate(&m).price_action);

        m.price = m.recent_high * 0.95 - 1e-9;
        assert!(!evaluate(&m).price_action);
    }

    #[test]
    fn relative_volume_boundary_is_strict() {
        let mut m = strong();
        m.avg_volume = 1_000_000.0;
        m.volume = 1_500_000.0;
        assert!(!evaluate(&m).volume_sufficient);

        m.volume = 1_500_001.0;
        assert!(evaluate(&m).volume_sufficient);
    }

    #[test]
    fn rsi_of_exactly_fifty_is_not_momentum() {
        let mut m = strong();
        m.rsi = 50.0;
        assert!(!evaluate(&m).momentum);
    }

    #[test]
    fn trend_needs_both_comparisons() {
        let mut m = strong();
        // Price above both MAs but no golden cross.
        m.fifty_day_ma = 95.0;
        m.two_hundred_day_ma = 100.0;
        assert!(!evaluate(&m).trend);

        // Golden cross but price below the 50-day.
        let mut m = strong();
        m.price = 99.0;
        assert!(!evaluate(&m).trend);
    }

    #[test]
    fn score_matches_passed_criteria_and_fails_complement() {
        let mut m = weak();
        m.rsi = 70.0;
        m.price = 68.0;
        let v = evaluate(&m);
        let passed = Criterion::ALL.iter().filter(|c| v.passed(**c)).count();
        assert_eq!(v.score as usize, passed);
        for c in Criterion::ALL {
            assert_eq!(v.fails.contains(&c), !v.passed(c));
        }
    }

    #[test]
    fn negative_inputs_still_produce_a_verdict() {
        let m = RawMetrics {
            price: -1.0,
            fifty_day_ma: -2.0,
            two_hundred_day_ma: -3.0,
            rsi: -10.0,
            volume: -5.0,
            avg_volume: -1.0,
            recent_high: -1.0,
            recent_low: -9.0,
        };
        let v = evaluate(&m);
        assert!(v.trend);
        assert!(!v.volume_sufficient);
        // -1 >= -0.95 is false.
        assert!(!v.price_action);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let m = strong();
        assert_eq!(evaluate(&m), evaluate(&m));
    }
}
