use chrono::NaiveDate;
use costlens::analytics::trends::classify_volatility;
use costlens::{
    build_periods, compute_stats, AnomalyDetector, ForecastEngine, PeriodGranularity,
    RawCostPoint, ScenarioInput, ServiceCanonicalizer, ServiceConsolidator, TrendPeriod,
    Volatility,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

const SERVICES: &[&str] = &[
    "Amazon Simple Storage Service",
    "Amazon Elastic Compute Cloud - Compute",
    "AWS Lambda",
    "Amazon Relational Database Service",
    "AWS Data Transfer",
];

fn points_strategy() -> impl Strategy<Value = Vec<RawCostPoint>> {
    prop::collection::vec((0usize..SERVICES.len(), 1u32..=28, -10_000i64..100_000), 0..60)
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(service, day, cents)| {
                    RawCostPoint::new(
                        NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                        SERVICES[service],
                        Decimal::new(cents, 2),
                        "USD",
                    )
                })
                .collect()
        })
}

fn history(totals: &[i64]) -> Vec<TrendPeriod> {
    let points: Vec<_> = totals
        .iter()
        .enumerate()
        .map(|(i, total)| {
            RawCostPoint::new(
                NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .checked_add_months(chrono::Months::new(i as u32))
                    .unwrap(),
                "Amazon EC2",
                Decimal::from(*total),
                "USD",
            )
        })
        .collect();
    build_periods(
        &points,
        PeriodGranularity::Monthly,
        &ServiceCanonicalizer::default(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn test_consolidation_conserves_total(points in points_strategy()) {
        let consolidation = ServiceConsolidator::default().consolidate(&points).unwrap();
        let input: Decimal = points.iter().map(|p| p.amount).sum();

        prop_assert_eq!(consolidation.total_cost, input);
        prop_assert_eq!(consolidation.services_total().unwrap(), input);
        for pair in consolidation.services.windows(2) {
            prop_assert!(pair[0].total_cost.abs() >= pair[1].total_cost.abs());
        }
    }

    #[test]
    fn test_consolidation_is_deterministic(points in points_strategy()) {
        let consolidator = ServiceConsolidator::default();
        prop_assert_eq!(
            consolidator.consolidate(&points).unwrap(),
            consolidator.consolidate(&points).unwrap()
        );
    }

    #[test]
    fn test_anomalies_ignore_input_order(points in points_strategy()) {
        let detector = AnomalyDetector::default();
        let mut reversed = points.clone();
        reversed.reverse();

        prop_assert_eq!(detector.detect(&points).unwrap(), detector.detect(&reversed).unwrap());
    }

    #[test]
    fn test_flat_history_projects_flat(cost in 1i64..1_000_000, len in 2usize..24) {
        let periods = history(&vec![cost; len]);
        let forecast = ForecastEngine::default().forecast(&periods).unwrap();

        prop_assert_eq!(forecast.business_metrics.growth_rate_pct, 0.0);
        for period in &forecast.periods {
            prop_assert_eq!(period.base_cost, Decimal::from(cost));
        }
    }

    #[test]
    fn test_volatility_follows_cv(totals in prop::collection::vec(1i64..100_000, 1..24)) {
        let stats = compute_stats(&history(&totals)).unwrap();
        let cv = stats.coefficient_of_variation.unwrap();

        prop_assert_eq!(stats.volatility, classify_volatility(cv));
        if totals.iter().all(|t| *t == totals[0]) {
            prop_assert_eq!(stats.volatility, Volatility::Low);
        }
    }

    #[test]
    fn test_growth_is_null_only_for_first_period(
        totals in prop::collection::vec(1i64..100_000, 1..24)
    ) {
        let periods = history(&totals);

        prop_assert_eq!(periods.len(), totals.len());
        prop_assert!(periods[0].growth_rate_pct.is_none());
        for period in &periods[1..] {
            prop_assert!(period.growth_rate_pct.is_some());
        }
        let stats = compute_stats(&periods).unwrap();
        prop_assert_eq!(stats.growth_data.is_sufficient(), totals.len() >= 2);
    }

    #[test]
    fn test_wider_spread_is_never_less_volatile(
        mean in 3_000i64..100_000,
        offsets in prop::collection::vec(0i64..500, 1..12),
        stretch in 1i64..5,
    ) {
        // Paired +d/-d offsets keep the mean fixed while `stretch` widens the spread
        let series = |scale: i64| -> Vec<i64> {
            offsets
                .iter()
                .flat_map(|d| [mean + scale * d, mean - scale * d])
                .collect()
        };
        let narrow = compute_stats(&history(&series(1))).unwrap();
        let wide = compute_stats(&history(&series(stretch))).unwrap();

        prop_assert_eq!(narrow.avg_monthly_cost, wide.avg_monthly_cost);
        prop_assert!(wide.volatility >= narrow.volatility);
    }

    #[test]
    fn test_confidence_never_increases(totals in prop::collection::vec(100i64..10_000, 2..18)) {
        let forecast = ForecastEngine::default().forecast(&history(&totals)).unwrap();

        for period in &forecast.periods {
            prop_assert!((0.0..=100.0).contains(&period.confidence_level));
        }
        for pair in forecast.periods.windows(2) {
            if pair[0].confidence_level > 0.0 {
                prop_assert!(pair[1].confidence_level < pair[0].confidence_level);
            } else {
                prop_assert_eq!(pair[1].confidence_level, 0.0);
            }
        }
    }

    #[test]
    fn test_scenarios_are_independent(
        totals in prop::collection::vec(100i64..10_000, 2..12),
        growth in 0.5f64..2.0,
        season in 0.5f64..2.0,
    ) {
        let periods = history(&totals);
        let engine = ForecastEngine::default();
        let candidate = ScenarioInput::new("Candidate", growth, season, "");

        let alone = engine.run_scenarios(&periods, &[candidate.clone()]).unwrap();
        let mut batch = ScenarioInput::presets();
        batch.insert(1, candidate);
        let together = engine.run_scenarios(&periods, &batch).unwrap();

        prop_assert_eq!(together.len(), batch.len());
        prop_assert_eq!(&alone[0], &together[1]);
    }
}
