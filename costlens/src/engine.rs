//! Analyzer façade tying the analytics stages together
//!
//! [`CostAnalyzer`] compiles an [`EngineConfig`] once and then runs the whole
//! pipeline over a billing response:
//!
//! ```text
//! normalize -> consolidate -> periods -> statistics
//!                          -> anomalies
//!                          -> suggestions
//! ```
//!
//! Each call either returns a complete [`CostAnalysis`] or an error; partial
//! results are never returned. Missing data is not an error: an export with
//! no usable groups still yields an analysis carrying its omissions, with
//! empty services and periods and no statistics.

use crate::analytics::{
    build_periods, compute_stats, AnomalyDetector, AnomalyReport, ConsolidatedService,
    CostExplorerResponse, CostNormalizer, DataSufficiency, Forecast, ForecastEngine,
    Normalized, OmissionReport, OptimizationSuggestion, RawCostPoint, Scenario, ScenarioInput,
    ServiceConsolidator, ServiceCanonicalizer, SuggestionEngine, TrendPeriod, TrendStatistics,
};
use crate::common::numeric::checked_sum;
use crate::config::EngineConfig;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything derived from one analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostAnalysis {
    /// Per-service totals, highest absolute cost first
    pub services: Vec<ConsolidatedService>,
    /// Running total across every normalized point
    pub total_cost: Decimal,
    /// Period totals, oldest first, with growth annotations
    pub periods: Vec<TrendPeriod>,
    /// Summary statistics over `periods`; `None` when there are no periods
    pub statistics: Option<TrendStatistics>,
    /// Anomalous service/days and evaluation counters
    pub anomalies: AnomalyReport,
    /// Heuristic savings suggestions, in rule order
    pub suggestions: Vec<OptimizationSuggestion>,
    /// Billing groups left out during normalization
    pub omissions: OmissionReport,
}

impl CostAnalysis {
    /// Whether any period-over-period growth could be derived
    pub fn has_growth_data(&self) -> bool {
        self.statistics
            .as_ref()
            .is_some_and(|stats| stats.growth_data.is_sufficient())
    }

    /// Whether the window held no usable cost points at all
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Sum of estimated savings across all suggestions
    pub fn potential_savings(&self) -> Result<Decimal> {
        checked_sum(
            self.suggestions.iter().map(|s| s.potential_savings),
            "potential savings",
        )
    }
}

/// Runs the analytics pipeline with a fixed configuration
#[derive(Debug)]
pub struct CostAnalyzer {
    config: EngineConfig,
    normalizer: CostNormalizer,
    consolidator: ServiceConsolidator,
    anomaly_detector: AnomalyDetector,
    forecast_engine: ForecastEngine,
    suggestion_engine: SuggestionEngine,
}

impl CostAnalyzer {
    /// Compile a configuration into an analyzer
    ///
    /// Fails on any configuration the individual stages reject.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let normalizer = CostNormalizer::from_metric_names(&config.metric_priority)?;
        let canonicalizer = ServiceCanonicalizer::new(&config.canonical_rules)?;
        let consolidator = ServiceConsolidator::new(canonicalizer, config.palette.len())?;
        let anomaly_detector = AnomalyDetector::new(config.anomaly.clone())?;
        let forecast_engine =
            ForecastEngine::new(config.forecast.clone())?.with_granularity(config.granularity);
        let suggestion_engine = SuggestionEngine::new(&config.suggestions)?;

        Ok(Self {
            config,
            normalizer,
            consolidator,
            anomaly_detector,
            forecast_engine,
            suggestion_engine,
        })
    }

    /// The configuration this analyzer was built from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Palette colour for a service's `color_index`
    pub fn color_for(&self, service: &ConsolidatedService) -> Option<&str> {
        self.config
            .palette
            .get(service.color_index)
            .map(String::as_str)
    }

    /// Flatten a billing response without analysing it
    pub fn normalize(&self, response: &CostExplorerResponse) -> Normalized {
        self.normalizer.normalize(response)
    }

    /// Run the full pipeline over a billing response
    pub fn analyze(&self, response: &CostExplorerResponse) -> Result<CostAnalysis> {
        let Normalized { points, omissions } = self.normalize(response);
        self.analyze_points(&points, omissions)
    }

    /// Run the pipeline over already-normalized points
    pub fn analyze_points(
        &self,
        points: &[RawCostPoint],
        omissions: OmissionReport,
    ) -> Result<CostAnalysis> {
        tracing::info!(
            "Analyzing {} cost points ({} groups omitted)",
            points.len(),
            omissions.count()
        );

        let consolidation = self.consolidator.consolidate(points)?;
        let canonicalizer = self.consolidator.canonicalizer();

        let periods = build_periods(points, self.config.granularity, canonicalizer)?;
        let statistics = if periods.is_empty() {
            tracing::warn!(
                "No usable cost points ({} groups omitted); statistics unavailable",
                omissions.count()
            );
            None
        } else {
            Some(compute_stats(&periods)?)
        };
        if let Some(DataSufficiency::InsufficientData { required, actual }) =
            statistics.as_ref().map(|stats| stats.growth_data)
        {
            tracing::warn!(
                "Only {} {} period(s) available; growth rates need at least {}",
                actual,
                self.config.granularity,
                required
            );
        }

        let canonical_points: Vec<RawCostPoint> = points
            .iter()
            .map(|point| RawCostPoint {
                service_key: canonicalizer.canonicalize(&point.service_key).into_owned(),
                ..point.clone()
            })
            .collect();
        let anomalies = self.anomaly_detector.detect(&canonical_points)?;

        let suggestions = self
            .suggestion_engine
            .suggest(&consolidation.services, consolidation.total_cost);

        tracing::info!(
            "Analysis complete: {} services, {} periods, {} anomalies, {} suggestions",
            consolidation.services.len(),
            periods.len(),
            anomalies.anomalies.len(),
            suggestions.len()
        );

        Ok(CostAnalysis {
            services: consolidation.services,
            total_cost: consolidation.total_cost,
            periods,
            statistics,
            anomalies,
            suggestions,
            omissions,
        })
    }

    /// Forecast from analysed periods with the configured settings
    pub fn forecast(&self, periods: &[TrendPeriod]) -> Result<Forecast> {
        let forecast = self.forecast_engine.forecast(periods)?;
        if !forecast.history.is_sufficient() {
            tracing::warn!("No defined growth rate in history; forecast is a flat projection with zero confidence");
        }
        Ok(forecast)
    }

    /// Evaluate what-if scenarios against the neutral forecast
    pub fn run_scenarios(
        &self,
        periods: &[TrendPeriod],
        scenarios: &[ScenarioInput],
    ) -> Result<Vec<Scenario>> {
        self.forecast_engine.run_scenarios(periods, scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::normalizer::{CostGroup, MetricValue, TimePeriod, TimePeriodBucket};
    use crate::analytics::{AnomalySeverity, ForecastHorizon, PeriodGranularity, TrendDirection};
    use crate::error::CostLensError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn group(service: &str, amount: &str) -> CostGroup {
        let mut metrics = HashMap::new();
        metrics.insert("BlendedCost".to_string(), MetricValue::new(amount, "USD"));
        CostGroup {
            keys: vec![service.to_string()],
            metrics,
        }
    }

    fn bucket(start: NaiveDate, groups: Vec<CostGroup>) -> TimePeriodBucket {
        TimePeriodBucket {
            time_period: TimePeriod { start, end: None },
            groups,
            estimated: false,
        }
    }

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    fn monthly_response() -> CostExplorerResponse {
        CostExplorerResponse {
            results_by_time: vec![
                bucket(
                    month(1),
                    vec![
                        group("Amazon Elastic Compute Cloud - Compute", "100"),
                        group("Amazon Simple Storage Service", "20"),
                    ],
                ),
                bucket(
                    month(2),
                    vec![
                        group("Amazon Elastic Compute Cloud - Compute", "120"),
                        group("Amazon Simple Storage Service", "25"),
                        group("Tax", "not-a-number"),
                    ],
                ),
                bucket(
                    month(3),
                    vec![
                        group("Amazon Elastic Compute Cloud - Compute", "150"),
                        group("Amazon Simple Storage Service", "30"),
                    ],
                ),
            ],
        }
    }

    #[test]
    fn test_analyze_monthly_response() {
        let analyzer = CostAnalyzer::new(EngineConfig::default()).unwrap();
        let analysis = analyzer.analyze(&monthly_response()).unwrap();

        assert_eq!(analysis.total_cost, dec!(445));
        assert_eq!(analysis.services.len(), 2);
        assert_eq!(analysis.services[0].display_name, "Amazon EC2");
        assert_eq!(analysis.services[0].total_cost, dec!(370));
        assert_eq!(analysis.services[1].display_name, "Amazon S3");

        assert_eq!(analysis.periods.len(), 3);
        assert_eq!(analysis.periods[0].growth_rate_pct, None);
        assert_eq!(
            analysis.statistics.as_ref().unwrap().overall_trend,
            TrendDirection::Increasing
        );
        assert!(analysis.has_growth_data());

        assert_eq!(analysis.omissions.count(), 1);
        assert_eq!(analysis.omissions.groups_seen, 7);

        // EC2 is 83% of spend and total exceeds 100
        assert_eq!(analysis.suggestions.len(), 2);
        assert_eq!(analysis.potential_savings().unwrap(), dec!(74) + dec!(133.5));
    }

    #[test]
    fn test_empty_response_is_an_empty_analysis() {
        let analyzer = CostAnalyzer::new(EngineConfig::default()).unwrap();
        let analysis = analyzer.analyze(&CostExplorerResponse::default()).unwrap();

        assert!(analysis.is_empty());
        assert!(analysis.services.is_empty());
        assert_eq!(analysis.total_cost, Decimal::ZERO);
        assert_eq!(analysis.statistics, None);
        assert!(!analysis.has_growth_data());
        assert!(!analysis.anomalies.history.is_sufficient());
        assert!(analysis.suggestions.is_empty());
    }

    #[test]
    fn test_fully_omitted_export_keeps_omissions() {
        let mut metrics = HashMap::new();
        metrics.insert("UsageQuantity".to_string(), MetricValue::new("12", "Hrs"));
        let response = CostExplorerResponse {
            results_by_time: vec![bucket(
                month(1),
                vec![CostGroup {
                    keys: vec!["Amazon Elastic Compute Cloud - Compute".to_string()],
                    metrics,
                }],
            )],
        };

        let analyzer = CostAnalyzer::new(EngineConfig::default()).unwrap();
        let analysis = analyzer.analyze(&response).unwrap();

        assert!(analysis.is_empty());
        assert_eq!(analysis.statistics, None);
        assert_eq!(analysis.omissions.groups_seen, 1);
        assert_eq!(analysis.omissions.count(), 1);

        assert!(matches!(
            analyzer.forecast(&analysis.periods),
            Err(CostLensError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_overflowing_totals_are_reported() {
        let analyzer = CostAnalyzer::new(EngineConfig::default()).unwrap();
        let response = CostExplorerResponse {
            results_by_time: vec![bucket(
                month(1),
                vec![
                    group("Amazon Elastic Compute Cloud - Compute", "5e28"),
                    group("Amazon Simple Storage Service", "5e28"),
                ],
            )],
        };
        assert!(matches!(
            analyzer.analyze(&response),
            Err(CostLensError::Overflow { .. })
        ));
    }

    #[test]
    fn test_daily_anomalies_use_canonical_names() {
        let mut config = EngineConfig::default();
        config.granularity = PeriodGranularity::Daily;
        let analyzer = CostAnalyzer::new(config).unwrap();

        let mut buckets: Vec<_> = (1..=10)
            .map(|d| {
                let amount = if d % 2 == 0 { "102" } else { "98" };
                bucket(
                    NaiveDate::from_ymd_opt(2024, 5, d).unwrap(),
                    vec![group("Amazon Simple Storage Service", amount)],
                )
            })
            .collect();
        buckets.push(bucket(
            NaiveDate::from_ymd_opt(2024, 5, 11).unwrap(),
            vec![group("Amazon Simple Storage Service", "300")],
        ));

        let analysis = analyzer
            .analyze(&CostExplorerResponse {
                results_by_time: buckets,
            })
            .unwrap();

        assert_eq!(analysis.periods.len(), 11);
        assert_eq!(analysis.anomalies.anomalies.len(), 1);
        let anomaly = &analysis.anomalies.anomalies[0];
        assert_eq!(anomaly.service_name, "Amazon S3");
        assert_eq!(anomaly.severity, AnomalySeverity::High);
        assert_eq!(anomaly.id.as_str(), "2024-05-11::Amazon S3");
    }

    #[test]
    fn test_forecast_and_scenarios_from_analysis() {
        let mut config = EngineConfig::default();
        config.forecast.horizon_months = ForecastHorizon::Three;
        let analyzer = CostAnalyzer::new(config).unwrap();
        let analysis = analyzer.analyze(&monthly_response()).unwrap();

        let forecast = analyzer.forecast(&analysis.periods).unwrap();
        assert_eq!(forecast.periods.len(), 3);
        assert_eq!(forecast.periods[0].date, month(4));
        assert!(forecast.confidence > 0.0);

        let scenarios = analyzer
            .run_scenarios(&analysis.periods, &ScenarioInput::presets())
            .unwrap();
        assert_eq!(scenarios.len(), 4);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = EngineConfig::default();
        config.palette.clear();
        assert!(CostAnalyzer::new(config).is_err());

        let mut config = EngineConfig::default();
        config.metric_priority = vec!["  ".to_string()];
        assert!(CostAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_color_for_service() {
        let analyzer = CostAnalyzer::new(EngineConfig::default()).unwrap();
        let analysis = analyzer.analyze(&monthly_response()).unwrap();
        assert_eq!(analyzer.color_for(&analysis.services[0]), Some("#3b82f6"));
        assert_eq!(analyzer.color_for(&analysis.services[1]), Some("#ef4444"));
    }
}
