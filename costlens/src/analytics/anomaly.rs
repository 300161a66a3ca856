//! Anomaly classification
//!
//! Each service/day cost is compared with a trailing baseline made of the same
//! service's costs over the previous `window_days` calendar days (the day being
//! evaluated is excluded). A day is flagged when its z-score against that
//! baseline exceeds `z_threshold`, and the magnitude of the z-score picks the
//! severity tier.

use super::{Anomaly, AnomalyId, AnomalySeverity, DataSufficiency, RawCostPoint};
use crate::common::numeric::{checked_add, decimal_mean, population_std_dev, to_f64};
use crate::error::{CostLensError, Result};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard deviations below this are treated as a flat baseline
const FLAT_BASELINE_EPSILON: f64 = 1e-9;

/// Tunables for anomaly detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Trailing window length in days
    pub window_days: u32,
    /// Minimum number of baseline observations before a day is evaluated
    pub min_history: usize,
    /// |z| must exceed this to flag a day; flagged days start at low severity
    pub z_threshold: f64,
    /// |z| above this is medium severity
    pub medium_z: f64,
    /// |z| above this is high severity
    pub high_z: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_history: 3,
            z_threshold: 1.5,
            medium_z: 2.0,
            high_z: 3.0,
        }
    }
}

impl AnomalyConfig {
    /// Reject configurations the detector cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.window_days == 0 {
            return Err(CostLensError::invalid_config(
                "anomaly.window_days",
                self.window_days,
                "window_days must be positive (commonly 7, 30 or 90)",
            ));
        }
        if self.min_history < 2 {
            return Err(CostLensError::invalid_config(
                "anomaly.min_history",
                self.min_history,
                "a baseline needs at least 2 observations to have a spread",
            ));
        }
        for (name, value) in [
            ("anomaly.z_threshold", self.z_threshold),
            ("anomaly.medium_z", self.medium_z),
            ("anomaly.high_z", self.high_z),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CostLensError::invalid_config(
                    name,
                    value,
                    "z-score bands must be positive finite numbers",
                ));
            }
        }
        if self.z_threshold > self.medium_z || self.medium_z > self.high_z {
            return Err(CostLensError::invalid_config(
                "anomaly",
                format!(
                    "z_threshold={}, medium_z={}, high_z={}",
                    self.z_threshold, self.medium_z, self.high_z
                ),
                "bands must satisfy z_threshold <= medium_z <= high_z",
            ));
        }
        Ok(())
    }

    /// Severity tier for a flagged |z|
    pub fn classify(&self, z_abs: f64) -> AnomalySeverity {
        if z_abs > self.high_z {
            AnomalySeverity::High
        } else if z_abs > self.medium_z {
            AnomalySeverity::Medium
        } else {
            AnomalySeverity::Low
        }
    }
}

/// Anomalies found in a window together with evaluation counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    /// Flagged service/days, largest deviation first
    pub anomalies: Vec<Anomaly>,
    /// Service/days compared against a baseline
    pub evaluated: usize,
    /// Service/days skipped because the baseline was too short
    pub insufficient_history: usize,
    /// Service/days skipped because the baseline had no spread
    pub flat_baseline: usize,
    /// Whether any service/day had enough history to be evaluated
    pub history: DataSufficiency,
}

/// Detects anomalous service/day costs
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    /// Create a detector, validating the configuration
    pub fn new(config: AnomalyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a detector with default bands and the given window
    pub fn with_window(window_days: u32) -> Result<Self> {
        Self::new(AnomalyConfig {
            window_days,
            ..AnomalyConfig::default()
        })
    }

    /// The active configuration
    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Evaluate every service/day in `points`
    ///
    /// Points sharing a service and date are summed first; a daily sum beyond
    /// the decimal range is an [`CostLensError::Overflow`].
    pub fn detect(&self, points: &[RawCostPoint]) -> Result<AnomalyReport> {
        let mut daily: BTreeMap<&str, BTreeMap<NaiveDate, Decimal>> = BTreeMap::new();
        for point in points {
            let cost = daily
                .entry(point.service_key.as_str())
                .or_default()
                .entry(point.date)
                .or_insert(Decimal::ZERO);
            *cost = checked_add(*cost, point.amount, "daily service cost")?;
        }

        let window = Duration::days(i64::from(self.config.window_days));
        let mut anomalies = Vec::new();
        let mut evaluated = 0;
        let mut insufficient_history = 0;
        let mut flat_baseline = 0;
        let mut longest_series = 0;

        for (service, series) in &daily {
            longest_series = longest_series.max(series.len());

            for (&date, &cost) in series {
                // Windows reaching past the calendar start cover everything earlier
                let window_start = date.checked_sub_signed(window).unwrap_or(NaiveDate::MIN);
                let history: Vec<Decimal> = series
                    .range(window_start..date)
                    .map(|(_, &amount)| amount)
                    .collect();

                if history.len() < self.config.min_history {
                    insufficient_history += 1;
                    continue;
                }

                let values: Vec<f64> = history.iter().copied().map(to_f64).collect();
                let (Some(mean), Some(std_dev)) =
                    (decimal_mean(&history), population_std_dev(&values))
                else {
                    insufficient_history += 1;
                    continue;
                };

                if std_dev < FLAT_BASELINE_EPSILON {
                    tracing::debug!(
                        "Skipping {} on {}: flat baseline over {} days",
                        service,
                        date,
                        history.len()
                    );
                    flat_baseline += 1;
                    continue;
                }

                let Some(deviation) = cost.checked_sub(mean) else {
                    insufficient_history += 1;
                    continue;
                };
                evaluated += 1;
                let z_score = to_f64(deviation) / std_dev;

                if z_score.abs() > self.config.z_threshold {
                    let severity = self.config.classify(z_score.abs());
                    tracing::trace!(
                        "Anomaly {} on {}: cost {} vs baseline {} (z {:.2}, {})",
                        service,
                        date,
                        cost,
                        mean,
                        z_score,
                        severity
                    );
                    anomalies.push(Anomaly {
                        id: AnomalyId::derive(date, service),
                        date,
                        service_name: service.to_string(),
                        cost_amount: cost,
                        baseline_mean: mean,
                        deviation,
                        z_score,
                        severity,
                    });
                }
            }
        }

        sort_anomalies(&mut anomalies);

        let history = if evaluated > 0 || flat_baseline > 0 {
            DataSufficiency::Sufficient
        } else {
            DataSufficiency::InsufficientData {
                required: self.config.min_history + 1,
                actual: longest_series,
            }
        };

        Ok(AnomalyReport {
            anomalies,
            evaluated,
            insufficient_history,
            flat_baseline,
            history,
        })
    }
}

/// Detect anomalies with default bands over a `window_days` baseline
pub fn detect_anomalies(points: &[RawCostPoint], window_days: u32) -> Result<AnomalyReport> {
    AnomalyDetector::with_window(window_days)?.detect(points)
}

/// Order by |deviation| descending, then most recent date first, then service
pub fn sort_anomalies(anomalies: &mut [Anomaly]) {
    anomalies.sort_by(|a, b| {
        b.deviation
            .abs()
            .cmp(&a.deviation.abs())
            .then_with(|| b.date.cmp(&a.date))
            .then_with(|| a.service_name.cmp(&b.service_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn point(service: &str, d: u32, amount: Decimal) -> RawCostPoint {
        RawCostPoint::new(day(d), service, amount, "USD")
    }

    fn anomaly(deviation: Decimal, date: NaiveDate) -> Anomaly {
        Anomaly {
            id: AnomalyId::derive(date, "svc"),
            date,
            service_name: "svc".to_string(),
            cost_amount: deviation,
            baseline_mean: Decimal::ZERO,
            deviation,
            z_score: 0.0,
            severity: AnomalySeverity::Low,
        }
    }

    #[test]
    fn test_ordering_by_magnitude_then_recency() {
        let mut anomalies = vec![
            anomaly(dec!(12), day(1)),
            anomaly(dec!(45), day(2)),
            anomaly(dec!(45), day(3)),
            anomaly(dec!(8), day(4)),
        ];
        sort_anomalies(&mut anomalies);

        let order: Vec<_> = anomalies.iter().map(|a| (a.deviation, a.date)).collect();
        assert_eq!(
            order,
            vec![
                (dec!(45), day(3)),
                (dec!(45), day(2)),
                (dec!(12), day(1)),
                (dec!(8), day(4)),
            ]
        );
    }

    #[test]
    fn test_negative_deviation_sorts_by_magnitude() {
        let mut anomalies = vec![anomaly(dec!(10), day(1)), anomaly(dec!(-20), day(1))];
        sort_anomalies(&mut anomalies);
        assert_eq!(anomalies[0].deviation, dec!(-20));
    }

    #[test]
    fn test_detects_spike_as_high() {
        let mut points: Vec<_> = (1..=10)
            .map(|d| point("Amazon EC2", d, if d % 2 == 0 { dec!(102) } else { dec!(98) }))
            .collect();
        points.push(point("Amazon EC2", 11, dec!(200)));

        let report = AnomalyDetector::default().detect(&points).unwrap();
        assert_eq!(report.anomalies.len(), 1);

        let spike = &report.anomalies[0];
        assert_eq!(spike.date, day(11));
        assert_eq!(spike.severity, AnomalySeverity::High);
        assert_eq!(spike.baseline_mean, dec!(100));
        assert_eq!(spike.deviation, dec!(100));
        assert!((spike.z_score - 50.0).abs() < 1e-9);
        assert_eq!(spike.id.as_str(), "2024-05-11::Amazon EC2");
        assert!(report.history.is_sufficient());
    }

    #[test]
    fn test_severity_bands_from_detection() {
        // Day 3 baseline is days 1-2: mean 100, std 10
        let points = vec![
            point("A", 1, dec!(90)),
            point("A", 2, dec!(110)),
            point("A", 3, dec!(125)),
        ];
        let detector = AnomalyDetector::new(AnomalyConfig {
            window_days: 2,
            min_history: 2,
            ..AnomalyConfig::default()
        })
        .unwrap();

        let report = detector.detect(&points).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].severity, AnomalySeverity::Medium);
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.insufficient_history, 2);
    }

    #[test]
    fn test_classify_bands() {
        let config = AnomalyConfig::default();
        assert_eq!(config.classify(1.8), AnomalySeverity::Low);
        assert_eq!(config.classify(2.0), AnomalySeverity::Low);
        assert_eq!(config.classify(2.5), AnomalySeverity::Medium);
        assert_eq!(config.classify(3.0), AnomalySeverity::Medium);
        assert_eq!(config.classify(3.5), AnomalySeverity::High);
    }

    #[test]
    fn test_window_excludes_old_history_and_current_day() {
        // Days 1-3 are wild, days 4-6 are steady; with a 3 day window only
        // days 4-6 form the baseline for day 7.
        let points = vec![
            point("A", 1, dec!(1000)),
            point("A", 2, dec!(5)),
            point("A", 3, dec!(900)),
            point("A", 4, dec!(99)),
            point("A", 5, dec!(101)),
            point("A", 6, dec!(100)),
            point("A", 7, dec!(130)),
        ];
        let detector = AnomalyDetector::new(AnomalyConfig {
            window_days: 3,
            ..AnomalyConfig::default()
        })
        .unwrap();

        let report = detector.detect(&points).unwrap();
        let last = report
            .anomalies
            .iter()
            .find(|a| a.date == day(7))
            .expect("day 7 should be flagged");
        assert_eq!(last.baseline_mean, dec!(100));
        assert_eq!(last.severity, AnomalySeverity::High);
    }

    #[test]
    fn test_drop_is_flagged_with_negative_deviation() {
        let mut points: Vec<_> = (1..=6)
            .map(|d| point("S3", d, if d % 2 == 0 { dec!(51) } else { dec!(49) }))
            .collect();
        points.push(point("S3", 7, dec!(10)));

        let report = AnomalyDetector::default().detect(&points).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert!(report.anomalies[0].deviation < Decimal::ZERO);
        assert!(report.anomalies[0].z_score < 0.0);
    }

    #[test]
    fn test_flat_baseline_is_skipped() {
        let points: Vec<_> = (1..=5).map(|d| point("A", d, dec!(10))).collect();
        let report = AnomalyDetector::default().detect(&points).unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.flat_baseline, 2);
        assert_eq!(report.evaluated, 0);
        assert!(report.history.is_sufficient());
    }

    #[test]
    fn test_no_history_reports_insufficient_data() {
        let report = AnomalyDetector::default().detect(&[point("A", 1, dec!(10))]).unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.insufficient_history, 1);
        assert_eq!(
            report.history,
            DataSufficiency::InsufficientData {
                required: 4,
                actual: 1
            }
        );
    }

    #[test]
    fn test_duplicate_points_are_summed() {
        let mut points: Vec<_> = (1..=6)
            .map(|d| point("A", d, if d % 2 == 0 { dec!(11) } else { dec!(9) }))
            .collect();
        points.push(point("A", 7, dec!(40)));
        points.push(point("A", 7, dec!(40)));

        let report = AnomalyDetector::default().detect(&points).unwrap();
        assert_eq!(report.anomalies[0].cost_amount, dec!(80));
    }

    #[test]
    fn test_recomputation_yields_same_ids() {
        let mut points: Vec<_> = (1..=8)
            .map(|d| point("A", d, if d % 2 == 0 { dec!(21) } else { dec!(19) }))
            .collect();
        points.push(point("A", 9, dec!(60)));

        let detector = AnomalyDetector::default();
        let first: Vec<_> = detector.detect(&points).unwrap().anomalies.into_iter().map(|a| a.id).collect();
        let second: Vec<_> = detector.detect(&points).unwrap().anomalies.into_iter().map(|a| a.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(matches!(
            detect_anomalies(&[], 0),
            Err(CostLensError::InvalidConfiguration { .. })
        ));
        assert!(AnomalyDetector::new(AnomalyConfig {
            medium_z: 4.0,
            high_z: 3.0,
            ..AnomalyConfig::default()
        })
        .is_err());
        assert!(AnomalyDetector::new(AnomalyConfig {
            min_history: 1,
            ..AnomalyConfig::default()
        })
        .is_err());
    }

    #[test]
    fn test_window_longer_than_calendar_history() {
        let detector = AnomalyDetector::new(AnomalyConfig {
            window_days: u32::MAX,
            ..AnomalyConfig::default()
        })
        .unwrap();

        let report = detector.detect(&[point("A", 1, dec!(10))]).unwrap();
        assert_eq!(report.insufficient_history, 1);

        let mut points: Vec<_> = (1..=6)
            .map(|d| point("A", d, if d % 2 == 0 { dec!(102) } else { dec!(98) }))
            .collect();
        points.push(point("A", 7, dec!(200)));
        let report = detector.detect(&points).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].date, day(7));
    }

    #[test]
    fn test_daily_sum_overflow_is_an_error() {
        let huge = Decimal::from_scientific("5e28").unwrap();
        let points = vec![point("A", 1, huge), point("A", 1, huge)];
        assert!(matches!(
            AnomalyDetector::default().detect(&points),
            Err(CostLensError::Overflow { .. })
        ));
    }
}
