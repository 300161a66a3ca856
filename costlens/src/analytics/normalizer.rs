//! Cost record normalization
//!
//! Flattens provider-shaped billing responses (time-period buckets holding
//! grouped metric sets) into a flat list of [`RawCostPoint`]s.
//!
//! The cost metric of each group is chosen by an ordered list of
//! [`MetricExtractor`] strategies; the first one that finds a metric wins. New
//! metric names can be supported by adding an extractor, without touching the
//! normalization loop. Groups without a usable metric are omitted and
//! recorded in an [`OmissionReport`] rather than failing the batch.

use super::RawCostPoint;
use crate::error::{CostLensError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Metric preferred when present
pub const BLENDED_COST: &str = "BlendedCost";

/// Fallback metric
pub const UNBLENDED_COST: &str = "UnblendedCost";

/// Top-level billing response, shaped like a Cost Explorer `GetCostAndUsage` result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostExplorerResponse {
    /// Time-period buckets, in provider order
    #[serde(default)]
    pub results_by_time: Vec<TimePeriodBucket>,
}

/// Costs for a single time period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePeriodBucket {
    /// Period covered by the bucket
    pub time_period: TimePeriod,
    /// Grouped metrics (typically one group per service)
    #[serde(default)]
    pub groups: Vec<CostGroup>,
    /// Whether the provider marked the figures as estimates
    #[serde(default)]
    pub estimated: bool,
}

/// Start and end of a billing bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePeriod {
    /// Inclusive start date
    pub start: NaiveDate,
    /// Exclusive end date
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

/// One group inside a bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostGroup {
    /// Group keys; the first key is the service key
    #[serde(default)]
    pub keys: Vec<String>,
    /// Metric name to value
    #[serde(default)]
    pub metrics: HashMap<String, MetricValue>,
}

/// A single metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    /// Amount, usually sent as a string; absent amounts read as `null`
    #[serde(default)]
    pub amount: RawAmount,
    /// Unit, e.g. `USD`
    #[serde(default)]
    pub unit: String,
}

impl MetricValue {
    /// Convenience constructor for a string amount
    pub fn new(amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            amount: RawAmount::Text(amount.into()),
            unit: unit.into(),
        }
    }
}

/// Amount as it appeared on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// String amount (`"12.34"`)
    Text(String),
    /// Bare JSON number
    Number(serde_json::Number),
    /// Anything else (`null`, booleans, objects); never parses
    Other(serde_json::Value),
}

impl Default for RawAmount {
    fn default() -> Self {
        RawAmount::Other(serde_json::Value::Null)
    }
}

impl RawAmount {
    /// Parse the amount into a decimal
    pub fn parse(&self) -> Option<Decimal> {
        let text = match self {
            RawAmount::Text(text) => text.trim().to_string(),
            RawAmount::Number(number) => number.to_string(),
            RawAmount::Other(_) => return None,
        };
        if text.is_empty() {
            return None;
        }
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAmount::Text(text) => write!(f, "{}", text),
            RawAmount::Number(number) => write!(f, "{}", number),
            RawAmount::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Strategy for picking a cost metric out of a group's metric set
pub trait MetricExtractor: Send + Sync + fmt::Debug {
    /// Name reported in omission records
    fn metric_name(&self) -> &str;

    /// Return the metric this strategy understands, if present
    fn extract<'a>(&self, metrics: &'a HashMap<String, MetricValue>) -> Option<&'a MetricValue>;
}

/// Extractor that looks a metric up by its exact name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedMetric {
    name: String,
}

impl NamedMetric {
    /// Create an extractor for `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MetricExtractor for NamedMetric {
    fn metric_name(&self) -> &str {
        &self.name
    }

    fn extract<'a>(&self, metrics: &'a HashMap<String, MetricValue>) -> Option<&'a MetricValue> {
        metrics.get(&self.name)
    }
}

/// Why a group was left out of the normalized output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum OmissionReason {
    /// The group carried no keys
    MissingServiceKey,
    /// None of the configured metrics were present
    NoCostMetric,
    /// The chosen metric's amount was not numeric
    UnparseableAmount {
        /// Metric that was chosen
        metric: String,
        /// Raw amount text
        raw: String,
    },
}

impl OmissionReason {
    /// Short stable label for counting
    pub fn label(&self) -> &'static str {
        match self {
            OmissionReason::MissingServiceKey => "missing_service_key",
            OmissionReason::NoCostMetric => "no_cost_metric",
            OmissionReason::UnparseableAmount { .. } => "unparseable_amount",
        }
    }
}

/// A single omitted group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Omission {
    /// Bucket start date
    pub date: NaiveDate,
    /// Service key, when the group had one
    pub service_key: Option<String>,
    /// Why it was omitted
    #[serde(flatten)]
    pub reason: OmissionReason,
}

/// Countable record of every group left out during normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmissionReport {
    /// Number of groups inspected
    pub groups_seen: usize,
    /// Omitted groups, in input order
    pub omissions: Vec<Omission>,
}

impl OmissionReport {
    /// Number of omitted groups
    pub fn count(&self) -> usize {
        self.omissions.len()
    }

    /// Whether nothing was omitted
    pub fn is_empty(&self) -> bool {
        self.omissions.is_empty()
    }

    /// Omission counts keyed by [`OmissionReason::label`]
    pub fn count_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for omission in &self.omissions {
            *counts.entry(omission.reason.label()).or_insert(0) += 1;
        }
        counts
    }
}

/// Output of a normalization pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Flat cost points in input order
    pub points: Vec<RawCostPoint>,
    /// What was left out and why
    pub omissions: OmissionReport,
}

/// Flattens billing responses into [`RawCostPoint`]s
#[derive(Debug)]
pub struct CostNormalizer {
    extractors: Vec<Box<dyn MetricExtractor>>,
}

impl Default for CostNormalizer {
    fn default() -> Self {
        Self {
            extractors: vec![
                Box::new(NamedMetric::new(BLENDED_COST)),
                Box::new(NamedMetric::new(UNBLENDED_COST)),
            ],
        }
    }
}

impl CostNormalizer {
    /// Build a normalizer trying the given metric names in order
    pub fn from_metric_names(names: &[String]) -> Result<Self> {
        let extractors: Vec<Box<dyn MetricExtractor>> = names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| Box::new(NamedMetric::new(name)) as Box<dyn MetricExtractor>)
            .collect();
        Self::with_extractors(extractors)
    }

    /// Build a normalizer from custom extraction strategies
    pub fn with_extractors(extractors: Vec<Box<dyn MetricExtractor>>) -> Result<Self> {
        if extractors.is_empty() {
            return Err(CostLensError::invalid_config(
                "metric_priority",
                "[]",
                "at least one cost metric name is required",
            ));
        }
        Ok(Self { extractors })
    }

    /// Metric names in priority order
    pub fn metric_names(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.metric_name()).collect()
    }

    /// Flatten a billing response
    ///
    /// Group order is preserved and nothing is de-duplicated.
    pub fn normalize(&self, response: &CostExplorerResponse) -> Normalized {
        let mut normalized = Normalized::default();

        for bucket in &response.results_by_time {
            let date = bucket.time_period.start;
            for group in &bucket.groups {
                normalized.omissions.groups_seen += 1;
                match self.normalize_group(date, group) {
                    Ok(point) => normalized.points.push(point),
                    Err(omission) => {
                        tracing::debug!(
                            "Omitting group {:?} on {}: {}",
                            omission.service_key,
                            date,
                            omission.reason.label()
                        );
                        normalized.omissions.omissions.push(omission);
                    }
                }
            }
        }

        if !normalized.omissions.is_empty() {
            tracing::warn!(
                "Omitted {} of {} cost groups: {:?}",
                normalized.omissions.count(),
                normalized.omissions.groups_seen,
                normalized.omissions.count_by_reason()
            );
        }

        normalized
    }

    fn normalize_group(
        &self,
        date: NaiveDate,
        group: &CostGroup,
    ) -> std::result::Result<RawCostPoint, Omission> {
        let service_key = group
            .keys
            .first()
            .map(|key| key.trim())
            .filter(|key| !key.is_empty());

        let Some(service_key) = service_key else {
            return Err(Omission {
                date,
                service_key: None,
                reason: OmissionReason::MissingServiceKey,
            });
        };

        let omission = |reason: OmissionReason| Omission {
            date,
            service_key: Some(service_key.to_string()),
            reason,
        };

        let Some((extractor, metric)) = self
            .extractors
            .iter()
            .find_map(|extractor| extractor.extract(&group.metrics).map(|m| (extractor, m)))
        else {
            return Err(omission(OmissionReason::NoCostMetric));
        };

        let amount = metric.amount.parse().ok_or_else(|| {
            omission(OmissionReason::UnparseableAmount {
                metric: extractor.metric_name().to_string(),
                raw: metric.amount.to_string(),
            })
        })?;

        Ok(RawCostPoint::new(
            date,
            service_key,
            amount,
            metric.unit.clone(),
        ))
    }
}
