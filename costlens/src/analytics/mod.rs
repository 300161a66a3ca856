//! Cost analytics and forecasting engine
//!
//! This module turns raw cloud-billing time series into derived analytics:
//! consolidated per-service totals, trend statistics, anomaly classifications,
//! multi-scenario forecasts and heuristic optimization suggestions.
//!
//! Data flows leaf-first through the submodules:
//!
//! ```text
//! normalizer -> consolidator -> { trends, anomaly, suggestions }
//!                               trends -> forecast
//! ```
//!
//! Every operation is a pure function of its inputs. Nothing here performs
//! I/O or keeps state between calls.

pub mod anomaly;
pub mod consolidator;
pub mod forecast;
pub mod normalizer;
pub mod suggestions;
pub mod trends;


pub use anomaly::{AnomalyConfig, AnomalyDetector, AnomalyReport};
pub use consolidator::{
    CanonicalRule, Consolidation, MatchKind, ServiceCanonicalizer, ServiceConsolidator,
    DEFAULT_PALETTE,
};
pub use forecast::{
    BusinessFactors, BusinessMetrics, Forecast, ForecastConfig, ForecastEngine, ForecastHorizon,
    ImpactDirection, Scenario, ScenarioImpact, ScenarioInput, ScenarioMetrics,
};
pub use normalizer::{
    CostExplorerResponse, CostNormalizer, MetricExtractor, Normalized, OmissionReason,
    OmissionReport,
};
pub use suggestions::{SuggestionConfig, SuggestionEngine};
pub use trends::{annotate_growth, build_periods, compute_stats};

use crate::error::CostLensError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single normalized billing observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCostPoint {
    /// Start date of the billing bucket the amount belongs to
    pub date: NaiveDate,
    /// Provider service key, before canonicalization
    pub service_key: String,
    /// Cost amount
    pub amount: Decimal,
    /// Currency or unit reported by the provider
    pub unit: String,
}

impl RawCostPoint {
    /// Create a new cost point
    pub fn new(
        date: NaiveDate,
        service_key: impl Into<String>,
        amount: Decimal,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            date,
            service_key: service_key.into(),
            amount,
            unit: unit.into(),
        }
    }
}

/// Per-service cost total for a reporting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedService {
    /// Canonical display name
    pub display_name: String,
    /// Summed cost of every point mapped to this name
    pub total_cost: Decimal,
    /// Position in the colour palette
    pub color_index: usize,
    /// Share of the window's running total, in percent
    pub percentage: f64,
}

/// Width of the buckets trend periods are built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    /// One period per calendar day, labelled `YYYY-MM-DD`
    Daily,
    /// One period per calendar month, labelled `YYYY-MM`
    #[default]
    Monthly,
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodGranularity::Daily => write!(f, "daily"),
            PeriodGranularity::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for PeriodGranularity {
    type Err = CostLensError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(PeriodGranularity::Daily),
            "monthly" | "month" => Ok(PeriodGranularity::Monthly),
            other => Err(CostLensError::invalid_config(
                "granularity",
                other,
                "use 'monthly' or 'daily'",
            )),
        }
    }
}

/// Total spend for one period, with its per-service breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPeriod {
    /// Human readable label (`2024-03` or `2024-03-15`)
    pub period_label: String,
    /// First day covered by the period
    pub period_start: NaiveDate,
    /// Total cost for the period
    pub total_cost: Decimal,
    /// Cost per canonical service name
    pub service_breakdown: BTreeMap<String, Decimal>,
    /// Growth against the previous period, `None` for the first period or a
    /// zero-cost predecessor
    pub growth_rate_pct: Option<f64>,
}

impl TrendPeriod {
    /// Create a period with no growth annotation
    pub fn new(period_label: impl Into<String>, period_start: NaiveDate, total_cost: Decimal) -> Self {
        Self {
            period_label: period_label.into(),
            period_start,
            total_cost,
            service_breakdown: BTreeMap::new(),
            growth_rate_pct: None,
        }
    }
}

/// Overall direction of a cost series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Second-half mean is more than 5% above the first-half mean
    Increasing,
    /// Second-half mean is more than 5% below the first-half mean
    Decreasing,
    /// Anything in between, or an undefined comparison
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Volatility tier derived from the coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    /// CV below 0.10
    Low,
    /// CV below 0.25
    Medium,
    /// Everything else
    High,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volatility::Low => write!(f, "low"),
            Volatility::Medium => write!(f, "medium"),
            Volatility::High => write!(f, "high"),
        }
    }
}

/// Whether a series was long enough for the derived figures to mean anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DataSufficiency {
    /// Enough data points were available
    Sufficient,
    /// Fewer points than required; dependent figures are `None` or zero
    InsufficientData {
        /// Minimum number of points required
        required: usize,
        /// Number of points supplied
        actual: usize,
    },
}

impl DataSufficiency {
    /// Classify a series length against a minimum
    pub fn check(required: usize, actual: usize) -> Self {
        if actual >= required {
            DataSufficiency::Sufficient
        } else {
            DataSufficiency::InsufficientData { required, actual }
        }
    }

    /// Whether the data was sufficient
    pub fn is_sufficient(&self) -> bool {
        matches!(self, DataSufficiency::Sufficient)
    }
}

/// Label and cost of a single period, used for highest/lowest markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodExtreme {
    /// Label of the period
    pub period_label: String,
    /// Total cost of the period
    pub total_cost: Decimal,
}

/// Summary statistics over an ordered series of trend periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStatistics {
    /// Arithmetic mean of period totals
    pub avg_monthly_cost: Decimal,
    /// Sum of period totals
    pub total_cost: Decimal,
    /// First period with the highest total
    pub highest_period: PeriodExtreme,
    /// First period with the lowest total
    pub lowest_period: PeriodExtreme,
    /// Direction from comparing the two halves of the series
    pub overall_trend: TrendDirection,
    /// Percentage difference between second-half and first-half means;
    /// `None` when the first half averages zero
    pub trend_diff_pct: Option<f64>,
    /// Volatility tier
    pub volatility: Volatility,
    /// Population standard deviation over |mean|; `None` when the mean is zero
    pub coefficient_of_variation: Option<f64>,
    /// Number of periods the statistics cover
    pub period_count: usize,
    /// Whether growth rates could be derived (needs two periods)
    pub growth_data: DataSufficiency,
}

/// Severity tier of an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    /// Flagged, but below the medium band
    Low,
    /// Between the medium and high bands
    Medium,
    /// Above the high band
    High,
}

impl fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalySeverity::Low => write!(f, "low"),
            AnomalySeverity::Medium => write!(f, "medium"),
            AnomalySeverity::High => write!(f, "high"),
        }
    }
}

/// Stable identifier of an anomaly, derived from its date and service
///
/// Recomputing the same window yields the same identifiers, so callers can
/// de-duplicate re-displayed anomalies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnomalyId(String);

impl AnomalyId {
    /// Derive the identifier for a service/day pair
    pub fn derive(date: NaiveDate, service_name: &str) -> Self {
        Self(format!("{}::{}", date.format("%Y-%m-%d"), service_name))
    }

    /// Borrow the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnomalyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A service/day whose cost breached the deviation gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    /// Stable identity derived from `(date, service_name)`
    pub id: AnomalyId,
    /// Day evaluated
    pub date: NaiveDate,
    /// Service the cost belongs to
    pub service_name: String,
    /// Observed cost for the day
    pub cost_amount: Decimal,
    /// Baseline mean over the trailing window
    pub baseline_mean: Decimal,
    /// Observed cost minus baseline mean
    pub deviation: Decimal,
    /// Deviation in baseline standard deviations
    pub z_score: f64,
    /// Severity tier
    pub severity: AnomalySeverity,
}

/// One projected period of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    /// 1-based distance from the last observed period
    pub period_index: usize,
    /// Start date of the projected period
    pub date: NaiveDate,
    /// Trend-only projection
    pub base_cost: Decimal,
    /// Projection after business growth and seasonality
    pub business_adjusted_cost: Decimal,
    /// Adjusted cost times the supplied revenue ratio, if one was supplied
    pub revenue_projection: Option<Decimal>,
    /// Confidence in percent; strictly decreasing with `period_index` unless
    /// the history was too short, in which case it is zero throughout
    pub confidence_level: f64,
}

/// Severity of an optimization suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSeverity {
    /// Worth looking at
    Info,
    /// Needs attention
    Warning,
}

impl fmt::Display for SuggestionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionSeverity::Info => write!(f, "info"),
            SuggestionSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// Which heuristic produced a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    /// One service dominates spend
    Concentration,
    /// Spend is large enough to justify reservations
    Reservation,
    /// Many distinct services in use
    Sprawl,
}

/// A heuristic savings suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSuggestion {
    /// Rule that fired
    pub kind: SuggestionKind,
    /// Short title
    pub title: String,
    /// Longer explanation
    pub description: String,
    /// Severity
    pub severity: SuggestionSeverity,
    /// Estimated savings in the window's currency
    pub potential_savings: Decimal,
}
