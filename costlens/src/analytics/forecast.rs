//! Forecast and scenario engine
//!
//! Projects future period costs by compounding the mean historical growth
//! rate from the last observed period, then layers business multipliers and
//! an optional seasonal index on top. Scenarios re-run the same projection
//! with their own multipliers and are compared against the neutral forecast.

use super::trends::annotate_growth;
use super::{DataSufficiency, ForecastPeriod, PeriodGranularity, TrendPeriod};
use crate::common::numeric::{checked_sum, from_f64, mean, population_std_dev, to_f64};
use crate::error::{CostLensError, Result};
use chrono::{Duration, Months, NaiveDate};
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places kept on projected money values
const MONEY_SCALE: u32 = 4;

/// Decimal places kept on multipliers derived from `f64`
const FACTOR_SCALE: u32 = 8;

/// Number of periods to project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ForecastHorizon {
    /// Three periods
    Three,
    /// Six periods
    #[default]
    Six,
    /// Twelve periods
    Twelve,
}

impl ForecastHorizon {
    /// Every supported horizon
    pub const ALL: [ForecastHorizon; 3] = [Self::Three, Self::Six, Self::Twelve];

    /// Number of periods the horizon covers
    pub fn periods(self) -> u32 {
        match self {
            Self::Three => 3,
            Self::Six => 6,
            Self::Twelve => 12,
        }
    }
}

impl TryFrom<u32> for ForecastHorizon {
    type Error = CostLensError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            3 => Ok(Self::Three),
            6 => Ok(Self::Six),
            12 => Ok(Self::Twelve),
            other => Err(CostLensError::invalid_config(
                "horizon_months",
                other,
                "horizon must be 3, 6 or 12 periods",
            )),
        }
    }
}

impl From<ForecastHorizon> for u32 {
    fn from(horizon: ForecastHorizon) -> Self {
        horizon.periods()
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.periods())
    }
}

/// Tunables for forecasting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of periods to project
    pub horizon_months: ForecastHorizon,
    /// Apply a seasonal index learned from history
    pub seasonality_enabled: bool,
    /// Periods per seasonal cycle
    pub season_length: usize,
    /// Per-period multiplier applied to confidence
    pub confidence_decay: f64,
    /// Confidence ceiling in percent
    pub max_confidence: f64,
    /// History length at which coverage no longer limits confidence
    pub full_confidence_periods: usize,
    /// Revenue earned per dollar of spend, if known
    pub revenue_per_dollar: Option<Decimal>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_months: ForecastHorizon::default(),
            seasonality_enabled: false,
            season_length: 12,
            confidence_decay: 0.9,
            max_confidence: 95.0,
            full_confidence_periods: 6,
            revenue_per_dollar: None,
        }
    }
}

impl ForecastConfig {
    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.season_length < 2 {
            return Err(CostLensError::invalid_config(
                "forecast.season_length",
                self.season_length,
                "a seasonal cycle needs at least 2 periods",
            ));
        }
        if !(self.confidence_decay > 0.0 && self.confidence_decay < 1.0) {
            return Err(CostLensError::invalid_config(
                "forecast.confidence_decay",
                self.confidence_decay,
                "decay must be strictly between 0 and 1",
            ));
        }
        if !(self.max_confidence > 0.0 && self.max_confidence <= 100.0) {
            return Err(CostLensError::invalid_config(
                "forecast.max_confidence",
                self.max_confidence,
                "confidence ceiling must be in (0, 100]",
            ));
        }
        if self.full_confidence_periods == 0 {
            return Err(CostLensError::invalid_config(
                "forecast.full_confidence_periods",
                self.full_confidence_periods,
                "must be at least 1",
            ));
        }
        if let Some(ratio) = self.revenue_per_dollar {
            if ratio.is_sign_negative() {
                return Err(CostLensError::invalid_config(
                    "forecast.revenue_per_dollar",
                    ratio,
                    "revenue ratio cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

/// Multipliers applied on top of the trend projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessFactors {
    /// Anticipated business growth multiplier
    pub business_growth_factor: f64,
    /// Seasonal multiplier
    pub seasonality_multiplier: f64,
}

impl Default for BusinessFactors {
    fn default() -> Self {
        Self {
            business_growth_factor: 1.0,
            seasonality_multiplier: 1.0,
        }
    }
}

impl BusinessFactors {
    /// Create business factors
    pub fn new(business_growth_factor: f64, seasonality_multiplier: f64) -> Self {
        Self {
            business_growth_factor,
            seasonality_multiplier,
        }
    }

    /// Both factors must be positive and finite
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("businessGrowthFactor", self.business_growth_factor),
            ("seasonalityMultiplier", self.seasonality_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CostLensError::invalid_config(
                    name,
                    value,
                    "multipliers must be positive finite numbers (1.0 is neutral)",
                ));
            }
        }
        Ok(())
    }

    fn combined(&self) -> Result<Decimal> {
        let growth = factor_to_decimal("businessGrowthFactor", self.business_growth_factor)?;
        let season = factor_to_decimal("seasonalityMultiplier", self.seasonality_multiplier)?;
        growth
            .checked_mul(season)
            .ok_or_else(|| CostLensError::overflow("business multiplier"))
    }
}

/// Totals and inputs behind a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetrics {
    /// Sum of trend-only projections
    pub total_base_cost: Decimal,
    /// Sum of business-adjusted projections
    pub total_adjusted_cost: Decimal,
    /// Sum of revenue projections, if a revenue ratio was supplied
    pub total_revenue: Option<Decimal>,
    /// Mean historical growth rate per period used for compounding
    pub growth_rate_pct: f64,
    /// Number of historical periods the forecast was derived from
    pub history_periods: usize,
    /// Whether a seasonal index was applied
    pub seasonal_adjustment: bool,
}

/// Projected periods plus summary metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    /// Horizon that was projected
    pub horizon: ForecastHorizon,
    /// One entry per projected period
    pub periods: Vec<ForecastPeriod>,
    /// Totals and derivation inputs
    pub business_metrics: BusinessMetrics,
    /// Confidence in the trend itself, before per-period decay; zero when
    /// no growth rate could be derived
    pub confidence: f64,
    /// Whether at least one period-over-period growth rate was defined;
    /// counts are growth rates, not periods
    pub history: DataSufficiency,
}

/// A what-if definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    /// Scenario name
    pub name: String,
    /// Business growth multiplier
    pub business_growth_factor: f64,
    /// Seasonal multiplier
    pub seasonality_multiplier: f64,
    /// Qualitative description of the external conditions
    pub external_factors: String,
}

impl ScenarioInput {
    /// Create a scenario definition
    pub fn new(
        name: impl Into<String>,
        business_growth_factor: f64,
        seasonality_multiplier: f64,
        external_factors: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            business_growth_factor,
            seasonality_multiplier,
            external_factors: external_factors.into(),
        }
    }

    /// The standard what-if set
    pub fn presets() -> Vec<ScenarioInput> {
        vec![
            Self::new("Conservative Growth", 1.05, 1.0, "Steady demand, no new markets"),
            Self::new("Aggressive Expansion", 1.3, 1.1, "New regions and product launches"),
            Self::new("Cost Optimization", 0.85, 1.0, "Rightsizing and reserved capacity"),
            Self::new("Economic Downturn", 0.9, 0.95, "Reduced customer demand"),
        ]
    }

    fn factors(&self) -> BusinessFactors {
        BusinessFactors::new(self.business_growth_factor, self.seasonality_multiplier)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CostLensError::invalid_config(
                "scenario.name",
                "\"\"",
                "every scenario needs a name",
            ));
        }
        self.factors().validate()
    }
}

impl FromStr for ScenarioInput {
    type Err = CostLensError;

    /// Parse `NAME:GROWTH:SEASONALITY[:LABEL]`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(4, ':');
        let name = parts.next().unwrap_or_default().trim();
        let growth = parts.next();
        let season = parts.next();
        let label = parts.next().unwrap_or_default().trim();

        let parse_factor = |raw: Option<&str>, field: &str| -> Result<f64> {
            raw.and_then(|value| value.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    CostLensError::invalid_config(
                        format!("scenario.{}", field),
                        s,
                        "expected NAME:GROWTH:SEASONALITY[:LABEL], e.g. Expansion:1.2:1.0:New region",
                    )
                })
        };

        let scenario = Self::new(
            name,
            parse_factor(growth, "growth")?,
            parse_factor(season, "seasonality")?,
            label,
        );
        scenario.validate()?;
        Ok(scenario)
    }
}

/// Cost totals of a scenario against the neutral forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetrics {
    /// Sum of the scenario's business-adjusted projections
    pub total_projected_cost: Decimal,
    /// Scenario total minus neutral forecast total
    pub cost_variance: Decimal,
}

/// Direction of a scenario's impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactDirection {
    /// Scenario costs more than the neutral forecast
    Increase,
    /// Scenario costs the same or less
    Decrease,
}

impl fmt::Display for ImpactDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactDirection::Increase => write!(f, "increase"),
            ImpactDirection::Decrease => write!(f, "decrease"),
        }
    }
}

/// Relative impact of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioImpact {
    /// Whether the scenario raises or lowers cost
    pub direction: ImpactDirection,
    /// Variance as a percentage of the neutral total; zero for a zero total
    pub percentage_impact: f64,
}

/// An evaluated what-if scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Business growth multiplier
    pub business_growth_factor: f64,
    /// Seasonal multiplier
    pub seasonality_multiplier: f64,
    /// Qualitative description of the external conditions
    pub external_factors: String,
    /// Projected periods under this scenario
    pub periods: Vec<ForecastPeriod>,
    /// Totals against the neutral forecast
    pub metrics: ScenarioMetrics,
    /// Direction and size of the change
    pub impact: ScenarioImpact,
}

/// Produces forecasts and evaluates scenarios
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
    granularity: PeriodGranularity,
}

impl ForecastEngine {
    /// Create an engine, validating the configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            granularity: PeriodGranularity::default(),
        })
    }

    /// Set the width of projected periods
    pub fn with_granularity(mut self, granularity: PeriodGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast with the configured horizon and seasonality and neutral factors
    pub fn forecast(&self, history: &[TrendPeriod]) -> Result<Forecast> {
        self.forecast_with(
            history,
            self.config.horizon_months,
            self.config.seasonality_enabled,
            &BusinessFactors::default(),
        )
    }

    /// Forecast with explicit horizon, seasonality and business factors
    ///
    /// `history` must be ordered oldest to newest. A history without any
    /// defined growth rate (a single period, or only zero baselines) yields a
    /// flat projection with zero confidence; an empty history is an error.
    pub fn forecast_with(
        &self,
        history: &[TrendPeriod],
        horizon: ForecastHorizon,
        seasonality_enabled: bool,
        factors: &BusinessFactors,
    ) -> Result<Forecast> {
        factors.validate()?;
        let last = history.last().ok_or(CostLensError::InsufficientData {
            required: 1,
            actual: 0,
        })?;

        let totals: Vec<f64> = history.iter().map(|p| to_f64(p.total_cost)).collect();
        let rates = growth_rates(history);
        let sufficiency = DataSufficiency::check(1, rates.len());
        let (growth_rate_pct, confidence) = match mean(&rates) {
            Some(rate) => (rate, self.base_confidence(&totals)),
            None => {
                tracing::debug!(
                    "No defined growth rate across {} history periods; projecting flat",
                    history.len()
                );
                (0.0, 0.0)
            }
        };

        let step = from_f64(growth_rate_pct / 100.0)
            .and_then(|rate| Decimal::ONE.checked_add(rate.round_dp(FACTOR_SCALE)))
            .ok_or_else(|| CostLensError::overflow("growth step"))?;
        let business = factors.combined()?;
        let seasonal = if seasonality_enabled {
            self.seasonal_indices(&totals)
        } else {
            None
        };

        tracing::debug!(
            "Forecasting {} periods from {} history periods (growth {:.2}%, confidence {:.1})",
            horizon,
            history.len(),
            growth_rate_pct,
            confidence
        );

        let mut base = last.total_cost;
        let mut periods = Vec::with_capacity(horizon.periods() as usize);
        for index in 1..=horizon.periods() as usize {
            base = base.checked_mul(step).ok_or_else(|| overflow("base projection"))?;

            let mut multiplier = business;
            if let Some(indices) = &seasonal {
                let position = (history.len() - 1 + index) % indices.len();
                multiplier = multiplier
                    .checked_mul(factor_to_decimal("seasonalIndex", indices[position])?)
                    .ok_or_else(|| overflow("seasonal multiplier"))?;
            }
            let adjusted = base
                .checked_mul(multiplier)
                .ok_or_else(|| overflow("business-adjusted projection"))?;

            let revenue_projection = match self.config.revenue_per_dollar {
                Some(ratio) => Some(
                    adjusted
                        .checked_mul(ratio)
                        .ok_or_else(|| overflow("revenue projection"))?
                        .round_dp(MONEY_SCALE)
                        .normalize(),
                ),
                None => None,
            };

            periods.push(ForecastPeriod {
                period_index: index,
                date: self.step_date(last.period_start, index)?,
                base_cost: base.round_dp(MONEY_SCALE).normalize(),
                business_adjusted_cost: adjusted.round_dp(MONEY_SCALE).normalize(),
                revenue_projection,
                confidence_level: (confidence * self.config.confidence_decay.powi(index as i32))
                    .clamp(0.0, 100.0),
            });
        }

        let total_revenue = match self.config.revenue_per_dollar {
            Some(_) => Some(checked_sum(
                periods.iter().filter_map(|p| p.revenue_projection),
                "total revenue",
            )?),
            None => None,
        };
        let business_metrics = BusinessMetrics {
            total_base_cost: checked_sum(periods.iter().map(|p| p.base_cost), "total base cost")?,
            total_adjusted_cost: checked_sum(
                periods.iter().map(|p| p.business_adjusted_cost),
                "total adjusted cost",
            )?,
            total_revenue,
            growth_rate_pct,
            history_periods: history.len(),
            seasonal_adjustment: seasonal.is_some(),
        };

        Ok(Forecast {
            horizon,
            periods,
            business_metrics,
            confidence,
            history: sufficiency,
        })
    }

    /// Evaluate each scenario against the neutral forecast
    ///
    /// Scenarios are independent of each other and are evaluated in
    /// parallel; the output keeps the input order.
    pub fn run_scenarios(
        &self,
        history: &[TrendPeriod],
        scenarios: &[ScenarioInput],
    ) -> Result<Vec<Scenario>> {
        let base = self.forecast(history)?;
        let base_total = base.business_metrics.total_adjusted_cost;

        scenarios
            .par_iter()
            .map(|input| {
                input.validate()?;
                let projected = self.forecast_with(
                    history,
                    self.config.horizon_months,
                    self.config.seasonality_enabled,
                    &input.factors(),
                )?;
                let total = projected.business_metrics.total_adjusted_cost;
                let variance = total
                    .checked_sub(base_total)
                    .ok_or_else(|| overflow("scenario variance"))?;
                let percentage_impact = if base_total.is_zero() {
                    0.0
                } else {
                    variance
                        .checked_div(base_total)
                        .and_then(|ratio| ratio.checked_mul(dec!(100)))
                        .map(to_f64)
                        .unwrap_or(0.0)
                };
                let direction = if variance > Decimal::ZERO {
                    ImpactDirection::Increase
                } else {
                    ImpactDirection::Decrease
                };

                tracing::trace!(
                    "Scenario '{}': total {} ({} {:.2}%)",
                    input.name,
                    total,
                    direction,
                    percentage_impact
                );

                Ok(Scenario {
                    name: input.name.clone(),
                    business_growth_factor: input.business_growth_factor,
                    seasonality_multiplier: input.seasonality_multiplier,
                    external_factors: input.external_factors.clone(),
                    periods: projected.periods,
                    metrics: ScenarioMetrics {
                        total_projected_cost: total,
                        cost_variance: variance,
                    },
                    impact: ScenarioImpact {
                        direction,
                        percentage_impact,
                    },
                })
            })
            .collect()
    }

    /// Confidence in the trend: limited by history coverage and dampened by
    /// volatility. Zero below two periods.
    fn base_confidence(&self, totals: &[f64]) -> f64 {
        let n = totals.len();
        if n < 2 {
            return 0.0;
        }
        let coverage = ((n - 1) as f64 / self.config.full_confidence_periods as f64).min(1.0);
        let cv = match (mean(totals), population_std_dev(totals)) {
            (Some(avg), Some(std_dev)) if avg.abs() > 0.0 => std_dev / avg.abs(),
            _ => 0.0,
        };
        (self.config.max_confidence * coverage / (1.0 + cv)).clamp(0.0, 100.0)
    }

    /// Mean at each seasonal position over the overall mean, once a full
    /// cycle of history exists
    fn seasonal_indices(&self, totals: &[f64]) -> Option<Vec<f64>> {
        let season = self.config.season_length;
        if totals.len() < season {
            return None;
        }
        let overall = mean(totals)?;
        if overall.abs() < f64::EPSILON {
            return None;
        }
        Some(
            (0..season)
                .map(|position| {
                    let at_position: Vec<f64> =
                        totals.iter().skip(position).step_by(season).copied().collect();
                    mean(&at_position).map_or(1.0, |avg| avg / overall)
                })
                .collect(),
        )
    }

    fn step_date(&self, last: NaiveDate, index: usize) -> Result<NaiveDate> {
        let stepped = match self.granularity {
            PeriodGranularity::Monthly => u32::try_from(index)
                .ok()
                .and_then(|months| last.checked_add_months(Months::new(months))),
            PeriodGranularity::Daily => i64::try_from(index)
                .ok()
                .and_then(|days| last.checked_add_signed(Duration::days(days))),
        };
        stepped.ok_or_else(|| overflow("forecast date"))
    }
}

/// Forecast with default settings
pub fn forecast(
    history: &[TrendPeriod],
    horizon_months: u32,
    seasonality_enabled: bool,
) -> Result<Forecast> {
    ForecastEngine::default().forecast_with(
        history,
        ForecastHorizon::try_from(horizon_months)?,
        seasonality_enabled,
        &BusinessFactors::default(),
    )
}

/// Evaluate scenarios with default settings
pub fn run_scenarios(history: &[TrendPeriod], scenarios: &[ScenarioInput]) -> Result<Vec<Scenario>> {
    ForecastEngine::default().run_scenarios(history, scenarios)
}

/// Growth rates that are defined, skipping the first period and zero baselines
fn growth_rates(history: &[TrendPeriod]) -> Vec<f64> {
    let mut periods = history.to_vec();
    annotate_growth(&mut periods);
    periods.iter().filter_map(|p| p.growth_rate_pct).collect()
}

fn factor_to_decimal(name: &str, value: f64) -> Result<Decimal> {
    from_f64(value)
        .map(|factor| factor.round_dp(FACTOR_SCALE))
        .ok_or_else(|| {
            CostLensError::invalid_config(name, value, "multiplier is not a representable number")
        })
}

fn overflow(operation: &str) -> CostLensError {
    CostLensError::overflow(operation)
}
