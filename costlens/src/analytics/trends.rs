//! Trend statistics
//!
//! Builds ordered period series from cost points, annotates period-over-period
//! growth and derives summary statistics (mean, extremes, overall direction
//! and volatility).
//!
//! Percentages that feed a classification threshold are computed in decimal
//! arithmetic so that boundary values such as exactly 5% classify the same way
//! on every platform.

use super::consolidator::ServiceCanonicalizer;
use super::{
    DataSufficiency, PeriodExtreme, PeriodGranularity, RawCostPoint, TrendDirection, TrendPeriod,
    TrendStatistics, Volatility,
};
use crate::common::numeric::{
    checked_add, checked_sum, decimal_mean, percent_change, population_std_dev, to_f64,
};
use crate::error::{CostLensError, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Half-over-half change above which a series is increasing (below the
/// negation, decreasing)
pub const TREND_THRESHOLD_PCT: Decimal = dec!(5);

/// Coefficient of variation below which volatility is low
pub const LOW_VOLATILITY_CV: f64 = 0.10;

/// Coefficient of variation below which volatility is medium
pub const MEDIUM_VOLATILITY_CV: f64 = 0.25;

/// Periods needed before growth rates exist
pub const MIN_PERIODS_FOR_GROWTH: usize = 2;

/// Bucket cost points into ordered periods
///
/// Service names in the breakdown are canonicalized. Periods with no points
/// are not synthesized. Growth rates are annotated before returning.
pub fn build_periods(
    points: &[RawCostPoint],
    granularity: PeriodGranularity,
    canonicalizer: &ServiceCanonicalizer,
) -> Result<Vec<TrendPeriod>> {
    let mut buckets: BTreeMap<NaiveDate, TrendPeriod> = BTreeMap::new();

    for point in points {
        let start = period_start(point.date, granularity);
        let period = buckets
            .entry(start)
            .or_insert_with(|| TrendPeriod::new(period_label(start, granularity), start, Decimal::ZERO));

        period.total_cost = checked_add(period.total_cost, point.amount, "period total")?;
        let service = period
            .service_breakdown
            .entry(canonicalizer.canonicalize(&point.service_key).into_owned())
            .or_insert(Decimal::ZERO);
        *service = checked_add(*service, point.amount, "period service total")?;
    }

    let mut periods: Vec<TrendPeriod> = buckets.into_values().collect();
    annotate_growth(&mut periods);
    Ok(periods)
}

/// First day of the period containing `date`
pub fn period_start(date: NaiveDate, granularity: PeriodGranularity) -> NaiveDate {
    match granularity {
        PeriodGranularity::Daily => date,
        PeriodGranularity::Monthly => date.with_day(1).unwrap_or(date),
    }
}

/// Label for a period starting at `start`
pub fn period_label(start: NaiveDate, granularity: PeriodGranularity) -> String {
    match granularity {
        PeriodGranularity::Daily => start.format("%Y-%m-%d").to_string(),
        PeriodGranularity::Monthly => start.format("%Y-%m").to_string(),
    }
}

/// Fill in `growth_rate_pct` for every period
///
/// The first period never has a growth rate, and neither does a period whose
/// predecessor cost exactly zero. Returns whether the series was long enough
/// for any growth rate to exist.
pub fn annotate_growth(periods: &mut [TrendPeriod]) -> DataSufficiency {
    let mut previous: Option<Decimal> = None;

    for period in periods.iter_mut() {
        period.growth_rate_pct = previous
            .and_then(|prev| percent_change(period.total_cost, prev))
            .map(to_f64);
        previous = Some(period.total_cost);
    }

    let sufficiency = DataSufficiency::check(MIN_PERIODS_FOR_GROWTH, periods.len());
    if !sufficiency.is_sufficient() {
        tracing::debug!(
            "Growth rates unavailable: {} period(s) supplied",
            periods.len()
        );
    }
    sufficiency
}

/// Classify a half-over-half percentage difference
pub fn classify_trend(diff_pct: Decimal) -> TrendDirection {
    if diff_pct > TREND_THRESHOLD_PCT {
        TrendDirection::Increasing
    } else if diff_pct < -TREND_THRESHOLD_PCT {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Classify a coefficient of variation
pub fn classify_volatility(cv: f64) -> Volatility {
    if cv < LOW_VOLATILITY_CV {
        Volatility::Low
    } else if cv < MEDIUM_VOLATILITY_CV {
        Volatility::Medium
    } else {
        Volatility::High
    }
}

/// Compute summary statistics over periods ordered oldest to newest
pub fn compute_stats(periods: &[TrendPeriod]) -> Result<TrendStatistics> {
    let (first, rest) = periods.split_first().ok_or(CostLensError::InsufficientData {
        required: 1,
        actual: 0,
    })?;

    let totals: Vec<Decimal> = periods.iter().map(|p| p.total_cost).collect();
    let total_cost = checked_sum(totals.iter().copied(), "statistics total")?;
    let avg_monthly_cost = total_cost / Decimal::from(totals.len());

    let mut highest = first;
    let mut lowest = first;
    for period in rest {
        if period.total_cost > highest.total_cost {
            highest = period;
        }
        if period.total_cost < lowest.total_cost {
            lowest = period;
        }
    }

    let (overall_trend, trend_diff) = overall_trend(&totals);

    let values: Vec<f64> = totals.iter().copied().map(to_f64).collect();
    let std_dev = population_std_dev(&values).unwrap_or(0.0);
    let mean_abs = to_f64(avg_monthly_cost).abs();
    let (coefficient_of_variation, volatility) = if mean_abs > 0.0 {
        let cv = std_dev / mean_abs;
        (Some(cv), classify_volatility(cv))
    } else if std_dev > 0.0 {
        // Spend nets to zero but swings around it
        (None, Volatility::High)
    } else {
        (None, Volatility::Low)
    };

    tracing::trace!(
        "Trend over {} periods: {} ({:?}%), volatility {} (cv {:?})",
        periods.len(),
        overall_trend,
        trend_diff,
        volatility,
        coefficient_of_variation
    );

    Ok(TrendStatistics {
        avg_monthly_cost,
        total_cost,
        highest_period: PeriodExtreme {
            period_label: highest.period_label.clone(),
            total_cost: highest.total_cost,
        },
        lowest_period: PeriodExtreme {
            period_label: lowest.period_label.clone(),
            total_cost: lowest.total_cost,
        },
        overall_trend,
        trend_diff_pct: trend_diff.map(to_f64),
        volatility,
        coefficient_of_variation,
        period_count: periods.len(),
        growth_data: DataSufficiency::check(MIN_PERIODS_FOR_GROWTH, periods.len()),
    })
}

/// Compare the mean of the second half with the mean of the first half.
///
/// The first half gets `n / 2` elements. A single value is stable with a zero
/// difference; a zero first-half mean has no defined difference.
fn overall_trend(totals: &[Decimal]) -> (TrendDirection, Option<Decimal>) {
    if totals.len() < 2 {
        return (TrendDirection::Stable, Some(Decimal::ZERO));
    }

    let (first_half, second_half) = totals.split_at(totals.len() / 2);
    let diff = match (decimal_mean(first_half), decimal_mean(second_half)) {
        (Some(first_mean), Some(second_mean)) => percent_change(second_mean, first_mean),
        _ => None,
    };

    match diff {
        Some(diff) => (classify_trend(diff), Some(diff)),
        None => (TrendDirection::Stable, None),
    }
}
