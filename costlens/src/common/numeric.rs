//! Numeric helpers bridging decimal money values and floating point statistics
//!
//! Money stays in [`Decimal`] so sums are exact. Square roots, ratios and
//! scores are computed in `f64` and must never leak NaN or infinity into
//! results; every helper here returns `None` instead.

use crate::error::{CostLensError, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Convert a decimal to `f64`, saturating to zero if it does not fit
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Convert a finite `f64` to a decimal
pub fn from_f64(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

/// `total + amount`, failing with [`CostLensError::Overflow`] instead of panicking
pub fn checked_add(total: Decimal, amount: Decimal, operation: &str) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| CostLensError::overflow(operation))
}

/// Sum of `values`, failing with [`CostLensError::Overflow`] instead of panicking
pub fn checked_sum<I>(values: I, operation: &str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| checked_add(total, value, operation))
}

/// Arithmetic mean of a decimal slice; `None` if empty or the sum overflows
pub fn decimal_mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(*value))?;
    sum.checked_div(Decimal::from(values.len()))
}

/// Arithmetic mean of an `f64` slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`)
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// `(current - previous) / previous * 100`, or `None` for a zero baseline
pub fn percent_change(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    current
        .checked_sub(previous)?
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
}

/// `part / whole * 100` as `f64`, zero when `whole` is zero
pub fn share_pct(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    part.checked_div(whole)
        .map(|ratio| to_f64(ratio) * 100.0)
        .unwrap_or(0.0)
}
