//! Heuristic optimization suggestions
//!
//! Each rule inspects the consolidated services of a window and may emit one
//! suggestion. Rules are independent; every applicable rule fires and output
//! follows rule declaration order.

use super::{ConsolidatedService, OptimizationSuggestion, SuggestionKind, SuggestionSeverity};
use crate::common::numeric::share_pct;
use crate::error::{CostLensError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Thresholds and savings rates of the built-in rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Top service share of total, in percent, above which concentration fires
    pub concentration_share_pct: Decimal,
    /// Fraction of the top service's cost estimated as savings
    pub concentration_savings_rate: Decimal,
    /// Total cost above which reservations are suggested
    pub reservation_min_total: Decimal,
    /// Fraction of total cost estimated as reservation savings
    pub reservation_savings_rate: Decimal,
    /// Service count above which sprawl fires
    pub sprawl_max_services: usize,
    /// Fraction of total cost estimated as consolidation savings
    pub sprawl_savings_rate: Decimal,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            concentration_share_pct: dec!(30),
            concentration_savings_rate: dec!(0.20),
            reservation_min_total: dec!(100),
            reservation_savings_rate: dec!(0.30),
            sprawl_max_services: 5,
            sprawl_savings_rate: dec!(0.15),
        }
    }
}

impl SuggestionConfig {
    /// Savings rates must lie in [0, 1]; thresholds must not be negative
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("suggestions.concentration_savings_rate", self.concentration_savings_rate),
            ("suggestions.reservation_savings_rate", self.reservation_savings_rate),
            ("suggestions.sprawl_savings_rate", self.sprawl_savings_rate),
        ] {
            if rate.is_sign_negative() || rate > Decimal::ONE {
                return Err(CostLensError::invalid_config(
                    name,
                    rate,
                    "savings rates are fractions between 0 and 1",
                ));
            }
        }
        if self.concentration_share_pct.is_sign_negative()
            || self.concentration_share_pct > dec!(100)
        {
            return Err(CostLensError::invalid_config(
                "suggestions.concentration_share_pct",
                self.concentration_share_pct,
                "share threshold is a percentage between 0 and 100",
            ));
        }
        if self.reservation_min_total.is_sign_negative() {
            return Err(CostLensError::invalid_config(
                "suggestions.reservation_min_total",
                self.reservation_min_total,
                "threshold cannot be negative",
            ));
        }
        Ok(())
    }
}

/// A single suggestion heuristic
pub trait SuggestionRule: Send + Sync + Debug {
    /// Which heuristic this is
    fn kind(&self) -> SuggestionKind;

    /// Evaluate against a window's services
    fn evaluate(
        &self,
        services: &[ConsolidatedService],
        total_cost: Decimal,
    ) -> Option<OptimizationSuggestion>;
}

/// Flags a single service dominating spend
#[derive(Debug)]
struct ConcentrationRule {
    share_pct: Decimal,
    savings_rate: Decimal,
}

impl SuggestionRule for ConcentrationRule {
    fn kind(&self) -> SuggestionKind {
        SuggestionKind::Concentration
    }

    fn evaluate(
        &self,
        services: &[ConsolidatedService],
        total_cost: Decimal,
    ) -> Option<OptimizationSuggestion> {
        let top = services
            .iter()
            .reduce(|best, s| if s.total_cost > best.total_cost { s } else { best })?;
        // Scale down first; share_pct <= 100 keeps the product within range
        if top.total_cost <= total_cost / dec!(100) * self.share_pct {
            return None;
        }
        Some(OptimizationSuggestion {
            kind: self.kind(),
            title: format!("High usage: {}", top.display_name),
            description: format!(
                "{} accounts for {:.1}% of total spend. Review instance sizing and usage patterns.",
                top.display_name,
                share_pct(top.total_cost, total_cost)
            ),
            severity: SuggestionSeverity::Warning,
            potential_savings: top.total_cost * self.savings_rate,
        })
    }
}

/// Suggests reserved capacity once spend is large enough
#[derive(Debug)]
struct ReservationRule {
    min_total: Decimal,
    savings_rate: Decimal,
}

impl SuggestionRule for ReservationRule {
    fn kind(&self) -> SuggestionKind {
        SuggestionKind::Reservation
    }

    fn evaluate(
        &self,
        _services: &[ConsolidatedService],
        total_cost: Decimal,
    ) -> Option<OptimizationSuggestion> {
        if total_cost <= self.min_total {
            return None;
        }
        Some(OptimizationSuggestion {
            kind: self.kind(),
            title: "Reserved capacity opportunity".to_string(),
            description: "Steady workloads could move to reserved instances or savings plans."
                .to_string(),
            severity: SuggestionSeverity::Info,
            potential_savings: total_cost * self.savings_rate,
        })
    }
}

/// Flags many distinct services in use
#[derive(Debug)]
struct SprawlRule {
    max_services: usize,
    savings_rate: Decimal,
}

impl SuggestionRule for SprawlRule {
    fn kind(&self) -> SuggestionKind {
        SuggestionKind::Sprawl
    }

    fn evaluate(
        &self,
        services: &[ConsolidatedService],
        total_cost: Decimal,
    ) -> Option<OptimizationSuggestion> {
        if services.len() <= self.max_services {
            return None;
        }
        Some(OptimizationSuggestion {
            kind: self.kind(),
            title: "Service sprawl".to_string(),
            description: format!(
                "{} services in use. Consolidating overlapping services can reduce overhead.",
                services.len()
            ),
            severity: SuggestionSeverity::Info,
            potential_savings: total_cost * self.savings_rate,
        })
    }
}

/// Runs the suggestion rules in declaration order
#[derive(Debug)]
pub struct SuggestionEngine {
    rules: Vec<Box<dyn SuggestionRule>>,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::from_config(&SuggestionConfig::default())
    }
}

impl SuggestionEngine {
    /// Create an engine from validated thresholds
    pub fn new(config: &SuggestionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: &SuggestionConfig) -> Self {
        Self {
            rules: vec![
                Box::new(ConcentrationRule {
                    share_pct: config.concentration_share_pct,
                    savings_rate: config.concentration_savings_rate,
                }),
                Box::new(ReservationRule {
                    min_total: config.reservation_min_total,
                    savings_rate: config.reservation_savings_rate,
                }),
                Box::new(SprawlRule {
                    max_services: config.sprawl_max_services,
                    savings_rate: config.sprawl_savings_rate,
                }),
            ],
        }
    }

    /// Append a custom rule after the built-in ones
    pub fn with_rule(mut self, rule: Box<dyn SuggestionRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Evaluate every rule against `services` (ordered highest cost first)
    pub fn suggest(
        &self,
        services: &[ConsolidatedService],
        total_cost: Decimal,
    ) -> Vec<OptimizationSuggestion> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let suggestion = rule.evaluate(services, total_cost);
                tracing::trace!("Rule {:?} fired: {}", rule.kind(), suggestion.is_some());
                suggestion
            })
            .collect()
    }
}
