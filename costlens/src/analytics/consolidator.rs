//! Service consolidation
//!
//! Merges normalized cost points into per-service totals. Provider service keys
//! are first mapped to canonical display names by an ordered rule table (first
//! match wins), then summed. Entries summing to exactly zero are dropped and
//! the rest are sorted by absolute cost, descending, with ties keeping the
//! order in which the canonical name first appeared.

use super::{ConsolidatedService, RawCostPoint};
use crate::common::numeric::{checked_add, checked_sum, share_pct};
use crate::error::{CostLensError, Result};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Default chart palette; `color_index` indexes into this modulo its length
pub const DEFAULT_PALETTE: [&str; 20] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
    "#f97316", "#6366f1", "#14b8a6", "#eab308", "#a855f7", "#22c55e", "#0ea5e9", "#e11d48",
    "#64748b", "#d946ef", "#facc15", "#2dd4bf",
];

/// How a rule's pattern is matched against a service key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Pattern is a substring of the key
    #[default]
    Contains,
    /// Pattern equals the key
    Exact,
    /// Key starts with the pattern
    Prefix,
    /// Pattern is a regular expression
    Regex,
}

/// One entry in the canonicalization table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRule {
    /// Text or expression to look for
    pub pattern: String,
    /// Display name to use on a match
    pub canonical_name: String,
    /// Matching mode
    #[serde(default)]
    pub match_kind: MatchKind,
}

impl CanonicalRule {
    /// Create a substring rule
    pub fn contains(pattern: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            canonical_name: canonical_name.into(),
            match_kind: MatchKind::Contains,
        }
    }

    /// The built-in rule table
    pub fn defaults() -> Vec<CanonicalRule> {
        vec![
            CanonicalRule::contains("Simple Storage Service", "Amazon S3"),
            CanonicalRule::contains("Elastic Compute Cloud", "Amazon EC2"),
            CanonicalRule::contains("Data Transfer", "AWS Data Transfer"),
        ]
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Contains(String),
    Exact(String),
    Prefix(String),
    Regex(Regex),
}

impl Matcher {
    fn is_match(&self, key: &str) -> bool {
        match self {
            Matcher::Contains(pattern) => key.contains(pattern.as_str()),
            Matcher::Exact(pattern) => key == pattern,
            Matcher::Prefix(pattern) => key.starts_with(pattern.as_str()),
            Matcher::Regex(regex) => regex.is_match(key),
        }
    }
}

/// Compiled, ordered canonicalization rules
#[derive(Debug, Clone)]
pub struct ServiceCanonicalizer {
    rules: Vec<(Matcher, String)>,
}

impl Default for ServiceCanonicalizer {
    fn default() -> Self {
        Self::new(&CanonicalRule::defaults()).unwrap_or_else(|_| Self { rules: Vec::new() })
    }
}

impl ServiceCanonicalizer {
    /// Compile a rule table
    pub fn new(rules: &[CanonicalRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());

        for rule in rules {
            if rule.pattern.is_empty() {
                return Err(CostLensError::invalid_config(
                    "canonical_rules.pattern",
                    "\"\"",
                    format!("rule for '{}' has an empty pattern", rule.canonical_name),
                ));
            }
            if rule.canonical_name.trim().is_empty() {
                return Err(CostLensError::invalid_config(
                    "canonical_rules.canonical_name",
                    &rule.pattern,
                    "canonical_name cannot be empty",
                ));
            }

            let matcher = match rule.match_kind {
                MatchKind::Contains => Matcher::Contains(rule.pattern.clone()),
                MatchKind::Exact => Matcher::Exact(rule.pattern.clone()),
                MatchKind::Prefix => Matcher::Prefix(rule.pattern.clone()),
                MatchKind::Regex => Matcher::Regex(Regex::new(&rule.pattern).map_err(|source| {
                    CostLensError::InvalidRule {
                        pattern: rule.pattern.clone(),
                        source,
                    }
                })?),
            };
            compiled.push((matcher, rule.canonical_name.clone()));
        }

        Ok(Self { rules: compiled })
    }

    /// Map a provider key to its canonical name; unmatched keys pass through
    pub fn canonicalize<'a>(&'a self, service_key: &'a str) -> Cow<'a, str> {
        self.rules
            .iter()
            .find(|(matcher, _)| matcher.is_match(service_key))
            .map(|(_, name)| Cow::Borrowed(name.as_str()))
            .unwrap_or(Cow::Borrowed(service_key))
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Result of consolidating a window of cost points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consolidation {
    /// Services sorted by absolute cost, descending
    pub services: Vec<ConsolidatedService>,
    /// Running total over every input point
    pub total_cost: Decimal,
}

impl Consolidation {
    /// Sum of the consolidated service totals
    pub fn services_total(&self) -> Result<Decimal> {
        checked_sum(self.services.iter().map(|s| s.total_cost), "services total")
    }

    /// The most expensive service, if any
    pub fn top_service(&self) -> Option<&ConsolidatedService> {
        self.services.first()
    }
}

/// Merges cost points into per-service totals
#[derive(Debug, Clone)]
pub struct ServiceConsolidator {
    canonicalizer: ServiceCanonicalizer,
    palette_size: usize,
}

impl Default for ServiceConsolidator {
    fn default() -> Self {
        Self {
            canonicalizer: ServiceCanonicalizer::default(),
            palette_size: DEFAULT_PALETTE.len(),
        }
    }
}

impl ServiceConsolidator {
    /// Create a consolidator; `palette_size` must be positive
    pub fn new(canonicalizer: ServiceCanonicalizer, palette_size: usize) -> Result<Self> {
        if palette_size == 0 {
            return Err(CostLensError::invalid_config(
                "palette",
                0,
                "the colour palette needs at least one entry",
            ));
        }
        Ok(Self {
            canonicalizer,
            palette_size,
        })
    }

    /// The canonicalizer in use
    pub fn canonicalizer(&self) -> &ServiceCanonicalizer {
        &self.canonicalizer
    }

    /// Consolidate a window of cost points
    ///
    /// Fails with [`CostLensError::Overflow`] if a total leaves the decimal range.
    pub fn consolidate(&self, points: &[RawCostPoint]) -> Result<Consolidation> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut totals: Vec<(String, Decimal)> = Vec::new();
        let mut running_total = Decimal::ZERO;

        for point in points {
            running_total = checked_add(running_total, point.amount, "running total")?;
            let name = self.canonicalizer.canonicalize(&point.service_key);
            match index.get(name.as_ref()) {
                Some(&slot) => {
                    totals[slot].1 = checked_add(totals[slot].1, point.amount, "service total")?
                }
                None => {
                    index.insert(name.to_string(), totals.len());
                    totals.push((name.into_owned(), point.amount));
                }
            }
        }

        let before = totals.len();
        totals.retain(|(_, total)| !total.is_zero());
        if totals.len() < before {
            tracing::debug!("Dropped {} services with zero net cost", before - totals.len());
        }

        // Stable sort: equal magnitudes keep first-seen order
        totals.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()));

        let services = totals
            .into_iter()
            .enumerate()
            .map(|(i, (display_name, total_cost))| ConsolidatedService {
                percentage: share_pct(total_cost, running_total),
                display_name,
                total_cost,
                color_index: i % self.palette_size,
            })
            .collect();

        Ok(Consolidation {
            services,
            total_cost: running_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn point(key: &str, amount: Decimal) -> RawCostPoint {
        RawCostPoint::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            key,
            amount,
            "USD",
        )
    }

    #[test]
    fn test_default_rules_canonicalize() {
        let canonicalizer = ServiceCanonicalizer::default();
        assert_eq!(
            canonicalizer.canonicalize("Amazon Simple Storage Service"),
            "Amazon S3"
        );
        assert_eq!(
            canonicalizer.canonicalize("Amazon Elastic Compute Cloud - Compute"),
            "Amazon EC2"
        );
        assert_eq!(
            canonicalizer.canonicalize("AWS Data Transfer"),
            "AWS Data Transfer"
        );
        assert_eq!(canonicalizer.canonicalize("Amazon RDS"), "Amazon RDS");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            CanonicalRule::contains("Data Transfer", "AWS Data Transfer"),
            CanonicalRule::contains("Elastic Compute Cloud", "Amazon EC2"),
        ];
        let canonicalizer = ServiceCanonicalizer::new(&rules).unwrap();
        assert_eq!(
            canonicalizer.canonicalize("Elastic Compute Cloud Data Transfer"),
            "AWS Data Transfer"
        );
    }

    #[test]
    fn test_regex_and_exact_rules() {
        let rules = vec![
            CanonicalRule {
                pattern: r"^Amazon (RDS|Relational Database).*".to_string(),
                canonical_name: "Amazon RDS".to_string(),
                match_kind: MatchKind::Regex,
            },
            CanonicalRule {
                pattern: "Tax".to_string(),
                canonical_name: "Taxes".to_string(),
                match_kind: MatchKind::Exact,
            },
        ];
        let canonicalizer = ServiceCanonicalizer::new(&rules).unwrap();
        assert_eq!(
            canonicalizer.canonicalize("Amazon Relational Database Service"),
            "Amazon RDS"
        );
        assert_eq!(canonicalizer.canonicalize("Tax"), "Taxes");
        assert_eq!(canonicalizer.canonicalize("Taxes and fees"), "Taxes and fees");
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let rules = vec![CanonicalRule {
            pattern: "(unclosed".to_string(),
            canonical_name: "X".to_string(),
            match_kind: MatchKind::Regex,
        }];
        assert!(matches!(
            ServiceCanonicalizer::new(&rules),
            Err(CostLensError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_consolidate_merges_and_sorts() {
        let points = vec![
            point("Amazon Simple Storage Service", dec!(10)),
            point("Amazon Elastic Compute Cloud - Compute", dec!(40)),
            point("Amazon S3 Glacier Simple Storage Service", dec!(15)),
            point("AWS Lambda", dec!(-30)),
            point("Amazon RDS", dec!(5)),
            point("Amazon RDS", dec!(-5)),
        ];

        let consolidation = ServiceConsolidator::default().consolidate(&points).unwrap();
        let names: Vec<_> = consolidation
            .services
            .iter()
            .map(|s| (s.display_name.as_str(), s.total_cost, s.color_index))
            .collect();

        assert_eq!(
            names,
            vec![
                ("Amazon EC2", dec!(40), 0),
                ("AWS Lambda", dec!(-30), 1),
                ("Amazon S3", dec!(25), 2),
            ]
        );
        assert_eq!(consolidation.total_cost, dec!(35));
        assert_eq!(consolidation.services_total().unwrap(), consolidation.total_cost);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let points = vec![
            point("Beta", dec!(10)),
            point("Alpha", dec!(-10)),
            point("Gamma", dec!(10)),
        ];
        let consolidation = ServiceConsolidator::default().consolidate(&points).unwrap();
        let names: Vec<_> = consolidation
            .services
            .iter()
            .map(|s| s.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Beta", "Alpha", "Gamma"]);
    }

    #[test]
    fn test_color_index_wraps_palette() {
        let points: Vec<_> = (1..=5)
            .map(|i| point(&format!("svc-{}", i), Decimal::from(100 - i)))
            .collect();
        let consolidator = ServiceConsolidator::new(ServiceCanonicalizer::default(), 2).unwrap();
        let indices: Vec<_> = consolidator
            .consolidate(&points)
            .unwrap()
            .services
            .iter()
            .map(|s| s.color_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_zero_palette_rejected() {
        assert!(ServiceConsolidator::new(ServiceCanonicalizer::default(), 0).is_err());
    }

    #[test]
    fn test_percentage_of_total() {
        let points = vec![point("A", dec!(75)), point("B", dec!(25))];
        let consolidation = ServiceConsolidator::default().consolidate(&points).unwrap();
        assert!((consolidation.services[0].percentage - 75.0).abs() < 1e-9);
        assert!((consolidation.services[1].percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_beyond_decimal_range_is_overflow() {
        let huge = Decimal::from_scientific("5e28").unwrap();
        let points = vec![point("A", huge), point("A", huge)];
        assert!(matches!(
            ServiceConsolidator::default().consolidate(&points),
            Err(CostLensError::Overflow { .. })
        ));

        let split = vec![point("A", huge), point("B", -huge), point("C", huge)];
        let consolidation = ServiceConsolidator::default().consolidate(&split).unwrap();
        assert_eq!(consolidation.total_cost, huge);
    }

    #[test]
    fn test_empty_input() {
        let consolidation = ServiceConsolidator::default().consolidate(&[]).unwrap();
        assert!(consolidation.services.is_empty());
        assert_eq!(consolidation.total_cost, Decimal::ZERO);
        assert!(consolidation.top_service().is_none());
    }
}
