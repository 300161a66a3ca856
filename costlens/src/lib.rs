//! # CostLens
//!
//! Cost analytics and forecasting for cloud billing time series.
//!
//! ## Features
//!
//! - **Normalization**: Flatten Cost Explorer shaped responses into cost points
//! - **Consolidation**: Canonical per-service totals with stable colour indices
//! - **Trends**: Growth rates, trend direction and volatility
//! - **Anomalies**: Rolling-baseline z-score detection with severity tiers
//! - **Forecasts**: Compounded projections, business factors and scenarios
//! - **Suggestions**: Heuristic savings opportunities
//!
//! ## Quick Start
//!
//! ```rust
//! use costlens::{CostAnalyzer, CostExplorerResponse, EngineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = r#"{"ResultsByTime": [{
//!     "TimePeriod": {"Start": "2024-01-01", "End": "2024-02-01"},
//!     "Groups": [{
//!         "Keys": ["Amazon Simple Storage Service"],
//!         "Metrics": {"BlendedCost": {"Amount": "12.5", "Unit": "USD"}}
//!     }]
//! }]}"#;
//!
//! let response: CostExplorerResponse = serde_json::from_str(raw)?;
//! let analyzer = CostAnalyzer::new(EngineConfig::default())?;
//! let analysis = analyzer.analyze(&response)?;
//!
//! assert_eq!(analysis.services[0].display_name, "Amazon S3");
//! assert!(!analysis.has_growth_data());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Analytics stages: normalizer, consolidator, trends, anomalies, forecasts
/// and suggestions
pub mod analytics;

/// Shared helpers
pub mod common;

/// Layered engine configuration
pub mod config;

/// Analyzer façade running the full pipeline
pub mod engine;

/// Error types
pub mod error;

/// JSON, CSV and Markdown export
pub mod reports;

// Re-export core types
pub use analytics::{
    annotate_growth, build_periods, compute_stats, Anomaly, AnomalyConfig, AnomalyDetector,
    AnomalyId, AnomalyReport, AnomalySeverity, BusinessFactors, CanonicalRule,
    ConsolidatedService, CostExplorerResponse, CostNormalizer, DataSufficiency, Forecast,
    ForecastConfig, ForecastEngine, ForecastHorizon, ForecastPeriod, ImpactDirection, MatchKind,
    OmissionReport, OptimizationSuggestion, PeriodGranularity, RawCostPoint, Scenario,
    ScenarioInput, ServiceCanonicalizer, ServiceConsolidator, SuggestionEngine,
    SuggestionSeverity, TrendDirection, TrendPeriod, TrendStatistics, Volatility,
};
pub use config::{ConfigError, EngineConfig};
pub use engine::{CostAnalysis, CostAnalyzer};
pub use error::{CostLensError, Result};
pub use reports::{ExportFormat, ReportConfig, ReportGenerator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
