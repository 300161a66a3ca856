//! Report export
//!
//! Renders a [`CostAnalysis`] or a forecast with its scenarios as JSON, CSV or
//! Markdown. JSON carries every field; CSV and Markdown are tabular summaries.

use crate::analytics::{Forecast, Scenario, TrendStatistics};
use crate::engine::CostAnalysis;
use crate::error::{CostLensError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// JSON for programmatic access
    Json,
    /// CSV for spreadsheet analysis
    Csv,
    /// Markdown for human-readable reports
    Markdown,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CostLensError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(CostLensError::invalid_config(
                "format",
                other,
                "supported formats are json, csv and markdown",
            )),
        }
    }
}

#[derive(Serialize)]
struct ForecastExport<'a> {
    forecast: &'a Forecast,
    scenarios: &'a [Scenario],
}

/// Report formatting options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Currency symbol prefixed to money values
    pub currency_symbol: String,
    /// Decimal places for money values
    pub cost_precision: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            cost_precision: 2,
        }
    }
}

/// Renders analysis results in the supported export formats
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    /// Create a generator with the given formatting options
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Render a cost analysis
    pub fn render_analysis(&self, analysis: &CostAnalysis, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
            ExportFormat::Csv => self.analysis_csv(analysis),
            ExportFormat::Markdown => Ok(self.analysis_markdown(analysis)),
        }
    }

    /// Render a forecast and any scenarios evaluated against it
    pub fn render_forecast(
        &self,
        forecast: &Forecast,
        scenarios: &[Scenario],
        format: ExportFormat,
    ) -> Result<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&ForecastExport {
                forecast,
                scenarios,
            })?),
            ExportFormat::Csv => self.forecast_csv(forecast),
            ExportFormat::Markdown => Ok(self.forecast_markdown(forecast, scenarios)),
        }
    }

    fn analysis_csv(&self, analysis: &CostAnalysis) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["service", "total_cost", "percentage", "color_index"])?;
        for service in &analysis.services {
            writer.write_record([
                service.display_name.clone(),
                service.total_cost.round_dp(self.config.cost_precision).to_string(),
                format!("{:.2}", service.percentage),
                service.color_index.to_string(),
            ])?;
        }
        finish_csv(writer)
    }

    fn forecast_csv(&self, forecast: &Forecast) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "period_index",
            "date",
            "base_cost",
            "business_adjusted_cost",
            "revenue_projection",
            "confidence_level",
        ])?;
        for period in &forecast.periods {
            writer.write_record([
                period.period_index.to_string(),
                period.date.to_string(),
                period.base_cost.round_dp(self.config.cost_precision).to_string(),
                period
                    .business_adjusted_cost
                    .round_dp(self.config.cost_precision)
                    .to_string(),
                period
                    .revenue_projection
                    .map(|r| r.round_dp(self.config.cost_precision).to_string())
                    .unwrap_or_default(),
                format!("{:.1}", period.confidence_level),
            ])?;
        }
        finish_csv(writer)
    }

    fn statistics_markdown(&self, stats: &TrendStatistics, output: &mut String) {
        output.push_str(&format!(
            "- **Average per period**: {}\n",
            self.format_currency(stats.avg_monthly_cost)
        ));
        output.push_str(&format!(
            "- **Highest period**: {} ({})\n",
            stats.highest_period.period_label,
            self.format_currency(stats.highest_period.total_cost)
        ));
        output.push_str(&format!(
            "- **Lowest period**: {} ({})\n",
            stats.lowest_period.period_label,
            self.format_currency(stats.lowest_period.total_cost)
        ));
        output.push_str(&format!(
            "- **Trend**: {}{}\n",
            stats.overall_trend,
            stats
                .trend_diff_pct
                .map(|pct| format!(" ({:+.1}%)", pct))
                .unwrap_or_default()
        ));
        output.push_str(&format!("- **Volatility**: {}\n", stats.volatility));
    }

    fn analysis_markdown(&self, analysis: &CostAnalysis) -> String {
        let mut output = String::new();

        output.push_str("# Cost Analysis Report\n\n");
        output.push_str("## Summary\n\n");
        output.push_str(&format!("- **Total cost**: {}\n", self.format_currency(analysis.total_cost)));
        match &analysis.statistics {
            Some(stats) => self.statistics_markdown(stats, &mut output),
            None => output.push_str("- **Statistics**: no usable cost data\n"),
        }
        if !analysis.has_growth_data() {
            output.push_str("- **Growth**: insufficient data (fewer than two periods)\n");
        }
        if !analysis.omissions.is_empty() {
            output.push_str(&format!(
                "- **Omitted groups**: {} of {}\n",
                analysis.omissions.count(),
                analysis.omissions.groups_seen
            ));
        }
        output.push('\n');

        output.push_str("## Services\n\n");
        output.push_str("| Service | Cost | Share |\n|---|---|---|\n");
        for service in &analysis.services {
            output.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                service.display_name,
                self.format_currency(service.total_cost),
                service.percentage
            ));
        }
        output.push('\n');

        output.push_str("## Periods\n\n");
        output.push_str("| Period | Cost | Growth |\n|---|---|---|\n");
        for period in &analysis.periods {
            output.push_str(&format!(
                "| {} | {} | {} |\n",
                period.period_label,
                self.format_currency(period.total_cost),
                period
                    .growth_rate_pct
                    .map(|g| format!("{:+.1}%", g))
                    .unwrap_or_else(|| "n/a".to_string())
            ));
        }
        output.push('\n');

        if !analysis.anomalies.anomalies.is_empty() {
            output.push_str("## Anomalies\n\n");
            output.push_str("| Date | Service | Cost | Deviation | Severity |\n|---|---|---|---|---|\n");
            for anomaly in &analysis.anomalies.anomalies {
                output.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    anomaly.date,
                    anomaly.service_name,
                    self.format_currency(anomaly.cost_amount),
                    self.format_currency(anomaly.deviation),
                    anomaly.severity
                ));
            }
            output.push('\n');
        }

        if !analysis.suggestions.is_empty() {
            output.push_str("## Suggestions\n\n");
            for suggestion in &analysis.suggestions {
                output.push_str(&format!(
                    "- **{}** ({}): {} Potential savings {}.\n",
                    suggestion.title,
                    suggestion.severity,
                    suggestion.description,
                    self.format_currency(suggestion.potential_savings)
                ));
            }
            output.push('\n');
        }

        output
    }

    fn forecast_markdown(&self, forecast: &Forecast, scenarios: &[Scenario]) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Cost Forecast ({} periods)\n\n", forecast.horizon));
        output.push_str(&format!(
            "- **Growth rate**: {:+.2}% per period\n",
            forecast.business_metrics.growth_rate_pct
        ));
        output.push_str(&format!("- **Confidence**: {:.1}%\n", forecast.confidence));
        output.push_str(&format!(
            "- **Projected total**: {}\n\n",
            self.format_currency(forecast.business_metrics.total_adjusted_cost)
        ));

        output.push_str("| # | Date | Base | Adjusted | Confidence |\n|---|---|---|---|---|\n");
        for period in &forecast.periods {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {:.1}% |\n",
                period.period_index,
                period.date,
                self.format_currency(period.base_cost),
                self.format_currency(period.business_adjusted_cost),
                period.confidence_level
            ));
        }
        output.push('\n');

        if !scenarios.is_empty() {
            output.push_str("## Scenarios\n\n");
            output.push_str("| Scenario | Total | Variance | Impact |\n|---|---|---|---|\n");
            for scenario in scenarios {
                output.push_str(&format!(
                    "| {} | {} | {} | {} {:.1}% |\n",
                    scenario.name,
                    self.format_currency(scenario.metrics.total_projected_cost),
                    self.format_currency(scenario.metrics.cost_variance),
                    scenario.impact.direction,
                    scenario.impact.percentage_impact.abs()
                ));
            }
            output.push('\n');
        }

        output
    }

    /// Format a money value with the configured symbol and precision
    pub fn format_currency(&self, value: Decimal) -> String {
        let rounded = value.round_dp(self.config.cost_precision);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            format!("-{}{}", self.config.currency_symbol, rounded.abs())
        } else {
            format!("{}{}", self.config.currency_symbol, rounded.abs())
        }
    }
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
