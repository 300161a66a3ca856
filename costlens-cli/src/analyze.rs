use colored::*;
use costlens::{
    AnomalySeverity, CostAnalysis, CostAnalyzer, CostExplorerResponse, EngineConfig,
    ExportFormat, ReportGenerator, SuggestionSeverity,
};
use std::fs;
use std::path::Path;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Style},
    Table, Tabled,
};

use crate::cli::{Cli, GranularityArg, OutputFormat};
use crate::error::{CliError, CliResult, IntoCliResult};
use crate::exit_codes::EXIT_GENERAL;

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "Colour")]
    colour: String,
}

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Growth")]
    growth: String,
}

#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Baseline")]
    baseline: String,
    #[tabled(rename = "Z")]
    z_score: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

#[derive(Tabled)]
struct SuggestionRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Suggestion")]
    title: String,
    #[tabled(rename = "Savings")]
    savings: String,
}

/// Load the engine configuration, optionally from an explicit file
pub fn load_config(explicit: Option<&Path>) -> CliResult<EngineConfig> {
    Ok(EngineConfig::load(explicit)?)
}

/// Read and parse a Cost Explorer shaped JSON export
pub fn load_response(path: &Path) -> CliResult<CostExplorerResponse> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::new(
            format!("Failed to read billing export {}: {}", path.display(), e),
            EXIT_GENERAL,
        )
    })?;
    serde_json::from_str(&content).map_err(|e| {
        CliError::new(
            format!("Invalid billing export {}: {}", path.display(), e),
            EXIT_GENERAL,
        )
    })
}

/// Build an analyzer from configuration plus command-line overrides
pub fn build_analyzer(
    config: Option<&Path>,
    window_days: Option<u32>,
    granularity: Option<GranularityArg>,
) -> CliResult<CostAnalyzer> {
    let mut config = load_config(config)?;
    if let Some(window_days) = window_days {
        config.anomaly.window_days = window_days;
    }
    if let Some(granularity) = granularity {
        config.granularity = granularity.into();
    }
    Ok(CostAnalyzer::new(config)?)
}

pub fn run_analyze_command(
    file: &Path,
    window_days: Option<u32>,
    granularity: Option<GranularityArg>,
    format: OutputFormat,
    config: Option<&Path>,
) -> CliResult<()> {
    let analyzer = build_analyzer(config, window_days, granularity)?;
    let response = load_response(file)?;
    let analysis = analyzer.analyze(&response)?;

    match format {
        OutputFormat::Table => display_tables(&analyzer, &analysis)?,
        other => print!("{}", render_analysis(&analysis, other)?),
    }

    Ok(())
}

/// Render an analysis in one of the machine-readable formats
pub fn render_analysis(analysis: &CostAnalysis, format: OutputFormat) -> CliResult<String> {
    let generator = ReportGenerator::default();
    let rendered = match format {
        OutputFormat::Json => {
            let mut json = generator.render_analysis(analysis, ExportFormat::Json)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml::to_string(analysis).cli_general_error()?,
        OutputFormat::Markdown => generator.render_analysis(analysis, ExportFormat::Markdown)?,
        OutputFormat::Csv => generator.render_analysis(analysis, ExportFormat::Csv)?,
        OutputFormat::Table => {
            return Err(CliError::new(
                "Table output is rendered directly to the terminal",
                EXIT_GENERAL,
            ))
        }
    };
    Ok(rendered)
}

fn print_omissions(analysis: &CostAnalysis) {
    if !analysis.omissions.is_empty() {
        println!(
            "{} of {} billing groups omitted",
            analysis.omissions.count(),
            analysis.omissions.groups_seen
        );
    }
}

fn display_tables(analyzer: &CostAnalyzer, analysis: &CostAnalysis) -> CliResult<()> {
    let generator = ReportGenerator::default();
    let use_color = Cli::should_use_color();

    if analysis.services.is_empty() {
        println!("No billable services found in the export.");
        print_omissions(analysis);
        return Ok(());
    }

    let summary = format!(
        "Total cost: {} across {} services",
        generator.format_currency(analysis.total_cost),
        analysis.services.len()
    );
    print_heading(&summary, use_color);
    print_omissions(analysis);
    println!();

    let services: Vec<ServiceRow> = analysis
        .services
        .iter()
        .map(|service| ServiceRow {
            service: service.display_name.clone(),
            cost: generator.format_currency(service.total_cost),
            share: format!("{:.1}%", service.percentage),
            colour: analyzer.color_for(service).unwrap_or("").to_string(),
        })
        .collect();
    print_table(Table::new(services), use_color);

    println!();
    if let Some(stats) = &analysis.statistics {
        println!(
            "Trend: {} ({}), volatility {}, average {} per period",
            stats.overall_trend,
            stats
                .trend_diff_pct
                .map(|d| format!("{:+.1}%", d))
                .unwrap_or_else(|| "n/a".to_string()),
            stats.volatility,
            generator.format_currency(stats.avg_monthly_cost)
        );
        println!(
            "Highest: {} ({}), lowest: {} ({})",
            stats.highest_period.period_label,
            generator.format_currency(stats.highest_period.total_cost),
            stats.lowest_period.period_label,
            generator.format_currency(stats.lowest_period.total_cost)
        );
    }
    if !analysis.has_growth_data() {
        println!("Growth rates need at least two periods of data.");
    }
    println!();

    let periods: Vec<PeriodRow> = analysis
        .periods
        .iter()
        .map(|period| PeriodRow {
            period: period.period_label.clone(),
            cost: generator.format_currency(period.total_cost),
            growth: period
                .growth_rate_pct
                .map(|g| format!("{:+.1}%", g))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    print_table(Table::new(periods), use_color);

    println!();
    if analysis.anomalies.anomalies.is_empty() {
        println!("No anomalies detected.");
    } else {
        let rows: Vec<AnomalyRow> = analysis
            .anomalies
            .anomalies
            .iter()
            .map(|anomaly| AnomalyRow {
                date: anomaly.date.to_string(),
                service: anomaly.service_name.clone(),
                cost: generator.format_currency(anomaly.cost_amount),
                baseline: generator.format_currency(anomaly.baseline_mean),
                z_score: format!("{:.2}", anomaly.z_score),
                severity: anomaly.severity.to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        if use_color {
            for (i, anomaly) in analysis.anomalies.anomalies.iter().enumerate() {
                let row = i + 1;
                let color = match anomaly.severity {
                    AnomalySeverity::High => Color::FG_RED,
                    AnomalySeverity::Medium => Color::FG_YELLOW,
                    AnomalySeverity::Low => Color::FG_BLUE,
                };
                table.with(Modify::new(Rows::new(row..=row)).with(color));
            }
        }
        print_heading("Anomalies", use_color);
        print_table(table, use_color);
    }

    println!();
    if analysis.suggestions.is_empty() {
        println!("No optimization suggestions.");
    } else {
        let rows: Vec<SuggestionRow> = analysis
            .suggestions
            .iter()
            .map(|suggestion| SuggestionRow {
                severity: suggestion.severity.to_string(),
                title: suggestion.title.clone(),
                savings: generator.format_currency(suggestion.potential_savings),
            })
            .collect();
        let mut table = Table::new(rows);
        if use_color {
            for (i, suggestion) in analysis.suggestions.iter().enumerate() {
                if suggestion.severity == SuggestionSeverity::Warning {
                    let row = i + 1;
                    table.with(Modify::new(Rows::new(row..=row)).with(Color::FG_YELLOW));
                }
            }
        }
        print_heading("Suggestions", use_color);
        print_table(table, use_color);
        println!(
            "Potential savings: {}",
            generator.format_currency(analysis.potential_savings()?)
        );
    }
    Ok(())
}

pub(crate) fn print_heading(text: &str, use_color: bool) {
    if use_color {
        println!("{}", text.bold());
    } else {
        println!("{}", text);
    }
}

pub(crate) fn print_table(mut table: Table, use_color: bool) {
    table.with(Style::modern());
    if use_color {
        table.with(Modify::new(Rows::first()).with(Color::FG_BRIGHT_CYAN));
    }
    table.with(Modify::new(Rows::new(1..)).with(Alignment::left()));
    println!("{}", table);
}
