use costlens::{
    CostAnalyzer, ExportFormat, Forecast, ForecastHorizon, ImpactDirection, ReportGenerator,
    Scenario, ScenarioInput,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tabled::{
    settings::{object::Rows, Color, Modify},
    Table, Tabled,
};

use crate::analyze::{load_config, load_response, print_heading, print_table};
use crate::cli::{Cli, ForecastFormat};
use crate::error::{CliResult, IntoCliResult};

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Base")]
    base: String,
    #[tabled(rename = "Adjusted")]
    adjusted: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    name: String,
    #[tabled(rename = "Growth")]
    growth: String,
    #[tabled(rename = "Seasonality")]
    seasonality: String,
    #[tabled(rename = "Projected")]
    projected: String,
    #[tabled(rename = "Variance")]
    variance: String,
    #[tabled(rename = "Impact")]
    impact: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastOutput<'a> {
    forecast: &'a Forecast,
    scenarios: &'a [Scenario],
}

/// Forecast settings taken from the command line
#[derive(Debug, Clone, Default)]
pub struct ForecastOptions {
    pub horizon: Option<u32>,
    pub seasonality: bool,
    pub revenue_ratio: Option<Decimal>,
    pub scenarios: Vec<ScenarioInput>,
    pub presets: bool,
}

impl ForecastOptions {
    /// Presets first, then explicitly requested scenarios
    pub fn scenario_inputs(&self) -> Vec<ScenarioInput> {
        let mut inputs = if self.presets {
            ScenarioInput::presets()
        } else {
            Vec::new()
        };
        inputs.extend(self.scenarios.iter().cloned());
        inputs
    }
}

/// Build an analyzer whose forecast settings include the command-line overrides
pub fn build_forecaster(config: Option<&Path>, options: &ForecastOptions) -> CliResult<CostAnalyzer> {
    let mut config = load_config(config)?;
    if let Some(horizon) = options.horizon {
        config.forecast.horizon_months = ForecastHorizon::try_from(horizon)?;
    }
    if options.seasonality {
        config.forecast.seasonality_enabled = true;
    }
    if let Some(ratio) = options.revenue_ratio {
        config.forecast.revenue_per_dollar = Some(ratio);
    }
    Ok(CostAnalyzer::new(config)?)
}

/// Forecast a billing export and evaluate the requested scenarios
pub fn forecast_file(
    file: &Path,
    config: Option<&Path>,
    options: &ForecastOptions,
) -> CliResult<(Forecast, Vec<Scenario>)> {
    let analyzer = build_forecaster(config, options)?;
    let analysis = analyzer.analyze(&load_response(file)?)?;
    let forecast = analyzer.forecast(&analysis.periods)?;

    let inputs = options.scenario_inputs();
    let scenarios = if inputs.is_empty() {
        Vec::new()
    } else {
        analyzer.run_scenarios(&analysis.periods, &inputs)?
    };
    Ok((forecast, scenarios))
}

pub fn run_forecast_command(
    file: &Path,
    options: ForecastOptions,
    format: ForecastFormat,
    config: Option<&Path>,
) -> CliResult<()> {
    let (forecast, scenarios) = forecast_file(file, config, &options)?;

    match format {
        ForecastFormat::Json => {
            let json = ReportGenerator::default().render_forecast(
                &forecast,
                &scenarios,
                ExportFormat::Json,
            )?;
            println!("{}", json);
        }
        ForecastFormat::Yaml => {
            let yaml = serde_yaml::to_string(&ForecastOutput {
                forecast: &forecast,
                scenarios: &scenarios,
            })
            .cli_general_error()?;
            print!("{}", yaml);
        }
        ForecastFormat::Table => display_tables(&forecast, &scenarios),
    }

    Ok(())
}

fn display_tables(forecast: &Forecast, scenarios: &[Scenario]) {
    let generator = ReportGenerator::default();
    let use_color = Cli::should_use_color();
    let metrics = &forecast.business_metrics;

    print_heading(
        &format!(
            "{}-month forecast from {} periods (growth {:+.2}% per period)",
            forecast.horizon, metrics.history_periods, metrics.growth_rate_pct
        ),
        use_color,
    );
    if !forecast.history.is_sufficient() {
        println!("No defined growth rate in the history: flat projection, zero confidence.");
    }
    println!();

    let rows: Vec<PeriodRow> = forecast
        .periods
        .iter()
        .map(|period| PeriodRow {
            index: period.period_index,
            date: period.date.to_string(),
            base: generator.format_currency(period.base_cost),
            adjusted: generator.format_currency(period.business_adjusted_cost),
            revenue: period
                .revenue_projection
                .map(|r| generator.format_currency(r))
                .unwrap_or_else(|| "-".to_string()),
            confidence: format!("{:.1}%", period.confidence_level),
        })
        .collect();
    print_table(Table::new(rows), use_color);

    println!(
        "Total: {} base, {} adjusted",
        generator.format_currency(metrics.total_base_cost),
        generator.format_currency(metrics.total_adjusted_cost)
    );
    if let Some(revenue) = metrics.total_revenue {
        println!("Projected revenue: {}", generator.format_currency(revenue));
    }

    if scenarios.is_empty() {
        return;
    }

    println!();
    let rows: Vec<ScenarioRow> = scenarios
        .iter()
        .map(|scenario| ScenarioRow {
            name: scenario.name.clone(),
            growth: format!("{:.2}x", scenario.business_growth_factor),
            seasonality: format!("{:.2}x", scenario.seasonality_multiplier),
            projected: generator.format_currency(scenario.metrics.total_projected_cost),
            variance: generator.format_currency(scenario.metrics.cost_variance),
            impact: format!(
                "{} {:.1}%",
                scenario.impact.direction, scenario.impact.percentage_impact
            ),
        })
        .collect();
    let mut table = Table::new(rows);
    if use_color {
        for (i, scenario) in scenarios.iter().enumerate() {
            let row = i + 1;
            let color = match scenario.impact.direction {
                ImpactDirection::Increase => Color::FG_RED,
                ImpactDirection::Decrease => Color::FG_GREEN,
            };
            table.with(Modify::new(Rows::new(row..=row)).with(color));
        }
    }
    print_heading("Scenarios", use_color);
    print_table(table, use_color);
}
