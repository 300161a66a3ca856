use clap::{Parser, Subcommand, ValueEnum};
use costlens::{PeriodGranularity, ScenarioInput};
use is_terminal::IsTerminal;
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Markdown,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum ForecastFormat {
    Table,
    Json,
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum GranularityArg {
    Monthly,
    Daily,
}

impl From<GranularityArg> for PeriodGranularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Monthly => PeriodGranularity::Monthly,
            GranularityArg::Daily => PeriodGranularity::Daily,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "costlens")]
#[command(version)]
#[command(about = "Cost analytics and forecasting for cloud billing data")]
#[command(long_about = "
costlens reads Cost Explorer shaped billing exports and derives per-service
totals, trend statistics, anomalies, savings suggestions and forecasts.

Example usage:
  costlens analyze costs.json                    # Summarize a billing export
  costlens forecast costs.json --presets         # Forecast with what-if scenarios
  costlens config example > costlens.yaml        # Start a configuration file
  costlens completion bash > ~/.bashrc.d/costlens # Generate bash completions
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a billing export
    #[command(long_about = "
Normalizes a billing export, consolidates services, computes trend statistics,
detects anomalies and suggests savings.

Output formats:
  table     - Formatted tables (default)
  json      - JSON output for scripting
  yaml      - YAML output for scripting
  markdown  - Markdown report
  csv       - Per-service CSV

Examples:
  costlens analyze costs.json
  costlens analyze costs.json --granularity daily --window-days 14
  costlens analyze costs.json --format json > analysis.json
")]
    Analyze {
        /// Path to the billing export (JSON)
        file: PathBuf,

        /// Trailing window for anomaly baselines, in days
        #[arg(long)]
        window_days: Option<u32>,

        /// Width of trend periods
        #[arg(long, value_enum)]
        granularity: Option<GranularityArg>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Configuration file to use instead of the standard locations
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Forecast future costs from a billing export
    #[command(long_about = "
Projects future period costs from the trend in a billing export and optionally
evaluates what-if scenarios against the neutral projection.

Scenarios are given as NAME:GROWTH:SEASONALITY[:LABEL], for example
  --scenario \"Expansion:1.25:1.0:New region\"

Examples:
  costlens forecast costs.json
  costlens forecast costs.json --horizon 12 --seasonality
  costlens forecast costs.json --presets --format json
")]
    Forecast {
        /// Path to the billing export (JSON)
        file: PathBuf,

        /// Number of months to project (3, 6 or 12)
        #[arg(long)]
        horizon: Option<u32>,

        /// Apply seasonal indices learned from the history
        #[arg(long)]
        seasonality: bool,

        /// Revenue earned per dollar of cost
        #[arg(long)]
        revenue_ratio: Option<Decimal>,

        /// What-if scenario (repeatable)
        #[arg(long = "scenario")]
        scenarios: Vec<ScenarioInput>,

        /// Include the built-in scenario presets
        #[arg(long)]
        presets: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: ForecastFormat,

        /// Configuration file to use instead of the standard locations
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Generate shell completion scripts
    #[command(long_about = "
Generates shell completion scripts for various shells.

Examples:
  costlens completion bash > ~/.bashrc.d/costlens
  costlens completion zsh > ~/.zfunc/_costlens
  costlens completion fish > ~/.config/fish/completions/costlens.fish
")]
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the effective configuration as YAML
    Show {
        /// Configuration file to use instead of the standard locations
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print an example configuration file
    Example,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    #[allow(dead_code)]
    pub fn try_parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(args)
    }

    pub fn is_tty() -> bool {
        io::stdout().is_terminal()
    }

    pub fn should_use_color() -> bool {
        Self::is_tty() && std::env::var("NO_COLOR").is_err()
    }
}
